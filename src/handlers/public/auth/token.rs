// handlers/public/auth/token.rs - POST /token handler

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::state::AppState;

/// OAuth2 password-grant form. Only username and password are used.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// POST /token - Authenticate the admin user and receive a bearer token
///
/// Input (form-encoded): `username`, `password`
///
/// Output:
/// ```json
/// { "access_token": "eyJhbGciOiJIUzI1NiI...", "token_type": "bearer" }
/// ```
pub async fn token_post(
    State(state): State<AppState>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Form(form) = form?;

    if !state.tokens.authenticate(&form.username, &form.password) {
        tracing::warn!("Failed login attempt for '{}'", form.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let access_token = state.tokens.issue_token(&form.username)?;
    tracing::info!(
        "Issued token for '{}' valid for {} minutes",
        form.username,
        state.tokens.ttl().num_minutes()
    );

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
