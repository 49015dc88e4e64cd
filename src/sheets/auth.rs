//! Service-account authentication shared by the Sheets hub and the Drive calls.

use google_sheets4::oauth2::{self, authenticator::Authenticator};
use google_sheets4::{hyper, hyper_rustls};
use std::path::Path;

use super::SheetsError;

pub type HttpsConnector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;
pub type HttpClient = hyper::Client<HttpsConnector>;
pub type ServiceAuthenticator = Authenticator<HttpsConnector>;

/// Scope requested for Drive file operations (permissions, deletion).
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// TLS hyper client used by both the hub and the authenticator.
pub fn http_client() -> HttpClient {
    hyper::Client::builder().build(
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .expect("failed to load native TLS root certificates")
            .https_or_http()
            .enable_http1()
            .build(),
    )
}

/// Build an authenticator from a service-account key file. Tokens are cached
/// per scope set and refreshed by the authenticator itself.
pub async fn authenticator(
    key_file: &Path,
    client: HttpClient,
) -> Result<ServiceAuthenticator, SheetsError> {
    let key = oauth2::read_service_account_key(key_file)
        .await
        .map_err(|e| {
            SheetsError::Credentials(format!("cannot read {}: {}", key_file.display(), e))
        })?;
    tracing::info!("Using service account {}", key.client_email);

    oauth2::ServiceAccountAuthenticator::with_client(key, client)
        .build()
        .await
        .map_err(|e| SheetsError::Credentials(format!("cannot build authenticator: {}", e)))
}

/// Bearer token for Drive requests.
pub async fn drive_token(auth: &ServiceAuthenticator) -> Result<String, SheetsError> {
    let token = auth
        .token(&[DRIVE_SCOPE])
        .await
        .map_err(|e| SheetsError::Credentials(e.to_string()))?;
    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| SheetsError::Credentials("token endpoint returned no access token".into()))
}
