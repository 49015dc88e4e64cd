use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;

/// Claims carried by every bearer token. `sub` is the only identity downstream handlers see.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// `None` when `now + ttl` is not a representable timestamp.
    pub fn new(subject: &str, ttl: Duration) -> Option<Self> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl)?;
        Some(Self {
            sub: Some(subject.to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Could not validate credentials")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("Could not validate credentials")]
    MissingSubject,
    #[error("JWT generation error: {0}")]
    TokenGeneration(#[source] jsonwebtoken::errors::Error),
    #[error("JWT generation error: token lifetime is out of range")]
    LifetimeOutOfRange,
}

/// Issues and verifies HMAC-signed bearer tokens for the single admin account.
pub struct TokenService {
    admin_username: String,
    admin_password: String,
    algorithm: Algorithm,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
            algorithm: config.algorithm,
            // Out-of-range lifetimes surface when a token is issued
            ttl: Duration::try_minutes(config.access_token_expire_minutes).unwrap_or(Duration::MAX),
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
        }
    }

    /// True iff both values match the configured admin credentials.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        // Evaluate both comparisons so timing doesn't reveal which field failed.
        let user_ok = digests_match(username, &self.admin_username);
        let pass_ok = digests_match(password, &self.admin_password);
        user_ok & pass_ok
    }

    pub fn issue_token(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_token_with_ttl(subject, self.ttl)
    }

    pub fn issue_token_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(subject, ttl).ok_or(AuthError::LifetimeOutOfRange)?;
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(AuthError::TokenGeneration)
    }

    /// Verify signature, algorithm and expiry, returning the subject.
    pub fn verify_token(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(AuthError::InvalidToken)?;

        token_data
            .claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(AuthError::MissingSubject)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

fn digests_match(given: &str, expected: &str) -> bool {
    let a = Sha256::digest(given.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            admin_username: "admin".to_string(),
            admin_password: "hunter2".to_string(),
            secret_key: "test-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
        }
    }

    #[test]
    fn authenticate_requires_exact_match() {
        let service = TokenService::new(&config());
        assert!(service.authenticate("admin", "hunter2"));
        assert!(!service.authenticate("admin", "hunter3"));
        assert!(!service.authenticate("Admin", "hunter2"));
        assert!(!service.authenticate("admin ", "hunter2"));
        assert!(!service.authenticate("", ""));
        assert!(!service.authenticate("admin", ""));
    }

    #[test]
    fn token_round_trip_returns_subject() {
        let service = TokenService::new(&config());
        let token = service.issue_token("admin").unwrap();
        assert_eq!(service.verify_token(&token).unwrap(), "admin");
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(&config());
        let token = service.issue_token_with_ttl("admin", Duration::seconds(-5)).unwrap();
        assert!(matches!(service.verify_token(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let service = TokenService::new(&config());
        let mut other = config();
        other.secret_key = "another-secret".to_string();
        let forged = TokenService::new(&other).issue_token("admin").unwrap();
        assert!(service.verify_token(&forged).is_err());
    }

    #[test]
    fn token_with_other_algorithm_is_rejected() {
        let service = TokenService::new(&config());
        let mut other = config();
        other.algorithm = Algorithm::HS512;
        let token = TokenService::new(&other).issue_token("admin").unwrap();
        assert!(service.verify_token(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let service = TokenService::new(&config());
        assert!(service.verify_token("not-a-jwt").is_err());
        assert!(service.verify_token("").is_err());
    }

    #[test]
    fn token_without_subject_is_rejected() {
        let service = TokenService::new(&config());
        let claims = Claims {
            sub: None,
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(service.verify_token(&token), Err(AuthError::MissingSubject)));
    }

    #[test]
    fn oversized_lifetime_fails_instead_of_panicking() {
        let mut huge = config();
        huge.access_token_expire_minutes = 100_000_000_000_000;
        let service = TokenService::new(&huge);
        assert!(matches!(service.issue_token("admin"), Err(AuthError::LifetimeOutOfRange)));

        let service = TokenService::new(&config());
        assert!(matches!(
            service.issue_token_with_ttl("admin", Duration::MAX),
            Err(AuthError::LifetimeOutOfRange)
        ));
    }
}
