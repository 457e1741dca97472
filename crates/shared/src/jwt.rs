//! JWT token generation and validation.
//!
//! Every token is bound to a session row; the HTTP layer checks that the
//! session is still active, so revoking it invalidates outstanding tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, TokenKind};

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in minutes.
    pub access_token_expires_minutes: i64,
    /// Refresh token expiration in days.
    pub refresh_token_expires_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_minutes: 15,
            refresh_token_expires_days: 7,
        }
    }
}

impl From<&crate::config::JwtSettings> for JwtConfig {
    fn from(settings: &crate::config::JwtSettings) -> Self {
        Self {
            secret: settings.secret.clone(),
            access_token_expires_minutes: i64::try_from(settings.access_token_expiry_secs / 60)
                .unwrap_or(i64::MAX)
                .max(1),
            refresh_token_expires_days: i64::try_from(settings.refresh_token_expiry_secs / 86_400)
                .unwrap_or(i64::MAX)
                .max(1),
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is valid but of the wrong kind (e.g. refresh token used as access token).
    #[error("expected a {expected:?} token")]
    WrongKind {
        /// The kind the caller asked for.
        expected: TokenKind,
    },
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expires_minutes", &self.config.access_token_expires_minutes)
            .field("refresh_token_expires_days", &self.config.refresh_token_expires_days)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generates an access token for a session.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        role: &str,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::minutes(self.config.access_token_expires_minutes);
        self.encode(&Claims::new(
            user_id,
            session_id,
            role,
            TokenKind::Access,
            expires_at,
        ))
    }

    /// Generates a refresh token for a session.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        role: &str,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::days(self.config.refresh_token_expires_days);
        self.encode(&Claims::new(
            user_id,
            session_id,
            role,
            TokenKind::Refresh,
            expires_at,
        ))
    }

    fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token of the expected kind.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired,
    /// `JwtError::WrongKind` if it is not of the expected kind, and
    /// `JwtError::DecodingError` if it is malformed or badly signed.
    pub fn validate_token(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        if claims.typ != expected {
            return Err(JwtError::WrongKind { expected });
        }

        Ok(claims)
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_minutes * 60
    }

    /// Returns the refresh token lifetime.
    #[must_use]
    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::days(self.config.refresh_token_expires_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_minutes: 15,
            refresh_token_expires_days: 7,
        })
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let token = service
            .generate_access_token(user_id, session_id, "inspector")
            .unwrap();
        let claims = service.validate_token(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.session_id(), session_id);
        assert_eq!(claims.role, "inspector");
    }

    #[test]
    fn test_refresh_token_rejected_as_access_token() {
        let service = create_test_service();
        let token = service
            .generate_refresh_token(Uuid::new_v4(), Uuid::new_v4(), "owner")
            .unwrap();

        let err = service.validate_token(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(
            err,
            JwtError::WrongKind {
                expected: TokenKind::Access
            }
        ));
        assert!(service.validate_token(&token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let service = create_test_service();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        });
        let token = other
            .generate_access_token(Uuid::new_v4(), Uuid::new_v4(), "admin")
            .unwrap();

        assert!(matches!(
            service.validate_token(&token, TokenKind::Access),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate_token("invalid.token.here", TokenKind::Access);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_settings_converts_units() {
        let settings = crate::config::JwtSettings {
            secret: "s".to_string(),
            access_token_expiry_secs: 1800,
            refresh_token_expiry_secs: 3 * 86_400,
        };
        let config = JwtConfig::from(&settings);
        assert_eq!(config.access_token_expires_minutes, 30);
        assert_eq!(config.refresh_token_expires_days, 3);

        let service = JwtService::new(config);
        assert_eq!(service.access_token_expires_in(), 1800);
        assert_eq!(service.refresh_token_lifetime(), Duration::days(3));
    }
}
