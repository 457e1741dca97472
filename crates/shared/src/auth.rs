//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two token flavours a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token sent with every API request.
    Access,
    /// Long-lived token exchanged for new access tokens.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Session the token was issued for.
    pub sid: Uuid,
    /// User's role (`admin`, `inspector` or `owner`).
    pub role: String,
    /// Token flavour.
    pub typ: TokenKind,
    /// Unique token ID; two tokens minted in the same second still differ.
    pub jti: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user session.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        session_id: Uuid,
        role: &str,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            sid: session_id,
            role: role.to_string(),
            typ: kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the session ID from claims.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.sid
    }
}

/// Token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Establishment details optionally supplied at owner signup.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupEstablishment {
    /// Business name.
    pub name: String,
    /// DTI business registration number.
    pub dti_cert_no: String,
}

/// Owner signup payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Middle name.
    #[serde(default)]
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name: String,
    /// First establishment to create for the new owner.
    #[serde(default)]
    pub establishment: Option<SignupEstablishment>,
}

/// Admin request to create an inspector account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInspectorRequest {
    /// User email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Middle name.
    #[serde(default)]
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name: String,
    /// Rank code, e.g. `FO1` or `SFO2`.
    #[serde(default)]
    pub position: Option<String>,
}

/// Profile info returned in auth responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInfo {
    /// User ID.
    pub id: Uuid,
    /// User email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name: String,
    /// Role name.
    pub role: String,
    /// Inspector rank code.
    pub position: Option<String>,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated profile.
    pub profile: ProfileInfo,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Token expiration in seconds.
    pub expires_in: i64,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh_token: String,
}

/// Logout request.
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    /// The refresh token to invalidate.
    pub refresh_token: String,
}
