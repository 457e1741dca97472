//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use firecert_core::auth::{Actor, Role};
use firecert_db::SessionRepository;
use firecert_shared::TokenKind;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates it as an access token
/// 3. Checks that the session it is bound to is still active
/// 4. Stores the caller in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized(
            "MISSING_TOKEN",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    let claims = match state.jwt_service.validate_token(token, TokenKind::Access) {
        Ok(claims) => claims,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let Some(role) = Role::parse(&claims.role) else {
        warn!(user_id = %claims.user_id(), role = %claims.role, "Token carries unknown role");
        return ApiError::unauthorized("INVALID_TOKEN", "Invalid or malformed token")
            .into_response();
    };

    let sessions = SessionRepository::new((*state.db).clone());
    match sessions.find_active(claims.session_id()).await {
        Ok(Some(session)) if session.user_id == claims.user_id() => {}
        Ok(_) => {
            debug!(session_id = %claims.session_id(), "Rejected token of inactive session");
            return ApiError::unauthorized("SESSION_REVOKED", "Session is no longer active")
                .into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    }

    request.extensions_mut().insert(AuthUser {
        user_id: claims.user_id(),
        session_id: claims.session_id(),
        role,
    });
    next.run(request).await
}

/// The authenticated caller of a request.
///
/// Use this in handlers behind [`auth_middleware`]:
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let actor = auth.actor();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// Profile ID.
    pub user_id: Uuid,
    /// Session the access token is bound to.
    pub session_id: Uuid,
    /// Role of the profile.
    pub role: Role,
}

impl AuthUser {
    /// The caller as seen by the core services.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("UNAUTHORIZED", "Authentication required"))
    }
}
