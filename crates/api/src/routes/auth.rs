//! Authentication routes for signup, login, token refresh, and logout.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};
use firecert_core::auth::{
    Actor, Profile, Role, check_password_policy, hash_password, is_plausible_email,
    verify_password,
};
use firecert_core::establishment::{CreateEstablishmentInput, EstablishmentService};
use firecert_db::{
    EstablishmentRepository, NewProfile, ProfileRepository, SessionRepository,
    repositories::to_profile,
};
use firecert_shared::TokenPair;
use firecert_shared::TokenKind;
use firecert_shared::auth::{
    LoginRequest, LoginResponse, LogoutRequest, ProfileInfo, RefreshRequest, SignupRequest,
};

/// Longest value the sessions table keeps for a client address.
const MAX_IP_LENGTH: usize = 45;

/// Longest stored name part, in characters.
const MAX_NAME_LENGTH: usize = 100;

/// Longest stored login email, in characters.
const MAX_EMAIL_LENGTH: usize = 255;

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

/// Creates the auth routes that need an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Converts a profile to the response shape.
pub(crate) fn profile_info(profile: Profile) -> ProfileInfo {
    ProfileInfo {
        id: profile.id,
        email: profile.email,
        first_name: profile.first_name,
        middle_name: profile.middle_name,
        last_name: profile.last_name,
        role: profile.role.as_str().to_string(),
        position: profile.position,
    }
}

/// Rejects blank or overlong name fields.
pub(crate) fn require_name(field: &str, value: &str) -> ApiResult<()> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::validation(format!(
            "{field} must be between 1 and {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Rejects an overlong optional name field. Blank means absent.
pub(crate) fn check_optional_name(field: &str, value: Option<&str>) -> ApiResult<()> {
    if value.is_some_and(|v| v.trim().chars().count() > MAX_NAME_LENGTH) {
        return Err(ApiError::validation(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Rejects malformed or overlong login emails.
pub(crate) fn require_email(email: &str) -> ApiResult<()> {
    let email = email.trim();
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ApiError::validation(format!(
            "email must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !is_plausible_email(email) {
        return Err(ApiError::validation("email is not a valid address"));
    }
    Ok(())
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("INVALID_CREDENTIALS", "Invalid email or password")
}

fn inactive_session() -> ApiError {
    ApiError::unauthorized("SESSION_REVOKED", "Session is no longer active")
}

/// First address of `X-Forwarded-For`, else `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty() && ip.len() <= MAX_IP_LENGTH)
        .map(String::from)
}

/// POST /auth/signup - Register a new owner, optionally with a first establishment.
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    require_email(&payload.email)?;
    require_name("first_name", &payload.first_name)?;
    check_optional_name("middle_name", payload.middle_name.as_deref())?;
    require_name("last_name", &payload.last_name)?;
    check_password_policy(&payload.password)?;

    let profiles = ProfileRepository::new((*state.db).clone());
    let password_hash = hash_password(&payload.password)?;
    let profile = profiles
        .create(NewProfile {
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            middle_name: payload.middle_name,
            last_name: payload.last_name,
            role: Role::Owner,
            position: None,
        })
        .await?;

    let establishment = match payload.establishment {
        Some(details) => {
            let service =
                EstablishmentService::new(Arc::new(EstablishmentRepository::new((*state.db).clone())));
            let created = service
                .create(
                    &Actor::new(profile.id, Role::Owner),
                    CreateEstablishmentInput {
                        name: details.name,
                        dti_cert_no: details.dti_cert_no,
                    },
                )
                .await;
            match created {
                Ok(establishment) => Some(establishment),
                Err(e) => {
                    if let Err(cleanup) = profiles.delete(profile.id).await {
                        error!(user_id = %profile.id, error = %cleanup, "Failed to undo signup");
                    }
                    return Err(e.into());
                }
            }
        }
        None => None,
    };

    info!(user_id = %profile.id, email = %profile.email, "New owner signed up");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "profile": profile_info(to_profile(profile)),
            "establishment": establishment
        })),
    ))
}

/// POST /auth/login - Authenticate and open a session.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let profiles = ProfileRepository::new((*state.db).clone());

    let Some(user) = profiles.find_by_email(&payload.email).await? else {
        info!(email = %payload.email, "Login attempt for non-existent user");
        return Err(invalid_credentials());
    };

    if !user.is_active {
        return Err(ApiError::unauthorized(
            "ACCOUNT_DISABLED",
            "This account has been disabled",
        ));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    let session_id = Uuid::new_v4();
    let role = Role::from(user.role);
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, session_id, role.as_str())?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user.id, session_id, role.as_str())?;

    let user_agent = headers.get(USER_AGENT).and_then(|h| h.to_str().ok());
    SessionRepository::new((*state.db).clone())
        .create(
            session_id,
            user.id,
            &refresh_token,
            Utc::now() + state.jwt_service.refresh_token_lifetime(),
            user_agent,
            client_ip(&headers).as_deref(),
        )
        .await?;

    info!(user_id = %user.id, session_id = %session_id, "User logged in successfully");

    Ok(Json(LoginResponse {
        profile: profile_info(to_profile(user)),
        access_token,
        refresh_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair.
///
/// The presented refresh token is rotated out. Presenting it again revokes
/// the whole session.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token, TokenKind::Refresh)?;

    let sessions = SessionRepository::new((*state.db).clone());
    let Some(session) = sessions.find_by_token(&payload.refresh_token).await? else {
        // Signed by us but no longer current: it was rotated out.
        if sessions.revoke(claims.session_id()).await? {
            warn!(session_id = %claims.session_id(), "Refresh token reused, session revoked");
        }
        return Err(inactive_session());
    };
    if session.id != claims.session_id() || session.expires_at < Utc::now() {
        return Err(inactive_session());
    }

    let profile = ProfileRepository::new((*state.db).clone())
        .find_by_id(session.user_id)
        .await?;
    let Some(profile) = profile.filter(|p| p.is_active) else {
        sessions.revoke(session.id).await?;
        return Err(inactive_session());
    };

    let role = Role::from(profile.role);
    let access_token = state
        .jwt_service
        .generate_access_token(profile.id, session.id, role.as_str())?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(profile.id, session.id, role.as_str())?;

    let rotated = sessions
        .rotate(
            session.id,
            &payload.refresh_token,
            &refresh_token,
            Utc::now() + state.jwt_service.refresh_token_lifetime(),
        )
        .await?;
    if !rotated {
        return Err(inactive_session());
    }

    Ok(Json(TokenPair::new(
        access_token,
        refresh_token,
        state.jwt_service.access_token_expires_in(),
    )))
}

/// POST /auth/logout - Revoke the session of a refresh token.
async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> ApiResult<StatusCode> {
    let revoked = SessionRepository::new((*state.db).clone())
        .revoke_by_token(&payload.refresh_token)
        .await?;
    if revoked {
        info!("Session revoked");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Profile of the caller.
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ProfileInfo>> {
    let profile = ProfileRepository::new((*state.db).clone())
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(profile_info(to_profile(profile))))
}
