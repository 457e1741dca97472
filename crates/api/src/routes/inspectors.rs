//! Inspector accounts and inspector worklists.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::auth::{check_optional_name, profile_info, require_email, require_name};
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};
use firecert_core::auth::{Role, check_password_policy, hash_password};
use firecert_core::inspection::InspectionService;
use firecert_core::workflow::ApplicationStatus;
use firecert_db::{InspectionRepository, NewProfile, ProfileRepository, repositories::to_profile};
use firecert_shared::auth::{CreateInspectorRequest, ProfileInfo};

/// Longest accepted rank code.
const MAX_POSITION_LENGTH: usize = 20;

/// Creates the inspector routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inspectors", get(list_inspectors).post(create_inspector))
        .route("/inspectors/{inspector_id}/assignments", get(list_assignments))
}

/// Query parameters for an inspector's worklist.
#[derive(Debug, Deserialize)]
pub struct AssignmentsQuery {
    /// Only assignments in this status.
    pub status: Option<ApplicationStatus>,
}

/// POST /inspectors - Create an inspector account.
async fn create_inspector(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateInspectorRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.actor().require(Role::Admin)?;

    require_email(&payload.email)?;
    require_name("first_name", &payload.first_name)?;
    check_optional_name("middle_name", payload.middle_name.as_deref())?;
    require_name("last_name", &payload.last_name)?;
    let position = payload
        .position
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty());
    if position.as_ref().is_some_and(|p| p.chars().count() > MAX_POSITION_LENGTH) {
        return Err(ApiError::validation(format!(
            "position must be at most {MAX_POSITION_LENGTH} characters"
        )));
    }
    check_password_policy(&payload.password)?;

    let password_hash = hash_password(&payload.password)?;
    let profile = ProfileRepository::new((*state.db).clone())
        .create(NewProfile {
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            middle_name: payload.middle_name,
            last_name: payload.last_name,
            role: Role::Inspector,
            position,
        })
        .await?;

    info!(admin_id = %auth.user_id, inspector_id = %profile.id, "Inspector account created");

    Ok((StatusCode::CREATED, Json(profile_info(to_profile(profile)))))
}

/// GET /inspectors - Inspectors for the assignment picker, active first.
async fn list_inspectors(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    auth.actor().require(Role::Admin)?;

    let inspectors: Vec<ProfileInfo> = ProfileRepository::new((*state.db).clone())
        .list_inspectors()
        .await?
        .into_iter()
        .map(|model| profile_info(to_profile(model)))
        .collect();

    Ok(Json(json!({ "data": inspectors })))
}

/// GET /inspectors/{inspector_id}/assignments - Occupancy and business
/// applications assigned to an inspector.
async fn list_assignments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(inspector_id): Path<Uuid>,
    Query(query): Query<AssignmentsQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let service = InspectionService::new(
        Arc::new(InspectionRepository::new((*state.db).clone())),
        state.storage.clone(),
    );
    let assignments = service
        .assignments(&auth.actor(), inspector_id, query.status)
        .await?;

    Ok(Json(json!({ "data": assignments })))
}
