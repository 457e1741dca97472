//! Establishment routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use firecert_core::establishment::{
    CreateEstablishmentInput, Establishment, EstablishmentFilter, EstablishmentService,
};
use firecert_db::EstablishmentRepository;
use firecert_shared::types::{PageRequest, PageResponse};

/// Creates the establishment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/establishments",
            get(list_establishments).post(create_establishment),
        )
        .route("/establishments/{establishment_id}", get(get_establishment))
        .route(
            "/establishments/{establishment_id}/register",
            post(register_establishment),
        )
        .route(
            "/establishments/{establishment_id}/resubmit",
            post(resubmit_establishment),
        )
        .route(
            "/establishments/{establishment_id}/approve",
            post(approve_establishment),
        )
        .route(
            "/establishments/{establishment_id}/reject",
            post(reject_establishment),
        )
}

fn service(state: &AppState) -> EstablishmentService<EstablishmentRepository> {
    EstablishmentService::new(Arc::new(EstablishmentRepository::new((*state.db).clone())))
}

/// Request body for registering an establishment.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Street address.
    pub address: String,
}

/// Request body for resubmitting a rejected registration.
#[derive(Debug, Default, Deserialize)]
pub struct ResubmitRequest {
    /// Corrected address; keeps the stored one when absent.
    #[serde(default)]
    pub address: Option<String>,
}

/// Request body for rejecting a registration.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Reason shown to the owner.
    pub reason: String,
}

/// POST /establishments - Create an unregistered establishment.
async fn create_establishment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateEstablishmentInput>,
) -> ApiResult<impl IntoResponse> {
    let establishment = service(&state).create(&auth.actor(), payload).await?;

    info!(
        establishment_id = %establishment.id,
        owner_id = %auth.user_id,
        "Establishment created"
    );

    Ok((StatusCode::CREATED, Json(establishment)))
}

/// GET /establishments - Owners see their own, admins see all.
async fn list_establishments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<EstablishmentFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<Establishment>>> {
    let establishments = service(&state).list(&auth.actor(), filter, page).await?;
    Ok(Json(establishments))
}

/// GET /establishments/{establishment_id}
async fn get_establishment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(establishment_id): Path<Uuid>,
) -> ApiResult<Json<Establishment>> {
    let establishment = service(&state).get(&auth.actor(), establishment_id).await?;
    Ok(Json(establishment))
}

/// POST /establishments/{establishment_id}/register - Owner supplies the
/// address and asks for review.
async fn register_establishment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(establishment_id): Path<Uuid>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<Establishment>> {
    let establishment = service(&state)
        .register(&auth.actor(), establishment_id, &payload.address)
        .await?;

    info!(establishment_id = %establishment_id, "Establishment submitted for registration");

    Ok(Json(establishment))
}

/// POST /establishments/{establishment_id}/resubmit
async fn resubmit_establishment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(establishment_id): Path<Uuid>,
    payload: Option<Json<ResubmitRequest>>,
) -> ApiResult<Json<Establishment>> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    let establishment = service(&state)
        .resubmit(&auth.actor(), establishment_id, payload.address.as_deref())
        .await?;

    info!(establishment_id = %establishment_id, "Establishment resubmitted");

    Ok(Json(establishment))
}

/// POST /establishments/{establishment_id}/approve
async fn approve_establishment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(establishment_id): Path<Uuid>,
) -> ApiResult<Json<Establishment>> {
    let establishment = service(&state)
        .approve(&auth.actor(), establishment_id)
        .await?;

    info!(
        establishment_id = %establishment_id,
        admin_id = %auth.user_id,
        "Establishment registration approved"
    );

    Ok(Json(establishment))
}

/// POST /establishments/{establishment_id}/reject
async fn reject_establishment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(establishment_id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> ApiResult<Json<Establishment>> {
    let establishment = service(&state)
        .reject(&auth.actor(), establishment_id, &payload.reason)
        .await?;

    info!(
        establishment_id = %establishment_id,
        admin_id = %auth.user_id,
        "Establishment registration rejected"
    );

    Ok(Json(establishment))
}
