//! Dashboard routes.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use firecert_core::dashboard::{DashboardService, DashboardSummary};
use firecert_db::DashboardRepository;

/// Creates the dashboard routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard/summary", get(get_summary))
}

/// GET /dashboard/summary - Status counts scoped to the caller's role.
async fn get_summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<DashboardSummary>> {
    let service = DashboardService::new(Arc::new(DashboardRepository::new((*state.db).clone())));
    let summary = service.summary(&auth.actor()).await?;
    Ok(Json(summary))
}
