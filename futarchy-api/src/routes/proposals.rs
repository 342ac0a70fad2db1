//! Proposal resolution endpoint

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use futarchy_core::ProposalIdentity;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Resolve an external identifier or trading address
async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProposalIdentity>, ApiError> {
    info!("Resolving proposal {}", id);
    let identity = state.chart_service.resolve(&id).await?;
    Ok(Json(identity))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/proposals/{id}", get(get_proposal))
}
