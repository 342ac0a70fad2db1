//! Chart endpoint

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use futarchy_core::ChartError;
use futarchy_services::{ChartParams, ChartResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartQuery {
    pub min_time: Option<i64>,
    pub max_time: Option<i64>,
    /// Include the proposal's spot series
    #[serde(default)]
    pub spot: bool,
}

async fn get_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartResponse>, ApiError> {
    let params = ChartParams::new(id)
        .with_window(query.min_time, query.max_time)
        .with_spot(query.spot);

    // Run detached so a dropped connection still populates the caches
    let service = state.chart_service.clone();
    let response = tokio::spawn(async move { service.chart(params).await })
        .await
        .map_err(|e| ChartError::internal(format!("Chart task failed: {}", e)))?;

    Ok(Json(response))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/chart/{id}", get(get_chart))
}
