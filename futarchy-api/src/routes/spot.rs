//! Spot series endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use futarchy_core::{ChartError, SpotSeries};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SpotQuery {
    pub ticker: Option<String>,
}

async fn get_spot(
    State(state): State<AppState>,
    Query(query): Query<SpotQuery>,
) -> Result<Json<SpotSeries>, ApiError> {
    let ticker = query
        .ticker
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ChartError::invalid_ticker("missing 'ticker' query parameter"))?;

    let series = state.spot_service.spot(&ticker).await?;
    Ok(Json(series))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/spot", get(get_spot))
}
