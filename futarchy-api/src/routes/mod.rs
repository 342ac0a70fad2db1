//! API route definitions

mod chart;
mod health;
mod proposals;
mod spot;

use axum::Router;

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(proposals::routes())
        .merge(chart::routes())
        .merge(spot::routes())
}
