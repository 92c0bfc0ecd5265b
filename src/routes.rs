//! Read-only JSON handlers for `serve` mode.
//!
//! The serve surface never mutates the store: it exposes the accumulated
//! table behind equality filters on operator, route, bus type and departing
//! time, a minimum-rating filter, and a price range, plus the distinct
//! values used to populate filter controls.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::ListingRepository;
use crate::types::{BusListing, ListingFilter};

/// Application state shared across handlers. The repository sits behind a
/// mutex because the SQLite connection is single-threaded.
pub struct AppState {
    pub repo: Mutex<ListingRepository>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub count: usize,
    pub listings: Vec<BusListing>,
}

/// Filter query parameters for `/listings`.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub operator: Option<String>,
    pub route: Option<String>,
    pub bus_type: Option<String>,
    pub departing_time: Option<String>,
    pub min_rating: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl From<ListingQuery> for ListingFilter {
    fn from(q: ListingQuery) -> Self {
        ListingFilter {
            operator: q.operator,
            route_name: q.route,
            bus_type: q.bus_type,
            departing_time: q.departing_time,
            min_rating: q.min_rating,
            min_price: q.min_price,
            max_price: q.max_price,
        }
    }
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Filtered view over the accumulated listings.
pub async fn listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let filter: ListingFilter = query.into();
    let repo = state.repo.lock().await;
    let listings = repo
        .query(&filter)
        .map_err(|e| ApiError::internal(format!("query failed: {}", e)))?;

    Ok(Json(ListingsResponse {
        count: listings.len(),
        listings,
    }))
}

/// Distinct route names, for filter controls.
pub async fn route_names(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let repo = state.repo.lock().await;
    repo.distinct_values("route_name")
        .map(Json)
        .map_err(|e| ApiError::internal(format!("query failed: {}", e)))
}

/// Distinct operator names, for filter controls.
pub async fn operator_names(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let repo = state.repo.lock().await;
    repo.distinct_values("operator")
        .map(Json)
        .map_err(|e| ApiError::internal(format!("query failed: {}", e)))
}
