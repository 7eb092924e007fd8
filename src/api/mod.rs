//! HTTP surface over the [`QueryEngine`].

mod routes;

use crate::constants::INTERNAL_ERROR_DETAIL;
use crate::query::{QueryEngine, QueryError};
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// An entry of the route directory served at `/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub path: &'static str,
    pub name: &'static str,
}

pub const ROUTES: &[RouteInfo] = &[
    RouteInfo { path: "/", name: "Root path" },
    RouteInfo { path: "/buildings", name: "Buildings" },
    RouteInfo { path: "/buildings/{building}/sensors", name: "Building Sensors" },
    RouteInfo { path: "/buildings/{building}/slice", name: "Building Slice" },
    RouteInfo { path: "/buildings/{building}/sensors/{sensor}", name: "Sensor Data" },
    RouteInfo { path: "/buildings/{building}/timestamps", name: "Building Timeframe" },
];

pub fn router(engine: QueryEngine) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/buildings", get(routes::buildings))
        .route("/buildings/{building}/sensors", get(routes::sensors))
        .route("/buildings/{building}/slice", get(routes::slice))
        .route("/buildings/{building}/sensors/{sensor}", get(routes::sensor_data))
        .route("/buildings/{building}/timestamps", get(routes::timestamps))
        .with_state(engine)
}

impl QueryError {
    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::BuildingNotFound
            | QueryError::SensorNotFound
            | QueryError::OutOfRange
            | QueryError::InvalidSelection => StatusCode::NOT_FOUND,
            QueryError::MissingParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let detail = match &self {
            QueryError::Internal(reason) => {
                error!("Request failed: {}", reason);
                INTERNAL_ERROR_DETAIL.to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests;
