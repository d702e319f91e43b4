use axum::{
    Router,
    http::Uri,
    middleware::from_fn_with_state,
    routing::{MethodRouter, get},
};

use crate::{
    error::AppError,
    middleware::auth::{Gate, authorize},
    state::AppState,
};

pub mod albums;
pub mod auth;
pub mod carts;
pub mod data;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod reviews;
pub mod users;

/// Puts `route` behind `gate`. Other methods on the same path are unaffected.
pub(crate) fn gated(route: MethodRouter<AppState>, gate: &Gate) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(gate.clone(), authorize))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .nest("/albums", albums::router(&state))
        .nest("/carts", carts::router(&state))
        .nest("/orders", orders::router(&state))
        .nest("/reviews", reviews::router(&state))
        .nest("/users", users::router(&state))
        .nest("/data", data::router(&state))
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    tracing::debug!(path = %uri.path(), "no route");
    AppError::NotFound("route")
}
