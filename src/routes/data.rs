use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::data::LoadReport,
    error::AppResult,
    middleware::auth::Gate,
    models::Role,
    response::{ApiResponse, Meta},
    routes::gated,
    services::loader_service,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let admin = Gate::roles(&state.tokens, Role::ADMIN);
    Router::new().route("/load", gated(post(load_data), &admin))
}

#[utoipa::path(
    post,
    path = "/data/load",
    responses(
        (status = 200, description = "Per collection reload report", body = ApiResponse<LoadReport>),
        (status = 403, description = "Admin only")
    ),
    tag = "Data"
)]
pub async fn load_data(State(state): State<AppState>) -> AppResult<Json<ApiResponse<LoadReport>>> {
    let report = loader_service::load_all(&state).await?;
    Ok(Json(ApiResponse::success(
        "Data loaded",
        report,
        Some(Meta::empty()),
    )))
}
