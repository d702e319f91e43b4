use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse},
    error::AppResult,
    services::auth_service::login_user,
    state::AppState,
    validation::extract_json,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = LoginResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Invalid credentials")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let payload = extract_json(body)?;
    // Bare `{token}` body, outside the success envelope.
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}
