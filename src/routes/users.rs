use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};

use crate::{
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    error::AppResult,
    middleware::auth::{Gate, authorize},
    models::{Role, User},
    response::ApiResponse,
    routes::params::Pagination,
    services::user_service,
    state::AppState,
    validation::{extract_query, extract_validated_json, parse_id},
};

/// Every user route is admin only.
pub fn router(state: &AppState) -> Router<AppState> {
    let admin = Gate::roles(&state.tokens, Role::ADMIN);
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route_layer(from_fn_with_state(admin, authorize))
}

#[utoipa::path(
    get,
    path = "/users",
    params(Pagination),
    responses((status = 200, description = "List users", body = ApiResponse<UserList>)),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let pagination = extract_query(pagination)?;
    let resp = user_service::list_users(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Get user", body = ApiResponse<User>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<User>>> {
    let id = parse_id(&id, "user id")?;
    let resp = user_service::get_user(&state, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Create user", body = ApiResponse<User>),
        (status = 400, description = "Invalid fields or email taken")
    ),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let payload = extract_validated_json(body)?;
    let resp = user_service::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated user", body = ApiResponse<User>)),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<User>>> {
    let id = parse_id(&id, "user id")?;
    let payload = extract_validated_json(body)?;
    let resp = user_service::update_user(&state, &id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Deleted user")),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&id, "user id")?;
    let resp = user_service::delete_user(&state, &id).await?;
    Ok(Json(resp))
}
