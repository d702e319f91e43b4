use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{delete, get, post, put},
};
use sea_orm::Condition;

use crate::{
    dto::reviews::{ReviewList, ReviewRequest},
    error::AppResult,
    middleware::auth::{AuthUser, Gate},
    models::{Review, Role},
    response::ApiResponse,
    routes::{gated, params::Pagination},
    services::review_service,
    state::AppState,
    validation::{extract_query, extract_validated_json, parse_id},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let any_role = Gate::roles(&state.tokens, Role::ALL);
    let staff = Gate::roles(&state.tokens, Role::STAFF);
    Router::new()
        .route(
            "/",
            get(list_reviews).merge(gated(post(create_review), &any_role)),
        )
        .route("/album/{album_id}", get(list_album_reviews))
        .route("/user/{user_id}", get(list_user_reviews))
        .route(
            "/{id}",
            get(get_review)
                .merge(gated(put(update_review), &any_role))
                .merge(gated(delete(delete_review), &staff)),
        )
}

#[utoipa::path(
    get,
    path = "/reviews",
    params(Pagination),
    responses((status = 200, description = "List reviews", body = ApiResponse<ReviewList>)),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let pagination = extract_query(pagination)?;
    let resp = review_service::list_reviews(&state, Condition::all(), pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reviews/album/{album_id}",
    params(("album_id" = String, Path, description = "Album ID"), Pagination),
    responses((status = 200, description = "Reviews of an album", body = ApiResponse<ReviewList>)),
    tag = "Reviews"
)]
pub async fn list_album_reviews(
    State(state): State<AppState>,
    Path(album_id): Path<String>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let pagination = extract_query(pagination)?;
    let album_id = parse_id(&album_id, "album id")?;
    let filter = review_service::by_album(&album_id);
    let resp = review_service::list_reviews(&state, filter, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reviews/user/{user_id}",
    params(("user_id" = String, Path, description = "Author ID"), Pagination),
    responses((status = 200, description = "Reviews by a user", body = ApiResponse<ReviewList>)),
    tag = "Reviews"
)]
pub async fn list_user_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let pagination = extract_query(pagination)?;
    let user_id = parse_id(&user_id, "user id")?;
    let filter = review_service::by_user(&user_id);
    let resp = review_service::list_reviews(&state, filter, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Get review", body = ApiResponse<Review>),
        (status = 404, description = "Review not found")
    ),
    tag = "Reviews"
)]
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let id = parse_id(&id, "review id")?;
    let resp = review_service::get_review(&state, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/reviews",
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Rating out of range or missing reference")
    ),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let payload = extract_validated_json(body)?;
    let resp = review_service::create_review(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    request_body = ReviewRequest,
    responses((status = 200, description = "Review replaced", body = ApiResponse<Review>)),
    tag = "Reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let id = parse_id(&id, "review id")?;
    let payload = extract_validated_json(body)?;
    let resp = review_service::update_review(&state, &user, &id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = String, Path, description = "Review ID")),
    responses((status = 200, description = "Deleted review")),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&id, "review id")?;
    let resp = review_service::delete_review(&state, &id).await?;
    Ok(Json(resp))
}
