use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::{
    dto::albums::{AlbumList, BulkInsertResponse, CreateAlbumRequest, UpdateAlbumRequest},
    error::AppResult,
    middleware::auth::Gate,
    models::{Album, Role},
    response::ApiResponse,
    routes::{gated, params::AlbumQuery},
    services::album_service,
    state::AppState,
    validation::{extract_query, extract_validated_json, parse_id},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let staff = Gate::roles(&state.tokens, Role::STAFF);
    Router::new()
        .route("/", get(list_albums).merge(gated(post(create_album), &staff)))
        .route("/bulk", gated(post(create_albums), &staff))
        .route(
            "/{id}",
            get(get_album).merge(gated(patch(update_album).delete(delete_album), &staff)),
        )
}

#[utoipa::path(
    get,
    path = "/albums",
    params(AlbumQuery),
    responses(
        (status = 200, description = "List albums", body = ApiResponse<AlbumList>),
        (status = 400, description = "Unknown sort field")
    ),
    tag = "Albums"
)]
pub async fn list_albums(
    State(state): State<AppState>,
    query: Result<Query<AlbumQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<AlbumList>>> {
    let query = extract_query(query)?;
    let resp = album_service::list_albums(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/albums/{id}",
    params(("id" = String, Path, description = "Album ID")),
    responses(
        (status = 200, description = "Get album", body = ApiResponse<Album>),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Album not found")
    ),
    tag = "Albums"
)]
pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Album>>> {
    let id = parse_id(&id, "album id")?;
    let resp = album_service::get_album(&state, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/albums",
    request_body = CreateAlbumRequest,
    responses(
        (status = 201, description = "Create album", body = ApiResponse<Album>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role not allowed")
    ),
    tag = "Albums"
)]
pub async fn create_album(
    State(state): State<AppState>,
    body: Result<Json<CreateAlbumRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Album>>)> {
    let payload = extract_validated_json(body)?;
    let resp = album_service::create_album(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/albums/bulk",
    request_body = Vec<CreateAlbumRequest>,
    responses(
        (status = 201, description = "Insert many albums", body = ApiResponse<BulkInsertResponse>)
    ),
    tag = "Albums"
)]
pub async fn create_albums(
    State(state): State<AppState>,
    body: Result<Json<Vec<CreateAlbumRequest>>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<BulkInsertResponse>>)> {
    let payload = extract_validated_json(body)?;
    let resp = album_service::create_albums(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/albums/{id}",
    params(("id" = String, Path, description = "Album ID")),
    request_body = UpdateAlbumRequest,
    responses(
        (status = 200, description = "Updated album", body = ApiResponse<Album>),
        (status = 404, description = "Album not found")
    ),
    tag = "Albums"
)]
pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAlbumRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Album>>> {
    let id = parse_id(&id, "album id")?;
    let payload = extract_validated_json(body)?;
    let resp = album_service::update_album(&state, &id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/albums/{id}",
    params(("id" = String, Path, description = "Album ID")),
    responses(
        (status = 200, description = "Deleted album"),
        (status = 404, description = "Album not found")
    ),
    tag = "Albums"
)]
pub async fn delete_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&id, "album id")?;
    let resp = album_service::delete_album(&state, &id).await?;
    Ok(Json(resp))
}
