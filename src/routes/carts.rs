use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::{
    dto::carts::{
        AddCartItemRequest, CartList, CreateCartRequest, ReplaceCartRequest, SetQuantityRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, Gate},
    models::{Cart, Role},
    response::ApiResponse,
    routes::{gated, params::Pagination},
    services::cart_service,
    state::AppState,
    validation::{extract_query, extract_validated_json, parse_id},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let staff = Gate::roles(&state.tokens, Role::STAFF);
    let signed_in = Gate::authenticated(&state.tokens);
    Router::new()
        .route(
            "/",
            gated(get(list_carts), &staff).merge(gated(post(create_cart), &signed_in)),
        )
        .route("/user/{user_id}", gated(get(get_user_cart), &signed_in))
        .route(
            "/{id}",
            gated(get(get_cart).put(replace_cart).delete(delete_cart), &signed_in),
        )
        .route("/{id}/items", gated(post(add_item), &signed_in))
        .route(
            "/{id}/items/{album_id}",
            gated(delete(remove_item).put(set_item_quantity), &signed_in),
        )
        .route("/{id}/total", gated(put(recompute_total), &signed_in))
        .route("/{id}/clear", gated(post(clear_cart), &signed_in))
}

#[utoipa::path(
    get,
    path = "/carts",
    params(Pagination),
    responses((status = 200, description = "List carts", body = ApiResponse<CartList>)),
    tag = "Carts"
)]
pub async fn list_carts(
    State(state): State<AppState>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let pagination = extract_query(pagination)?;
    let resp = cart_service::list_carts(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/carts/{id}",
    params(("id" = String, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Get cart", body = ApiResponse<Cart>),
        (status = 404, description = "Cart not found")
    ),
    tag = "Carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let id = parse_id(&id, "cart id")?;
    let resp = cart_service::get_cart(&state, &user, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/carts/user/{user_id}",
    params(("user_id" = String, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "Cart of a user", body = ApiResponse<Cart>),
        (status = 404, description = "User has no cart")
    ),
    tag = "Carts"
)]
pub async fn get_user_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let user_id = parse_id(&user_id, "user id")?;
    let resp = cart_service::get_user_cart(&state, &user, &user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/carts",
    request_body = CreateCartRequest,
    responses(
        (status = 201, description = "Create cart", body = ApiResponse<Cart>),
        (status = 400, description = "User already has a cart")
    ),
    tag = "Carts"
)]
pub async fn create_cart(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateCartRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Cart>>)> {
    let payload = extract_validated_json(body)?;
    let resp = cart_service::create_cart(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/carts/{id}",
    params(("id" = String, Path, description = "Cart ID")),
    request_body = ReplaceCartRequest,
    responses((status = 200, description = "Replace cart items", body = ApiResponse<Cart>)),
    tag = "Carts"
)]
pub async fn replace_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<ReplaceCartRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let id = parse_id(&id, "cart id")?;
    let payload = extract_validated_json(body)?;
    let resp = cart_service::replace_cart(&state, &user, &id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/carts/{id}",
    params(("id" = String, Path, description = "Cart ID")),
    responses((status = 200, description = "Deleted cart")),
    tag = "Carts"
)]
pub async fn delete_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&id, "cart id")?;
    let resp = cart_service::delete_cart(&state, &user, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/carts/{id}/items",
    params(("id" = String, Path, description = "Cart ID")),
    request_body = AddCartItemRequest,
    responses((status = 200, description = "Item merged into cart", body = ApiResponse<Cart>)),
    tag = "Carts"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<AddCartItemRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let id = parse_id(&id, "cart id")?;
    let payload = extract_validated_json(body)?;
    let resp = cart_service::add_item(&state, &user, &id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/carts/{id}/items/{album_id}",
    params(
        ("id" = String, Path, description = "Cart ID"),
        ("album_id" = String, Path, description = "Album ID")
    ),
    responses((status = 200, description = "Item removed", body = ApiResponse<Cart>)),
    tag = "Carts"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, album_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let id = parse_id(&id, "cart id")?;
    let album_id = parse_id(&album_id, "album id")?;
    let resp = cart_service::remove_cart_item(&state, &user, &id, &album_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/carts/{id}/items/{album_id}",
    params(
        ("id" = String, Path, description = "Cart ID"),
        ("album_id" = String, Path, description = "Album ID")
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity overwritten", body = ApiResponse<Cart>),
        (status = 404, description = "Album not in cart")
    ),
    tag = "Carts"
)]
pub async fn set_item_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, album_id)): Path<(String, String)>,
    body: Result<Json<SetQuantityRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let id = parse_id(&id, "cart id")?;
    let album_id = parse_id(&album_id, "album id")?;
    let payload = extract_validated_json(body)?;
    let resp = cart_service::update_item_quantity(&state, &user, &id, &album_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/carts/{id}/total",
    params(("id" = String, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Total recomputed from album prices", body = ApiResponse<Cart>),
        (status = 500, description = "An album could not be read")
    ),
    tag = "Carts"
)]
pub async fn recompute_total(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let id = parse_id(&id, "cart id")?;
    let resp = cart_service::recompute_total(&state, &user, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/carts/{id}/clear",
    params(("id" = String, Path, description = "Cart ID")),
    responses((status = 200, description = "Cart emptied", body = ApiResponse<Cart>)),
    tag = "Carts"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let id = parse_id(&id, "cart id")?;
    let resp = cart_service::clear(&state, &user, &id).await?;
    Ok(Json(resp))
}
