use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderRequest, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::{AuthUser, Gate},
    models::{Order, Role, ShippingDetails},
    response::ApiResponse,
    routes::{gated, params::Pagination},
    services::order_service,
    state::AppState,
    validation::{extract_json, extract_query, extract_validated_json, parse_id},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let staff = Gate::roles(&state.tokens, Role::STAFF);
    let any_role = Gate::roles(&state.tokens, Role::ALL);
    let admin = Gate::roles(&state.tokens, Role::ADMIN);
    Router::new()
        .route(
            "/",
            gated(get(list_orders), &staff).merge(gated(post(create_order), &any_role)),
        )
        .route("/user/{user_id}", gated(get(list_user_orders), &staff))
        .route(
            "/{id}",
            gated(get(get_order).put(update_order), &staff)
                .merge(gated(delete(delete_order), &admin)),
        )
        .route("/{id}/status", gated(patch(update_status), &staff))
        .route("/{id}/shipping", gated(put(update_shipping), &staff))
}

#[utoipa::path(
    get,
    path = "/orders",
    params(Pagination),
    responses((status = 200, description = "List orders", body = ApiResponse<OrderList>)),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let pagination = extract_query(pagination)?;
    let resp = order_service::list_orders(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/user/{user_id}",
    params(
        ("user_id" = String, Path, description = "Customer ID"),
        Pagination
    ),
    responses((status = 200, description = "Orders of a user", body = ApiResponse<OrderList>)),
    tag = "Orders"
)]
pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let pagination = extract_query(pagination)?;
    let user_id = parse_id(&user_id, "user id")?;
    let resp = order_service::list_user_orders(&state, &user_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Get order", body = ApiResponse<Order>),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&id, "order id")?;
    let resp = order_service::get_order(&state, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<Order>),
        (status = 400, description = "Invalid items or unknown album")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let payload = extract_validated_json(body)?;
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses((status = 200, description = "Updated order", body = ApiResponse<Order>)),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&id, "order id")?;
    let payload = extract_validated_json(body)?;
    let resp = order_service::update_order(&state, &id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(("id" = String, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Order>),
        (status = 400, description = "Unknown status or backwards transition")
    ),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&id, "order id")?;
    let payload = extract_validated_json(body)?;
    let resp = order_service::update_status(&state, &id, &payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/orders/{id}/shipping",
    params(("id" = String, Path, description = "Order ID")),
    request_body = ShippingDetails,
    responses((status = 200, description = "Shipping replaced", body = ApiResponse<Order>)),
    tag = "Orders"
)]
pub async fn update_shipping(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ShippingDetails>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let id = parse_id(&id, "order id")?;
    let shipping = extract_json(body)?;
    let resp = order_service::update_shipping(&state, &id, shipping).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses((status = 200, description = "Deleted order")),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_id(&id, "order id")?;
    let resp = order_service::delete_order(&state, &id).await?;
    Ok(Json(resp))
}
