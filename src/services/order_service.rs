use chrono::Utc;
use sea_orm::{ActiveValue::Set, ColumnTrait, Condition, Order as SortOrder};

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderRequest},
    entity::orders::{ActiveModel, Column, Model as OrderModel, OrderItemList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_staff},
    models::{DocumentId, Order, OrderItem, OrderStatus, ShippingDetails},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::parse_order_status,
};

pub fn order_total(items: &[OrderItem]) -> AppResult<i64> {
    items.iter().try_fold(0_i64, |total, item| {
        item.price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| AppError::BadRequest("order total is too large".into()))
    })
}

pub fn check_transition(current: OrderStatus, next: OrderStatus) -> AppResult<()> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "cannot move order from {current} to {next}"
        )))
    }
}

pub async fn list_orders(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    list_matching(state, Condition::all(), pagination).await
}

pub async fn list_user_orders(
    state: &AppState,
    user_id: &DocumentId,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let filter = Condition::all().add(Column::UserId.eq(user_id.as_str()));
    list_matching(state, filter, pagination).await
}

async fn list_matching(
    state: &AppState,
    filter: Condition,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, skip) = pagination.normalize();
    let found = state
        .orders
        .find(filter, &[(Column::CreatedAt, SortOrder::Desc)], skip, limit)
        .await?;
    let items = found
        .items
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, found.total)),
    ))
}

pub async fn get_order(state: &AppState, id: &DocumentId) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.find_by_id(id).await?;
    Ok(ApiResponse::success("Order", order_from_entity(order)?, None))
}

/// Places a pending order, pricing each line from the album's current price.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let owner = payload.user_id.unwrap_or_else(|| user.user_id.clone());
    ensure_owner_or_staff(user, &owner)?;

    let mut items = Vec::with_capacity(payload.items.len());
    for line in payload.items {
        let album = match state.albums.find_by_id(&line.album_id).await {
            Ok(album) => album,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::BadRequest(format!(
                    "album {} does not exist",
                    line.album_id
                )));
            }
            Err(err) => return Err(err),
        };
        items.push(OrderItem {
            album_id: line.album_id,
            quantity: line.quantity,
            price: album.price,
        });
    }
    let total = order_total(&items)?;

    let now = Utc::now().fixed_offset();
    let record = ActiveModel {
        id: Set(DocumentId::generate().into()),
        user_id: Set(owner.into()),
        items: Set(OrderItemList(items)),
        total: Set(total),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        shipping: Set(payload.shipping),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let order = state.orders.insert(record).await?;
    tracing::info!(order_id = %order.id, user_id = %order.user_id, total, "order placed");

    Ok(ApiResponse::success(
        "Order created",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    id: &DocumentId,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let current = order_from_entity(state.orders.find_by_id(id).await?)?;

    let mut partial = ActiveModel {
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    if let Some(items) = payload.items {
        partial.total = Set(order_total(&items)?);
        partial.items = Set(OrderItemList(items));
    }
    if let Some(raw) = payload.status.as_deref() {
        let next = parse_order_status(raw)?;
        check_transition(current.status, next)?;
        partial.status = Set(next.as_str().to_string());
    }
    if let Some(shipping) = payload.shipping {
        partial.shipping = Set(shipping);
    }

    apply(state, id, partial).await
}

pub async fn update_status(
    state: &AppState,
    id: &DocumentId,
    raw_status: &str,
) -> AppResult<ApiResponse<Order>> {
    let next = parse_order_status(raw_status)?;
    let current = order_from_entity(state.orders.find_by_id(id).await?)?;
    check_transition(current.status, next)?;

    let partial = ActiveModel {
        status: Set(next.as_str().to_string()),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    tracing::info!(order_id = %id, from = %current.status, to = %next, "order status changed");
    apply(state, id, partial).await
}

pub async fn update_shipping(
    state: &AppState,
    id: &DocumentId,
    shipping: ShippingDetails,
) -> AppResult<ApiResponse<Order>> {
    let partial = ActiveModel {
        shipping: Set(shipping),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    apply(state, id, partial).await
}

async fn apply(
    state: &AppState,
    id: &DocumentId,
    partial: ActiveModel,
) -> AppResult<ApiResponse<Order>> {
    if !state.orders.update_by_id(id, partial).await? {
        return Err(AppError::NotFound(state.orders.label()));
    }
    let order = state.orders.find_by_id(id).await?;
    Ok(ApiResponse::success(
        "Updated",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    id: &DocumentId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !state.orders.delete_by_id(id).await? {
        return Err(AppError::NotFound(state.orders.label()));
    }
    tracing::info!(order_id = %id, "order deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|err| AppError::Internal(anyhow::anyhow!(err)))?;
    Ok(Order {
        id: DocumentId::from_stored(model.id),
        user_id: DocumentId::from_stored(model.user_id),
        items: model.items.0,
        total: model.total,
        status,
        shipping: model.shipping,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, price: i64) -> OrderItem {
        OrderItem {
            album_id: DocumentId::generate(),
            quantity,
            price,
        }
    }

    #[test]
    fn total_sums_snapshotted_prices() {
        let items = vec![line(2, 1500), line(1, 999)];
        assert_eq!(order_total(&items).unwrap(), 3999);
        assert_eq!(order_total(&[]).unwrap(), 0);
    }

    #[test]
    fn total_overflow_is_rejected() {
        assert!(order_total(&[line(2, i64::MAX)]).is_err());
    }

    #[test]
    fn backwards_transition_is_bad_request() {
        let err = check_transition(OrderStatus::Completed, OrderStatus::Pending).unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
        assert!(check_transition(OrderStatus::Pending, OrderStatus::Processing).is_ok());
    }
}
