//! Cart aggregation.
//!
//! Item mutations are pure functions over the item list, persisted with a
//! single update. `total` is a cached value: only [`recompute_total`] and
//! [`clear`] touch it, so it goes stale as items change until recomputed.
//! Concurrent writers to one cart race and the last write wins.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{ActiveValue::Set, ColumnTrait, Condition, Order};

use crate::{
    dto::carts::{
        AddCartItemRequest, CartList, CreateCartRequest, ReplaceCartRequest, SetQuantityRequest,
    },
    entity::carts::{ActiveModel, CartItemList, Column, Model as CartModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_staff},
    models::{Cart, CartItem, DocumentId},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

const CART_EXISTS: &str = "user already has a cart";

/// Adds `quantity` to the album's line, or appends a new line.
pub fn merge_item(items: &mut Vec<CartItem>, album_id: DocumentId, quantity: i32) -> AppResult<()> {
    match items.iter_mut().find(|item| item.album_id == album_id) {
        Some(existing) => {
            existing.quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
        }
        None => items.push(CartItem { album_id, quantity }),
    }
    Ok(())
}

/// Drops every line for the album. Removing an absent album is a no-op.
pub fn remove_item(items: &mut Vec<CartItem>, album_id: &DocumentId) {
    items.retain(|item| &item.album_id != album_id);
}

pub fn set_item_quantity(
    items: &mut [CartItem],
    album_id: &DocumentId,
    quantity: i32,
) -> AppResult<()> {
    let item = items
        .iter_mut()
        .find(|item| &item.album_id == album_id)
        .ok_or(AppError::NotFound("cart item"))?;
    item.quantity = quantity;
    Ok(())
}

/// Sum of price times quantity over all lines. Every album must be priced.
pub fn compute_total(items: &[CartItem], prices: &HashMap<DocumentId, i64>) -> AppResult<i64> {
    items.iter().try_fold(0_i64, |total, item| {
        let price = prices.get(&item.album_id).ok_or_else(|| {
            AppError::DependencyFailure(format!("no price for album {}", item.album_id))
        })?;
        price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| AppError::DependencyFailure("cart total overflow".into()))
    })
}

/// Folds duplicate album lines together.
fn normalize(items: Vec<CartItem>) -> AppResult<Vec<CartItem>> {
    let mut merged = Vec::with_capacity(items.len());
    for item in items {
        merge_item(&mut merged, item.album_id, item.quantity)?;
    }
    Ok(merged)
}

async fn load(state: &AppState, user: &AuthUser, id: &DocumentId) -> AppResult<CartModel> {
    let cart = state.carts.find_by_id(id).await?;
    ensure_owner_or_staff(user, &DocumentId::from_stored(cart.user_id.clone()))?;
    Ok(cart)
}

async fn save_items(
    state: &AppState,
    mut cart: CartModel,
    items: Vec<CartItem>,
) -> AppResult<Cart> {
    let now = Utc::now().fixed_offset();
    let partial = ActiveModel {
        items: Set(CartItemList(items.clone())),
        updated_at: Set(now),
        ..Default::default()
    };
    let id = DocumentId::from_stored(cart.id.clone());
    if !state.carts.update_by_id(&id, partial).await? {
        return Err(AppError::NotFound(state.carts.label()));
    }

    cart.items = CartItemList(items);
    cart.updated_at = now;
    Ok(cart_from_entity(cart))
}

pub async fn list_carts(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, skip) = pagination.normalize();
    let found = state
        .carts
        .find(Condition::all(), &[(Column::CreatedAt, Order::Desc)], skip, limit)
        .await?;
    let items = found.items.into_iter().map(cart_from_entity).collect();

    Ok(ApiResponse::success(
        "Carts",
        CartList { items },
        Some(Meta::new(page, limit, found.total)),
    ))
}

pub async fn get_cart(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
) -> AppResult<ApiResponse<Cart>> {
    let cart = load(state, user, id).await?;
    Ok(ApiResponse::success("Cart", cart_from_entity(cart), None))
}

pub async fn get_user_cart(
    state: &AppState,
    user: &AuthUser,
    user_id: &DocumentId,
) -> AppResult<ApiResponse<Cart>> {
    ensure_owner_or_staff(user, user_id)?;
    let cart = state
        .carts
        .find_one(Condition::all().add(Column::UserId.eq(user_id.as_str())))
        .await?
        .ok_or(AppError::NotFound(state.carts.label()))?;
    Ok(ApiResponse::success("Cart", cart_from_entity(cart), None))
}

pub async fn create_cart(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let owner = payload.user_id.unwrap_or_else(|| user.user_id.clone());
    ensure_owner_or_staff(user, &owner)?;

    let existing = state
        .carts
        .find_one(Condition::all().add(Column::UserId.eq(owner.as_str())))
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(CART_EXISTS.into()));
    }

    let now = Utc::now().fixed_offset();
    let record = ActiveModel {
        id: Set(DocumentId::generate().into()),
        user_id: Set(owner.into()),
        items: Set(CartItemList(normalize(payload.items)?)),
        total: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let cart = state
        .carts
        .insert(record)
        .await
        .map_err(|err| err.on_unique_violation(CART_EXISTS))?;
    tracing::info!(cart_id = %cart.id, user_id = %cart.user_id, "cart created");

    Ok(ApiResponse::success(
        "Cart created",
        cart_from_entity(cart),
        Some(Meta::empty()),
    ))
}

pub async fn replace_cart(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
    payload: ReplaceCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let cart = load(state, user, id).await?;
    let cart = save_items(state, cart, normalize(payload.items)?).await?;
    Ok(ApiResponse::success("Updated", cart, Some(Meta::empty())))
}

pub async fn delete_cart(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    load(state, user, id).await?;
    if !state.carts.delete_by_id(id).await? {
        return Err(AppError::NotFound(state.carts.label()));
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    let cart = load(state, user, id).await?;
    let mut items = cart.items.0.clone();
    merge_item(&mut items, payload.album_id, payload.quantity)?;

    let cart = save_items(state, cart, items).await?;
    Ok(ApiResponse::success("Item added", cart, Some(Meta::empty())))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
    album_id: &DocumentId,
) -> AppResult<ApiResponse<Cart>> {
    let cart = load(state, user, id).await?;
    let mut items = cart.items.0.clone();
    remove_item(&mut items, album_id);

    let cart = save_items(state, cart, items).await?;
    Ok(ApiResponse::success("Item removed", cart, Some(Meta::empty())))
}

pub async fn update_item_quantity(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
    album_id: &DocumentId,
    payload: SetQuantityRequest,
) -> AppResult<ApiResponse<Cart>> {
    let cart = load(state, user, id).await?;
    let mut items = cart.items.0.clone();
    set_item_quantity(&mut items, album_id, payload.quantity)?;

    let cart = save_items(state, cart, items).await?;
    Ok(ApiResponse::success("Updated", cart, Some(Meta::empty())))
}

/// Re-prices every line from the current album records and stores the sum.
pub async fn recompute_total(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
) -> AppResult<ApiResponse<Cart>> {
    let mut cart = load(state, user, id).await?;

    let album_ids: BTreeSet<&DocumentId> = cart.items.0.iter().map(|i| &i.album_id).collect();
    let mut prices = HashMap::with_capacity(album_ids.len());
    for album_id in album_ids {
        let album = state.albums.find_by_id(album_id).await.map_err(|err| {
            tracing::warn!(cart_id = %id, album_id = %album_id, error = %err, "album lookup failed");
            AppError::DependencyFailure(format!("album {album_id} could not be read"))
        })?;
        prices.insert(album_id.clone(), album.price);
    }
    let total = compute_total(&cart.items.0, &prices)?;

    let now = Utc::now().fixed_offset();
    let partial = ActiveModel {
        total: Set(total),
        updated_at: Set(now),
        ..Default::default()
    };
    if !state.carts.update_by_id(id, partial).await? {
        return Err(AppError::NotFound(state.carts.label()));
    }
    tracing::debug!(cart_id = %id, total, "cart total recomputed");

    cart.total = total;
    cart.updated_at = now;
    Ok(ApiResponse::success(
        "Total updated",
        cart_from_entity(cart),
        Some(Meta::empty()),
    ))
}

pub async fn clear(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
) -> AppResult<ApiResponse<Cart>> {
    let mut cart = load(state, user, id).await?;

    let now = Utc::now().fixed_offset();
    let partial = ActiveModel {
        items: Set(CartItemList::default()),
        total: Set(0),
        updated_at: Set(now),
        ..Default::default()
    };
    if !state.carts.update_by_id(id, partial).await? {
        return Err(AppError::NotFound(state.carts.label()));
    }

    cart.items = CartItemList::default();
    cart.total = 0;
    cart.updated_at = now;
    Ok(ApiResponse::success(
        "Cart cleared",
        cart_from_entity(cart),
        Some(Meta::empty()),
    ))
}

pub(crate) fn cart_from_entity(model: CartModel) -> Cart {
    Cart {
        id: DocumentId::from_stored(model.id),
        user_id: DocumentId::from_stored(model.user_id),
        items: model.items.0,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(n: u8) -> DocumentId {
        DocumentId::parse(&format!("{:024x}", n)).unwrap()
    }

    #[test]
    fn add_merges_quantities_for_same_album() {
        let mut items = Vec::new();
        merge_item(&mut items, album(1), 2).unwrap();
        merge_item(&mut items, album(2), 1).unwrap();
        merge_item(&mut items, album(1), 3).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(items[1].quantity, 1);
    }

    #[test]
    fn add_rejects_overflowing_quantity() {
        let mut items = vec![CartItem {
            album_id: album(1),
            quantity: i32::MAX,
        }];
        assert!(merge_item(&mut items, album(1), 1).is_err());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut items = vec![
            CartItem {
                album_id: album(1),
                quantity: 1,
            },
            CartItem {
                album_id: album(2),
                quantity: 4,
            },
        ];
        remove_item(&mut items, &album(1));
        let once = items.clone();
        remove_item(&mut items, &album(1));

        assert_eq!(items, once);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].album_id, album(2));
    }

    #[test]
    fn set_quantity_requires_album_in_cart() {
        let mut items = vec![CartItem {
            album_id: album(1),
            quantity: 1,
        }];
        set_item_quantity(&mut items, &album(1), 7).unwrap();
        assert_eq!(items[0].quantity, 7);

        let err = set_item_quantity(&mut items, &album(9), 2).unwrap_err();
        assert_eq!(err.status().as_u16(), 404);
    }

    #[test]
    fn total_prices_every_line() {
        let items = vec![
            CartItem {
                album_id: album(1),
                quantity: 2,
            },
            CartItem {
                album_id: album(2),
                quantity: 1,
            },
        ];
        let prices = HashMap::from([(album(1), 1000), (album(2), 2550)]);
        assert_eq!(compute_total(&items, &prices).unwrap(), 4550);
    }

    #[test]
    fn total_fails_when_an_album_is_unpriced() {
        let items = vec![CartItem {
            album_id: album(3),
            quantity: 1,
        }];
        let err = compute_total(&items, &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::DependencyFailure(_)));
    }

    #[test]
    fn total_of_cleared_cart_is_zero() {
        let mut items = vec![CartItem {
            album_id: album(1),
            quantity: 3,
        }];
        let prices = HashMap::from([(album(1), 999)]);
        assert_eq!(compute_total(&items, &prices).unwrap(), 2997);

        items.clear();
        assert_eq!(compute_total(&items, &prices).unwrap(), 0);
    }

    #[test]
    fn normalize_folds_duplicates() {
        let items = normalize(vec![
            CartItem {
                album_id: album(1),
                quantity: 1,
            },
            CartItem {
                album_id: album(1),
                quantity: 2,
            },
        ])
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }
}
