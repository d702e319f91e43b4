use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Cart, CartItem, DocumentId};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCartRequest {
    /// Owner of the cart; defaults to the caller.
    pub user_id: Option<DocumentId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceCartRequest {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub album_id: DocumentId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartList {
    pub items: Vec<Cart>,
}
