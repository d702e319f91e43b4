use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DocumentId, Order, OrderItem, ShippingDetails};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub album_id: DocumentId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Customer placing the order; defaults to the caller.
    pub user_id: Option<DocumentId>,
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub shipping: ShippingDetails,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub items: Option<Vec<OrderItem>>,
    pub status: Option<String>,
    pub shipping: Option<ShippingDetails>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
