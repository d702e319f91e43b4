use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ShippingDetails, User};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    /// `customer` when omitted.
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub shipping_details: Option<ShippingDetails>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub shipping_details: Option<ShippingDetails>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}
