//! Request validation at the HTTP boundary.
//!
//! Serde rejects bodies of the wrong shape; [`Validate`] covers the field
//! rules serde cannot express. Both surface as `400 Bad Request`.

use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
};

use crate::{
    dto::{
        albums::{CreateAlbumRequest, UpdateAlbumRequest},
        carts::{AddCartItemRequest, CreateCartRequest, ReplaceCartRequest, SetQuantityRequest},
        orders::{CreateOrderRequest, UpdateOrderRequest, UpdateOrderStatusRequest},
        reviews::ReviewRequest,
        users::{CreateUserRequest, UpdateUserRequest},
    },
    error::{AppError, AppResult},
    models::{CartItem, DocumentId, OrderStatus, Role},
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_query<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> AppResult<T> {
    let value = extract_json(body)?;
    value.validate().map_err(AppError::BadRequest)?;
    Ok(value)
}

/// Parses a path segment as a document id.
pub fn parse_id(raw: &str, field: &str) -> AppResult<DocumentId> {
    DocumentId::parse(raw).map_err(|_| AppError::BadRequest(format!("invalid {field}")))
}

pub fn parse_order_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(AppError::BadRequest)
}

fn required_ref(id: Option<&DocumentId>, field: &str) -> Result<(), String> {
    match id {
        None => Err(format!("{field} is required")),
        Some(id) if id.is_zero() => Err(format!("{field} must not be the zero id")),
        Some(_) => Ok(()),
    }
}

fn positive_quantity(quantity: i32, field: &str) -> Result<(), String> {
    if quantity <= 0 {
        return Err(format!("{field} must be greater than zero"));
    }
    Ok(())
}

fn cart_items(items: &[CartItem]) -> Result<(), String> {
    for (i, item) in items.iter().enumerate() {
        required_ref(Some(&item.album_id), &format!("items[{i}].album_id"))?;
        positive_quantity(item.quantity, &format!("items[{i}].quantity"))?;
    }
    Ok(())
}

fn album_fields(
    title: Option<&str>,
    artist: Option<&str>,
    price: Option<i64>,
    quantity: Option<i32>,
) -> Result<(), String> {
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err("title must not be empty".into());
    }
    if artist.is_some_and(|a| a.trim().is_empty()) {
        return Err("artist must not be empty".into());
    }
    if price.is_some_and(|p| p < 0) {
        return Err("price must not be negative".into());
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err("quantity must not be negative".into());
    }
    Ok(())
}

fn email(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() || !value.contains('@') {
        return Err("email is not valid".into());
    }
    Ok(())
}

fn role(value: Option<&str>) -> Result<(), String> {
    match value {
        Some(raw) => raw.parse::<Role>().map(|_| ()),
        None => Ok(()),
    }
}

impl Validate for CreateAlbumRequest {
    fn validate(&self) -> Result<(), String> {
        album_fields(
            Some(&self.title),
            Some(&self.artist),
            Some(self.price),
            Some(self.quantity),
        )
    }
}

impl Validate for Vec<CreateAlbumRequest> {
    fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("at least one album is required".into());
        }
        for (i, album) in self.iter().enumerate() {
            album.validate().map_err(|msg| format!("albums[{i}]: {msg}"))?;
        }
        Ok(())
    }
}

impl Validate for UpdateAlbumRequest {
    fn validate(&self) -> Result<(), String> {
        album_fields(
            self.title.as_deref(),
            self.artist.as_deref(),
            self.price,
            self.quantity,
        )
    }
}

impl Validate for CreateCartRequest {
    fn validate(&self) -> Result<(), String> {
        if self.user_id.as_ref().is_some_and(DocumentId::is_zero) {
            return Err("user_id must not be the zero id".into());
        }
        cart_items(&self.items)
    }
}

impl Validate for ReplaceCartRequest {
    fn validate(&self) -> Result<(), String> {
        cart_items(&self.items)
    }
}

impl Validate for AddCartItemRequest {
    fn validate(&self) -> Result<(), String> {
        required_ref(Some(&self.album_id), "album_id")?;
        positive_quantity(self.quantity, "quantity")
    }
}

impl Validate for SetQuantityRequest {
    fn validate(&self) -> Result<(), String> {
        positive_quantity(self.quantity, "quantity")
    }
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("an order needs at least one item".into());
        }
        if self.user_id.as_ref().is_some_and(DocumentId::is_zero) {
            return Err("user_id must not be the zero id".into());
        }
        for (i, line) in self.items.iter().enumerate() {
            required_ref(Some(&line.album_id), &format!("items[{i}].album_id"))?;
            positive_quantity(line.quantity, &format!("items[{i}].quantity"))?;
        }
        Ok(())
    }
}

impl Validate for UpdateOrderRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(items) = &self.items {
            if items.is_empty() {
                return Err("an order needs at least one item".into());
            }
            for (i, item) in items.iter().enumerate() {
                positive_quantity(item.quantity, &format!("items[{i}].quantity"))?;
                if item.price < 0 {
                    return Err(format!("items[{i}].price must not be negative"));
                }
            }
        }
        match &self.status {
            Some(status) => status.parse::<OrderStatus>().map(|_| ()),
            None => Ok(()),
        }
    }
}

impl Validate for UpdateOrderStatusRequest {
    fn validate(&self) -> Result<(), String> {
        self.status.parse::<OrderStatus>().map(|_| ())
    }
}

impl Validate for ReviewRequest {
    fn validate(&self) -> Result<(), String> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            ));
        }
        required_ref(self.album_id.as_ref(), "album_id")?;
        required_ref(self.user_id.as_ref(), "user_id")
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        email(&self.email)?;
        if self.password.is_empty() {
            return Err("password must not be empty".into());
        }
        role(self.role.as_deref())
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(value) = &self.email {
            email(value)?;
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            return Err("password must not be empty".into());
        }
        role(self.role.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i32) -> ReviewRequest {
        ReviewRequest {
            album_id: Some(DocumentId::generate()),
            user_id: Some(DocumentId::generate()),
            rating,
            comment: "Great record".into(),
        }
    }

    #[test]
    fn review_rating_bounds() {
        assert!(review(0).validate().is_err());
        assert!(review(6).validate().is_err());
        assert!(review(-1).validate().is_err());
        assert!(review(1).validate().is_ok());
        assert!(review(5).validate().is_ok());
    }

    #[test]
    fn review_requires_non_zero_references() {
        let mut missing = review(4);
        missing.album_id = None;
        assert!(missing.validate().is_err());

        let mut zero = review(4);
        zero.user_id = Some(DocumentId::parse("000000000000000000000000").unwrap());
        assert!(zero.validate().is_err());
    }

    #[test]
    fn order_status_must_be_known() {
        let ok = UpdateOrderStatusRequest {
            status: "shipped".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateOrderStatusRequest {
            status: "lost".into(),
        };
        assert!(bad.validate().is_err());
        assert_eq!(parse_order_status("lost").unwrap_err().status().as_u16(), 400);
    }

    #[test]
    fn path_ids_must_be_hex() {
        assert!(parse_id("65f1c0a2b3c4d5e6f7a8b9c0", "id").is_ok());
        let err = parse_id("42", "id").unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn album_rules() {
        let album = CreateAlbumRequest {
            title: "Kind of Blue".into(),
            artist: "Miles Davis".into(),
            genre: "Jazz".into(),
            price: 1999,
            quantity: 3,
        };
        assert!(album.validate().is_ok());

        let mut blank = album.clone();
        blank.title = "  ".into();
        assert!(blank.validate().is_err());

        let mut negative = album;
        negative.price = -1;
        assert!(negative.validate().is_err());

        let patch = UpdateAlbumRequest {
            quantity: Some(-2),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn cart_quantities_must_be_positive() {
        let add = AddCartItemRequest {
            album_id: DocumentId::generate(),
            quantity: 0,
        };
        assert!(add.validate().is_err());
        assert!(SetQuantityRequest { quantity: 2 }.validate().is_ok());
    }

    #[test]
    fn user_email_and_role_are_checked() {
        let user = CreateUserRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone_number: None,
            password: "secret".into(),
            role: Some("employee".into()),
            is_active: None,
            shipping_details: None,
        };
        assert!(user.validate().is_ok());

        let mut no_at = user.clone();
        no_at.email = "ada.example.com".into();
        assert!(no_at.validate().is_err());

        let mut bad_role = user;
        bad_role.role = Some("owner".into());
        assert!(bad_role.validate().is_err());
    }
}
