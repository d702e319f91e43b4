//! Reloads whole collections from `<data_dir>/<collection>.json`.
//!
//! Each collection pairs a JSON record shape with a `prepare` hook that turns
//! a decoded record into a row ready for insert. A file that is missing,
//! undecodable or fails its hook leaves the collection untouched and is
//! reported as skipped. Otherwise the collection is emptied and refilled in
//! one transaction; if the store rejects the batch the old rows stay and the
//! collection is reported as skipped too.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use sea_orm::{ActiveValue::Set, IntoActiveModel};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    dto::data::{CollectionReport, LoadReport},
    entity::{albums, carts, orders, reviews, users},
    error::{AppError, AppResult},
    models::{CartItem, DocumentId, OrderItem, OrderStatus, Role, ShippingDetails},
    repository::{ModelOf, Repository},
    services::{auth_service::hash_password, order_service::order_total},
    state::AppState,
    validation::{MAX_RATING, MIN_RATING},
};

type Timestamp = DateTime<FixedOffset>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Albums,
    Users,
    Orders,
    Carts,
    Reviews,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Albums,
        Collection::Users,
        Collection::Orders,
        Collection::Carts,
        Collection::Reviews,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Albums => "albums",
            Collection::Users => "users",
            Collection::Orders => "orders",
            Collection::Carts => "carts",
            Collection::Reviews => "reviews",
        }
    }
}

/// A record as it appears in a fixture file.
trait Fixture: DeserializeOwned {
    type Active: sea_orm::ActiveModelTrait + sea_orm::ActiveModelBehavior + Send + 'static;

    fn prepare(self, now: Timestamp) -> Result<Self::Active, String>;

    fn repository(state: &AppState) -> &Repository<Self::Active>;
}

fn id_or_new(id: Option<DocumentId>) -> String {
    id.unwrap_or_else(DocumentId::generate).into()
}

#[derive(Deserialize)]
struct AlbumFixture {
    id: Option<DocumentId>,
    title: String,
    artist: String,
    #[serde(default)]
    genre: String,
    price: i64,
    #[serde(default)]
    quantity: i32,
}

impl Fixture for AlbumFixture {
    type Active = albums::ActiveModel;

    fn prepare(self, now: Timestamp) -> Result<Self::Active, String> {
        if self.price < 0 || self.quantity < 0 {
            return Err(format!("album `{}` has a negative price or quantity", self.title));
        }
        Ok(albums::ActiveModel {
            id: Set(id_or_new(self.id)),
            title: Set(self.title),
            artist: Set(self.artist),
            genre: Set(self.genre),
            price: Set(self.price),
            quantity: Set(self.quantity),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }

    fn repository(state: &AppState) -> &Repository<Self::Active> {
        &state.albums
    }
}

#[derive(Deserialize)]
struct UserFixture {
    id: Option<DocumentId>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    email: String,
    phone_number: Option<String>,
    password: String,
    role: Role,
    #[serde(default = "active_by_default")]
    is_active: bool,
    shipping_details: Option<ShippingDetails>,
}

fn active_by_default() -> bool {
    true
}

impl Fixture for UserFixture {
    type Active = users::ActiveModel;

    fn prepare(self, now: Timestamp) -> Result<Self::Active, String> {
        let password_hash = hash_password(&self.password).map_err(|err| err.to_string())?;
        Ok(users::ActiveModel {
            id: Set(id_or_new(self.id)),
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            email: Set(self.email),
            phone_number: Set(self.phone_number),
            password_hash: Set(password_hash),
            role: Set(self.role.as_str().to_string()),
            is_active: Set(self.is_active),
            shipping_details: Set(self.shipping_details),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }

    fn repository(state: &AppState) -> &Repository<Self::Active> {
        &state.users
    }
}

#[derive(Deserialize)]
struct OrderFixture {
    id: Option<DocumentId>,
    user_id: DocumentId,
    items: Vec<OrderItem>,
    #[serde(default = "pending")]
    status: OrderStatus,
    #[serde(default)]
    shipping: ShippingDetails,
}

fn pending() -> OrderStatus {
    OrderStatus::Pending
}

impl Fixture for OrderFixture {
    type Active = orders::ActiveModel;

    fn prepare(self, now: Timestamp) -> Result<Self::Active, String> {
        let total = order_total(&self.items).map_err(|err| err.to_string())?;
        Ok(orders::ActiveModel {
            id: Set(id_or_new(self.id)),
            user_id: Set(self.user_id.into()),
            items: Set(orders::OrderItemList(self.items)),
            total: Set(total),
            status: Set(self.status.as_str().to_string()),
            shipping: Set(self.shipping),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }

    fn repository(state: &AppState) -> &Repository<Self::Active> {
        &state.orders
    }
}

#[derive(Deserialize)]
struct CartFixture {
    id: Option<DocumentId>,
    user_id: DocumentId,
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default)]
    total: i64,
}

impl Fixture for CartFixture {
    type Active = carts::ActiveModel;

    fn prepare(self, now: Timestamp) -> Result<Self::Active, String> {
        if self.items.iter().any(|item| item.quantity <= 0) {
            return Err(format!("cart of user {} has a non-positive quantity", self.user_id));
        }
        Ok(carts::ActiveModel {
            id: Set(id_or_new(self.id)),
            user_id: Set(self.user_id.into()),
            items: Set(carts::CartItemList(self.items)),
            total: Set(self.total.max(0)),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }

    fn repository(state: &AppState) -> &Repository<Self::Active> {
        &state.carts
    }
}

#[derive(Deserialize)]
struct ReviewFixture {
    id: Option<DocumentId>,
    album_id: DocumentId,
    user_id: DocumentId,
    rating: i32,
    #[serde(default)]
    comment: String,
}

impl Fixture for ReviewFixture {
    type Active = reviews::ActiveModel;

    fn prepare(self, now: Timestamp) -> Result<Self::Active, String> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(format!("review rating {} is out of range", self.rating));
        }
        Ok(reviews::ActiveModel {
            id: Set(id_or_new(self.id)),
            album_id: Set(self.album_id.into()),
            user_id: Set(self.user_id.into()),
            rating: Set(self.rating),
            comment: Set(self.comment),
            created_at: Set(now),
        })
    }

    fn repository(state: &AppState) -> &Repository<Self::Active> {
        &state.reviews
    }
}

/// Reads and prepares a fixture file. `Err` carries the skip reason.
async fn read_fixtures<F: Fixture>(path: &Path, now: Timestamp) -> Result<Vec<F::Active>, String> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    let records: Vec<F> = serde_json::from_slice(&raw)
        .map_err(|err| format!("cannot decode {}: {err}", path.display()))?;
    records
        .into_iter()
        .map(|record| record.prepare(now))
        .collect()
}

async fn load_collection<F>(state: &AppState, collection: Collection) -> AppResult<CollectionReport>
where
    F: Fixture,
    ModelOf<F::Active>: IntoActiveModel<F::Active> + Send + Sync,
{
    let path = state.data_dir.join(format!("{}.json", collection.name()));
    let now = chrono::Utc::now().fixed_offset();

    let records = match read_fixtures::<F>(&path, now).await {
        Ok(records) => records,
        Err(reason) => return Ok(skipped(collection, reason)),
    };

    match F::repository(state).replace_all(records).await {
        Ok((removed, inserted)) => {
            tracing::info!(collection = collection.name(), removed, inserted, "collection reloaded");
            Ok(CollectionReport {
                collection: collection.name().to_string(),
                inserted: Some(inserted),
                skipped: None,
            })
        }
        Err(err) => Ok(skipped(collection, store_failure(&err))),
    }
}

fn skipped(collection: Collection, reason: String) -> CollectionReport {
    tracing::warn!(collection = collection.name(), %reason, "collection skipped");
    CollectionReport {
        collection: collection.name().to_string(),
        inserted: None,
        skipped: Some(reason),
    }
}

fn store_failure(err: &AppError) -> String {
    match err {
        AppError::OrmError(db) => format!("store rejected the batch: {db}"),
        other => format!("store rejected the batch: {other}"),
    }
}

pub async fn load(state: &AppState, collection: Collection) -> AppResult<CollectionReport> {
    match collection {
        Collection::Albums => load_collection::<AlbumFixture>(state, collection).await,
        Collection::Users => load_collection::<UserFixture>(state, collection).await,
        Collection::Orders => load_collection::<OrderFixture>(state, collection).await,
        Collection::Carts => load_collection::<CartFixture>(state, collection).await,
        Collection::Reviews => load_collection::<ReviewFixture>(state, collection).await,
    }
}

pub async fn load_all(state: &AppState) -> AppResult<LoadReport> {
    let mut collections = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        collections.push(load(state, collection).await?);
    }
    Ok(LoadReport { collections })
}

#[cfg(test)]
mod tests {
    use sea_orm::ActiveValue;

    use super::*;

    fn now() -> Timestamp {
        chrono::Utc::now().fixed_offset()
    }

    #[test]
    fn collection_names_match_fixture_files() {
        let names: Vec<_> = Collection::ALL.iter().map(Collection::name).collect();
        assert_eq!(names, ["albums", "users", "orders", "carts", "reviews"]);
    }

    #[test]
    fn album_fixture_gets_id_and_timestamps() {
        let fixture: AlbumFixture = serde_json::from_value(serde_json::json!({
            "title": "Blue Train",
            "artist": "John Coltrane",
            "price": 1799
        }))
        .unwrap();
        let stamp = now();
        let row = fixture.prepare(stamp).unwrap();

        let ActiveValue::Set(id) = row.id else {
            panic!("id not set");
        };
        assert!(DocumentId::parse(&id).is_ok());
        assert_eq!(row.created_at, ActiveValue::Set(stamp));
        assert_eq!(row.quantity, ActiveValue::Set(0));
    }

    #[test]
    fn user_fixture_hashes_password() {
        let fixture: UserFixture = serde_json::from_value(serde_json::json!({
            "email": "clerk@example.com",
            "password": "plain-text",
            "role": "employee"
        }))
        .unwrap();
        let row = fixture.prepare(now()).unwrap();

        let ActiveValue::Set(hash) = row.password_hash else {
            panic!("hash not set");
        };
        assert_ne!(hash, "plain-text");
        assert!(crate::services::auth_service::verify_password("plain-text", &hash).unwrap());
        assert_eq!(row.is_active, ActiveValue::Set(true));
    }

    #[test]
    fn review_fixture_rejects_out_of_range_rating() {
        let fixture: ReviewFixture = serde_json::from_value(serde_json::json!({
            "album_id": "65f1c0a2b3c4d5e6f7a8b9c0",
            "user_id": "65f1c0a2b3c4d5e6f7a8b9c1",
            "rating": 9
        }))
        .unwrap();
        assert!(fixture.prepare(now()).is_err());
    }

    #[test]
    fn order_fixture_totals_its_lines() {
        let fixture: OrderFixture = serde_json::from_value(serde_json::json!({
            "user_id": "65f1c0a2b3c4d5e6f7a8b9c1",
            "items": [
                { "album_id": "65f1c0a2b3c4d5e6f7a8b9c0", "quantity": 2, "price": 1250 }
            ]
        }))
        .unwrap();
        let row = fixture.prepare(now()).unwrap();
        assert_eq!(row.total, ActiveValue::Set(2500));
        assert_eq!(row.status, ActiveValue::Set("pending".to_string()));
    }

    #[test]
    fn rejected_batch_is_reported_as_skipped() {
        let err = AppError::OrmError(sea_orm::DbErr::Custom(
            "duplicate key value violates unique constraint \"users_email_key\"".into(),
        ));
        let report = skipped(Collection::Users, store_failure(&err));

        assert_eq!(report.collection, "users");
        assert_eq!(report.inserted, None);
        let reason = report.skipped.unwrap();
        assert!(reason.starts_with("store rejected the batch"));
        assert!(reason.contains("users_email_key"));

        let reason = store_failure(&AppError::Timeout);
        assert!(reason.ends_with("Store call timed out"));
    }

    #[tokio::test]
    async fn missing_file_is_a_skip_reason() {
        let path = std::env::temp_dir().join("music-store-no-such-fixture.json");
        let result = read_fixtures::<AlbumFixture>(&path, now()).await;
        assert!(result.unwrap_err().starts_with("cannot read"));
    }

    #[tokio::test]
    async fn undecodable_file_is_a_skip_reason() {
        let path = std::env::temp_dir().join(format!("music-store-{}.json", DocumentId::generate()));
        tokio::fs::write(&path, b"{ not json").await.unwrap();
        let result = read_fixtures::<AlbumFixture>(&path, now()).await;
        tokio::fs::remove_file(&path).await.ok();
        assert!(result.unwrap_err().starts_with("cannot decode"));
    }
}
