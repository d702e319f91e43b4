use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Album;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAlbumRequest {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub genre: String,
    /// Price in cents.
    pub price: i64,
    #[serde(default)]
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAlbumRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkInsertResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlbumList {
    pub items: Vec<Album>,
}
