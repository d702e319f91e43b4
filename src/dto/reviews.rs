use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DocumentId, Review};

/// Body of both review create and review update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub album_id: Option<DocumentId>,
    pub user_id: Option<DocumentId>,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}
