use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection: String,
    /// Records written, when the collection was reloaded.
    pub inserted: Option<u64>,
    /// Why the collection was left untouched.
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoadReport {
    pub collections: Vec<CollectionReport>,
}
