use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: Option<u64>,
    /// Page size, 1..=100, default 10.
    pub limit: Option<u64>,
}

impl Pagination {
    /// Returns `(page, limit, skip)`.
    pub fn normalize(&self) -> (u64, u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let skip = (page - 1).saturating_mul(limit);
        (page, limit, skip)
    }
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlbumQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Case-insensitive substring match.
    pub artist: Option<String>,
    /// Case-insensitive substring match.
    pub genre: Option<String>,
    /// Comma separated fields, `-` prefix for descending, e.g. `artist,-price`.
    pub sort: Option<String>,
}

impl AlbumQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, DEFAULT_LIMIT, 0));

        let p = Pagination {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(p.normalize(), (3, MAX_LIMIT, 200));

        let p = Pagination {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(p.normalize(), (1, 1, 0));
    }
}
