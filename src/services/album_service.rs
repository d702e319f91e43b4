use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    Condition, Order,
    sea_query::{Expr, SimpleExpr, extension::postgres::PgExpr},
};

use crate::{
    dto::albums::{AlbumList, BulkInsertResponse, CreateAlbumRequest, UpdateAlbumRequest},
    entity::albums::{ActiveModel, Column, Model as AlbumModel},
    error::{AppError, AppResult},
    models::{Album, DocumentId},
    response::{ApiResponse, Meta},
    routes::params::AlbumQuery,
    state::AppState,
};

/// Parses `sort=title,-price` into column orderings. Unknown fields are rejected.
pub fn parse_sort(raw: &str) -> AppResult<Vec<(Column, Order)>> {
    let mut sort = Vec::new();
    for field in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let (name, order) = match field.strip_prefix('-') {
            Some(name) => (name, Order::Desc),
            None => (field, Order::Asc),
        };
        let column = match name {
            "title" => Column::Title,
            "artist" => Column::Artist,
            "genre" => Column::Genre,
            "price" => Column::Price,
            "quantity" => Column::Quantity,
            "created_at" => Column::CreatedAt,
            other => {
                return Err(AppError::BadRequest(format!(
                    "cannot sort albums by `{other}`"
                )));
            }
        };
        sort.push((column, order));
    }
    Ok(sort)
}

/// Escapes LIKE wildcards so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn contains(column: Column, needle: &str) -> SimpleExpr {
    Expr::col(column).ilike(format!("%{}%", escape_like(needle)))
}

pub async fn list_albums(state: &AppState, query: AlbumQuery) -> AppResult<ApiResponse<AlbumList>> {
    let (page, limit, skip) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(artist) = query.artist.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(contains(Column::Artist, artist));
    }
    if let Some(genre) = query.genre.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(contains(Column::Genre, genre));
    }

    let mut sort = match query.sort.as_deref() {
        Some(raw) => parse_sort(raw)?,
        None => Vec::new(),
    };
    if sort.is_empty() {
        sort.push((Column::CreatedAt, Order::Desc));
    }

    let found = state.albums.find(condition, &sort, skip, limit).await?;
    let items = found.items.into_iter().map(album_from_entity).collect();

    Ok(ApiResponse::success(
        "Albums",
        AlbumList { items },
        Some(Meta::new(page, limit, found.total)),
    ))
}

pub async fn get_album(state: &AppState, id: &DocumentId) -> AppResult<ApiResponse<Album>> {
    let album = state.albums.find_by_id(id).await?;
    Ok(ApiResponse::success("Album", album_from_entity(album), None))
}

fn new_album(payload: CreateAlbumRequest) -> ActiveModel {
    let now = Utc::now().fixed_offset();
    ActiveModel {
        id: Set(DocumentId::generate().into()),
        title: Set(payload.title.trim().to_string()),
        artist: Set(payload.artist.trim().to_string()),
        genre: Set(payload.genre),
        price: Set(payload.price),
        quantity: Set(payload.quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

pub async fn create_album(
    state: &AppState,
    payload: CreateAlbumRequest,
) -> AppResult<ApiResponse<Album>> {
    let album = state.albums.insert(new_album(payload)).await?;
    tracing::info!(album_id = %album.id, "album created");

    Ok(ApiResponse::success(
        "Album created",
        album_from_entity(album),
        Some(Meta::empty()),
    ))
}

pub async fn create_albums(
    state: &AppState,
    payload: Vec<CreateAlbumRequest>,
) -> AppResult<ApiResponse<BulkInsertResponse>> {
    let records = payload.into_iter().map(new_album).collect();
    let count = state.albums.insert_many(records).await?;
    tracing::info!(count, "albums bulk inserted");

    Ok(ApiResponse::success(
        "Albums created",
        BulkInsertResponse { count },
        Some(Meta::empty()),
    ))
}

pub async fn update_album(
    state: &AppState,
    id: &DocumentId,
    payload: UpdateAlbumRequest,
) -> AppResult<ApiResponse<Album>> {
    let partial = ActiveModel {
        id: NotSet,
        title: payload.title.map(|t| Set(t.trim().to_string())).unwrap_or(NotSet),
        artist: payload.artist.map(|a| Set(a.trim().to_string())).unwrap_or(NotSet),
        genre: payload.genre.map(Set).unwrap_or(NotSet),
        price: payload.price.map(Set).unwrap_or(NotSet),
        quantity: payload.quantity.map(Set).unwrap_or(NotSet),
        created_at: NotSet,
        updated_at: Set(Utc::now().fixed_offset()),
    };

    if !state.albums.update_by_id(id, partial).await? {
        return Err(AppError::NotFound(state.albums.label()));
    }
    let album = state.albums.find_by_id(id).await?;

    Ok(ApiResponse::success(
        "Updated",
        album_from_entity(album),
        Some(Meta::empty()),
    ))
}

pub async fn delete_album(
    state: &AppState,
    id: &DocumentId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !state.albums.delete_by_id(id).await? {
        return Err(AppError::NotFound(state.albums.label()));
    }
    tracing::info!(album_id = %id, "album deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn album_from_entity(model: AlbumModel) -> Album {
    Album {
        id: DocumentId::from_stored(model.id),
        title: model.title,
        artist: model.artist,
        genre: model.genre,
        price: model.price,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_matched_literally() {
        assert_eq!(escape_like("Miles Davis"), "Miles Davis");
        assert_eq!(escape_like("%"), "\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    #[test]
    fn sort_accepts_known_fields_in_order() {
        let sort = parse_sort("artist,-price").unwrap();
        assert_eq!(sort.len(), 2);
        assert!(matches!(sort[0], (Column::Artist, Order::Asc)));
        assert!(matches!(sort[1], (Column::Price, Order::Desc)));
    }

    #[test]
    fn sort_rejects_unknown_fields() {
        let err = parse_sort("title,password").unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn empty_sort_is_empty() {
        assert!(parse_sort(" , ").unwrap().is_empty());
    }
}
