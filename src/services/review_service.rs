use chrono::Utc;
use sea_orm::{ActiveValue::Set, ColumnTrait, Condition, Order};

use crate::{
    dto::reviews::{ReviewList, ReviewRequest},
    entity::reviews::{ActiveModel, Column, Model as ReviewModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_staff},
    models::{DocumentId, Review},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_reviews(
    state: &AppState,
    filter: Condition,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, skip) = pagination.normalize();
    let found = state
        .reviews
        .find(filter, &[(Column::CreatedAt, Order::Desc)], skip, limit)
        .await?;
    let items = found.items.into_iter().map(review_from_entity).collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, found.total)),
    ))
}

pub fn by_album(album_id: &DocumentId) -> Condition {
    Condition::all().add(Column::AlbumId.eq(album_id.as_str()))
}

pub fn by_user(user_id: &DocumentId) -> Condition {
    Condition::all().add(Column::UserId.eq(user_id.as_str()))
}

pub async fn get_review(state: &AppState, id: &DocumentId) -> AppResult<ApiResponse<Review>> {
    let review = state.reviews.find_by_id(id).await?;
    Ok(ApiResponse::success("Review", review_from_entity(review), None))
}

/// Validated references out of a review body.
fn references(payload: &ReviewRequest) -> AppResult<(DocumentId, DocumentId)> {
    match (&payload.album_id, &payload.user_id) {
        (Some(album_id), Some(user_id)) => Ok((album_id.clone(), user_id.clone())),
        _ => Err(AppError::BadRequest(
            "album_id and user_id are required".into(),
        )),
    }
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let (album_id, author) = references(&payload)?;
    ensure_owner_or_staff(user, &author)?;

    let record = ActiveModel {
        id: Set(DocumentId::generate().into()),
        album_id: Set(album_id.into()),
        user_id: Set(author.into()),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: Set(Utc::now().fixed_offset()),
    };
    let review = state.reviews.insert(record).await?;
    tracing::info!(review_id = %review.id, album_id = %review.album_id, rating = review.rating, "review created");

    Ok(ApiResponse::success(
        "Review created",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: &DocumentId,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let existing = state.reviews.find_by_id(id).await?;
    ensure_owner_or_staff(user, &DocumentId::from_stored(existing.user_id))?;

    let (album_id, author) = references(&payload)?;
    ensure_owner_or_staff(user, &author)?;

    let partial = ActiveModel {
        album_id: Set(album_id.into()),
        user_id: Set(author.into()),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        ..Default::default()
    };
    if !state.reviews.update_by_id(id, partial).await? {
        return Err(AppError::NotFound(state.reviews.label()));
    }
    let review = state.reviews.find_by_id(id).await?;

    Ok(ApiResponse::success(
        "Updated",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    state: &AppState,
    id: &DocumentId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !state.reviews.delete_by_id(id).await? {
        return Err(AppError::NotFound(state.reviews.label()));
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: DocumentId::from_stored(model.id),
        album_id: DocumentId::from_stored(model.album_id),
        user_id: DocumentId::from_stored(model.user_id),
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
