use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, Condition, Order,
};

use crate::{
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    entity::users::{ActiveModel, Column, Model as UserModel},
    error::{AppError, AppResult},
    models::{DocumentId, Role, User},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::hash_password,
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email is already taken";

fn parse_role(raw: &str) -> AppResult<Role> {
    raw.parse::<Role>().map_err(AppError::BadRequest)
}

async fn ensure_email_free(
    state: &AppState,
    email: &str,
    except: Option<&DocumentId>,
) -> AppResult<()> {
    let mut filter = Condition::all().add(Column::Email.eq(email));
    if let Some(id) = except {
        filter = filter.add(Column::Id.ne(id.as_str()));
    }
    if state.users.find_one(filter).await?.is_some() {
        return Err(AppError::BadRequest(EMAIL_TAKEN.to_string()));
    }
    Ok(())
}

pub async fn list_users(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, skip) = pagination.normalize();
    let found = state
        .users
        .find(Condition::all(), &[(Column::CreatedAt, Order::Desc)], skip, limit)
        .await?;
    let items = found
        .items
        .into_iter()
        .map(user_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, found.total)),
    ))
}

pub async fn get_user(state: &AppState, id: &DocumentId) -> AppResult<ApiResponse<User>> {
    let user = state.users.find_by_id(id).await?;
    Ok(ApiResponse::success("User", user_from_entity(user)?, None))
}

pub async fn create_user(
    state: &AppState,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let email = payload.email.trim().to_string();
    ensure_email_free(state, &email, None).await?;

    let role = match payload.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::Customer,
    };
    let now = Utc::now().fixed_offset();
    let record = ActiveModel {
        id: Set(DocumentId::generate().into()),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        email: Set(email),
        phone_number: Set(payload.phone_number),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(role.as_str().to_string()),
        is_active: Set(payload.is_active.unwrap_or(true)),
        shipping_details: Set(payload.shipping_details),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let user = state
        .users
        .insert(record)
        .await
        .map_err(|err| err.on_unique_violation(EMAIL_TAKEN))?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    id: &DocumentId,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let email = payload.email.map(|e| e.trim().to_string());
    if let Some(email) = &email {
        ensure_email_free(state, email, Some(id)).await?;
    }
    let role = payload.role.as_deref().map(parse_role).transpose()?;
    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let partial = ActiveModel {
        id: NotSet,
        first_name: payload.first_name.map(Set).unwrap_or(NotSet),
        last_name: payload.last_name.map(Set).unwrap_or(NotSet),
        email: email.map(Set).unwrap_or(NotSet),
        phone_number: payload.phone_number.map(|p| Set(Some(p))).unwrap_or(NotSet),
        password_hash: password_hash.map(Set).unwrap_or(NotSet),
        role: role.map(|r| Set(r.as_str().to_string())).unwrap_or(NotSet),
        is_active: payload.is_active.map(Set).unwrap_or(NotSet),
        shipping_details: payload
            .shipping_details
            .map(|s| Set(Some(s)))
            .unwrap_or(NotSet),
        created_at: NotSet,
        updated_at: Set(Utc::now().fixed_offset()),
    };
    let matched = state
        .users
        .update_by_id(id, partial)
        .await
        .map_err(|err| err.on_unique_violation(EMAIL_TAKEN))?;
    if !matched {
        return Err(AppError::NotFound(state.users.label()));
    }
    let user = state.users.find_by_id(id).await?;

    Ok(ApiResponse::success(
        "Updated",
        user_from_entity(user)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    id: &DocumentId,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if !state.users.delete_by_id(id).await? {
        return Err(AppError::NotFound(state.users.label()));
    }
    tracing::info!(user_id = %id, "user deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// The password hash never leaves this module.
fn user_from_entity(model: UserModel) -> AppResult<User> {
    let role = model
        .role
        .parse::<Role>()
        .map_err(|err| AppError::Internal(anyhow::anyhow!(err)))?;
    Ok(User {
        id: DocumentId::from_stored(model.id),
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone_number: model.phone_number,
        role,
        is_active: model.is_active,
        shipping_details: model.shipping_details,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
