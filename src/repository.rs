//! Single-collection data access over the store.
//!
//! Every call is bounded by the configured timeout and surfaces
//! [`AppError::Timeout`] instead of waiting on a stalled connection. Nothing
//! here retries or spans more than one record's collection.

use std::{future::Future, marker::PhantomData, time::Duration};

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, Iterable, Order, PaginatorTrait, PrimaryKeyToColumn, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use crate::{
    entity::{albums, carts, orders, reviews, users},
    error::{AppError, AppResult},
    models::DocumentId,
};

type EntityOf<A> = <A as ActiveModelTrait>::Entity;
pub type ModelOf<A> = <EntityOf<A> as EntityTrait>::Model;
pub type ColumnOf<A> = <EntityOf<A> as EntityTrait>::Column;

pub type AlbumRepository = Repository<albums::ActiveModel>;
pub type UserRepository = Repository<users::ActiveModel>;
pub type CartRepository = Repository<carts::ActiveModel>;
pub type OrderRepository = Repository<orders::ActiveModel>;
pub type ReviewRepository = Repository<reviews::ActiveModel>;

/// One page of a `find` call together with the unpaged match count.
#[derive(Debug, Clone)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub total: u64,
}

pub struct Repository<A> {
    conn: DatabaseConnection,
    timeout: Duration,
    /// Singular record name used in `not found` errors.
    label: &'static str,
    _record: PhantomData<fn() -> A>,
}

impl<A> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            timeout: self.timeout,
            label: self.label,
            _record: PhantomData,
        }
    }
}

impl<A> Repository<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    ModelOf<A>: IntoActiveModel<A> + Send + Sync,
{
    pub fn new(conn: DatabaseConnection, timeout: Duration, label: &'static str) -> Self {
        Self {
            conn,
            timeout,
            label,
            _record: PhantomData,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    async fn bounded<T, F>(&self, call: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(collection = self.label, timeout_ms = %self.timeout.as_millis(), "store call timed out");
                Err(AppError::Timeout)
            }
        }
    }

    fn id_condition(id: &DocumentId) -> Condition {
        <EntityOf<A> as EntityTrait>::PrimaryKey::iter().fold(Condition::all(), |cond, key| {
            cond.add(key.into_column().eq(id.as_str()))
        })
    }

    /// Filtered, sorted page of records plus the total number of matches.
    pub async fn find(
        &self,
        filter: Condition,
        sort: &[(ColumnOf<A>, Order)],
        skip: u64,
        limit: u64,
    ) -> AppResult<Page<ModelOf<A>>> {
        let mut select = <EntityOf<A> as EntityTrait>::find().filter(filter);
        for (column, order) in sort {
            select = select.order_by(*column, order.clone());
        }

        let total = self.bounded(select.clone().count(&self.conn)).await?;
        let items = self
            .bounded(select.offset(skip).limit(limit).all(&self.conn))
            .await?;

        Ok(Page { items, total })
    }

    pub async fn find_one(&self, filter: Condition) -> AppResult<Option<ModelOf<A>>> {
        self.bounded(
            <EntityOf<A> as EntityTrait>::find()
                .filter(filter)
                .one(&self.conn),
        )
        .await
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> AppResult<ModelOf<A>> {
        self.find_one(Self::id_condition(id))
            .await?
            .ok_or(AppError::NotFound(self.label))
    }

    pub async fn insert(&self, record: A) -> AppResult<ModelOf<A>> {
        self.bounded(record.insert(&self.conn)).await
    }

    /// Inserts the whole batch in one statement and returns how many rows were written.
    pub async fn insert_many(&self, records: Vec<A>) -> AppResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        self.bounded(
            <EntityOf<A> as EntityTrait>::insert_many(records).exec_without_returning(&self.conn),
        )
        .await
    }

    /// Applies the fields set on `partial`. Returns whether a record matched.
    pub async fn update_by_id(&self, id: &DocumentId, partial: A) -> AppResult<bool> {
        let result = self
            .bounded(
                <EntityOf<A> as EntityTrait>::update_many()
                    .set(partial)
                    .filter(Self::id_condition(id))
                    .exec(&self.conn),
            )
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_by_id(&self, id: &DocumentId) -> AppResult<bool> {
        let result = self
            .bounded(
                <EntityOf<A> as EntityTrait>::delete_many()
                    .filter(Self::id_condition(id))
                    .exec(&self.conn),
            )
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Empties the collection and inserts `records` in one transaction.
    /// Returns `(removed, inserted)`. On failure the previous rows remain.
    pub async fn replace_all(&self, records: Vec<A>) -> AppResult<(u64, u64)> {
        self.bounded(async move {
            let txn = self.conn.begin().await?;
            let removed = <EntityOf<A> as EntityTrait>::delete_many()
                .exec(&txn)
                .await?
                .rows_affected;
            let inserted = if records.is_empty() {
                0
            } else {
                <EntityOf<A> as EntityTrait>::insert_many(records)
                    .exec_without_returning(&txn)
                    .await?
            };
            txn.commit().await?;
            Ok((removed, inserted))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::*;

    fn repository(timeout: Duration) -> AlbumRepository {
        Repository::new(DatabaseConnection::default(), timeout, "album")
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_call_times_out() {
        let albums = repository(Duration::from_secs(3));
        let result: AppResult<u64> = albums
            .bounded(std::future::pending::<Result<u64, DbErr>>())
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Timeout));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_store_call_passes_through() {
        let albums = repository(Duration::from_secs(3));
        let ok: AppResult<u64> = albums.bounded(async { Ok::<_, DbErr>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let failed: AppResult<u64> = albums
            .bounded(async { Err::<u64, _>(DbErr::Custom("boom".into())) })
            .await;
        assert!(matches!(failed.unwrap_err(), AppError::OrmError(_)));
    }
}
