//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::{LinkPatch, LinkRecord, Platform};
use crate::domain::reconcile::{
    LinkChangeSet, LinkMove, LinkUnitOfWork, ReconcileOutcome, apply_changes,
};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::id_generator::generate_link_id;

/// Row shape shared by every query returning a link.
#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: String,
    owner_id: String,
    platform: String,
    url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for LinkRecord {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let platform: Platform = row.platform.parse().map_err(|_| {
            AppError::internal(
                "Stored link has an unknown platform",
                json!({ "id": row.id, "platform": row.platform }),
            )
        })?;

        Ok(LinkRecord::new(
            row.id,
            row.owner_id,
            platform,
            row.url,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL repository for profile links.
///
/// Every write goes through a transaction. `(owner_id, platform)` is enforced
/// by the `profile_links_owner_platform_key` unique constraint, so concurrent
/// requests for the same owner resolve to last-write-wins per platform.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<PgUnitOfWork, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }
}

/// A unit of work backed by one PostgreSQL transaction.
///
/// Dropping it without [`PgUnitOfWork::commit`] rolls the transaction back.
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl LinkUnitOfWork for PgUnitOfWork {
    async fn delete_owned(&mut self, ids: &[String], owner_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM profile_links
            WHERE owner_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(owner_id)
        .bind(ids)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_owned(
        &mut self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<LinkRecord>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, owner_id, platform, url, created_at, updated_at
            FROM profile_links
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(LinkRecord::try_from).transpose()
    }

    async fn find_by_platform(
        &mut self,
        owner_id: &str,
        platform: Platform,
    ) -> Result<Option<LinkRecord>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, owner_id, platform, url, created_at, updated_at
            FROM profile_links
            WHERE owner_id = $1 AND platform = $2
            FOR UPDATE
            "#,
        )
        .bind(owner_id)
        .bind(platform.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(LinkRecord::try_from).transpose()
    }

    async fn upsert_by_platform(
        &mut self,
        owner_id: &str,
        platform: Platform,
        url: &str,
    ) -> Result<LinkRecord, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            INSERT INTO profile_links (id, owner_id, platform, url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner_id, platform) DO UPDATE
            SET url = EXCLUDED.url,
                updated_at = CASE
                    WHEN profile_links.url = EXCLUDED.url THEN profile_links.updated_at
                    ELSE NOW()
                END
            RETURNING id, owner_id, platform, url, created_at, updated_at
            "#,
        )
        .bind(generate_link_id())
        .bind(owner_id)
        .bind(platform.as_str())
        .bind(url)
        .fetch_one(&mut *self.tx)
        .await?;

        LinkRecord::try_from(row)
    }

    async fn patch(&mut self, id: &str, patch: &LinkPatch) -> Result<LinkRecord, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            UPDATE profile_links
            SET platform = COALESCE($2, platform),
                url = COALESCE($3, url),
                updated_at = CASE
                    WHEN platform IS DISTINCT FROM COALESCE($2, platform)
                      OR url IS DISTINCT FROM COALESCE($3, url) THEN NOW()
                    ELSE updated_at
                END
            WHERE id = $1
            RETURNING id, owner_id, platform, url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.platform.map(|p| p.as_str()))
        .bind(patch.url.as_deref())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?
            .try_into()
    }

    async fn relocate(&mut self, owner_id: &str, moves: &[LinkMove]) -> Result<(), AppError> {
        let ids: Vec<String> = moves.iter().map(|m| m.id.clone()).collect();

        // The unique key is checked per row, so moving rows leave the table
        // together and come back on their new platforms.
        let index_rows = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            r#"
            SELECT owner_id, link_id, added_at
            FROM owner_links
            WHERE link_id = ANY($1)
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&mut *self.tx)
        .await?;

        let detached = sqlx::query_as::<_, (String, DateTime<Utc>, i64)>(
            r#"
            DELETE FROM profile_links
            WHERE owner_id = $1 AND id = ANY($2)
            RETURNING id, created_at, seq
            "#,
        )
        .bind(owner_id)
        .bind(ids.as_slice())
        .fetch_all(&mut *self.tx)
        .await?;

        for link_move in moves {
            let (_, created_at, seq) = detached
                .iter()
                .find(|(id, _, _)| *id == link_move.id)
                .ok_or_else(|| {
                    AppError::not_found("Link not found", json!({ "id": link_move.id }))
                })?;

            sqlx::query(
                r#"
                INSERT INTO profile_links (id, owner_id, platform, url, created_at, updated_at, seq)
                VALUES ($1, $2, $3, $4, $5, NOW(), $6)
                "#,
            )
            .bind(&link_move.id)
            .bind(owner_id)
            .bind(link_move.platform.as_str())
            .bind(&link_move.url)
            .bind(*created_at)
            .bind(*seq)
            .execute(&mut *self.tx)
            .await?;
        }

        for (index_owner, link_id, added_at) in index_rows {
            sqlx::query(
                r#"
                INSERT INTO owner_links (owner_id, link_id, added_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (owner_id, link_id) DO NOTHING
                "#,
            )
            .bind(index_owner)
            .bind(link_id)
            .bind(added_at)
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    async fn index_link(&mut self, owner_id: &str, link_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO owner_links (owner_id, link_id)
            VALUES ($1, $2)
            ON CONFLICT (owner_id, link_id) DO NOTHING
            "#,
        )
        .bind(owner_id)
        .bind(link_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<LinkRecord>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, owner_id, platform, url, created_at, updated_at
            FROM profile_links
            WHERE owner_id = $1
            ORDER BY seq
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(LinkRecord::try_from).collect()
    }

    async fn delete_where(&self, ids: &[String], owner_id: &str) -> Result<u64, AppError> {
        let mut uow = self.begin().await?;
        let deleted = uow.delete_owned(ids, owner_id).await?;
        uow.commit().await?;
        Ok(deleted)
    }

    async fn upsert_by_owner_platform(
        &self,
        owner_id: &str,
        platform: Platform,
        url: &str,
    ) -> Result<LinkRecord, AppError> {
        let mut uow = self.begin().await?;
        let record = uow.upsert_by_platform(owner_id, platform, url).await?;
        uow.index_link(owner_id, &record.id).await?;
        uow.commit().await?;
        Ok(record)
    }

    async fn owner_index(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT link_id
            FROM owner_links
            WHERE owner_id = $1
            ORDER BY added_at, link_id
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(ids)
    }

    async fn reconcile(
        &self,
        owner_id: &str,
        changes: &LinkChangeSet,
    ) -> Result<ReconcileOutcome, AppError> {
        let mut uow = self.begin().await?;
        let outcome = apply_changes(&mut uow, owner_id, changes).await?;
        uow.commit().await?;
        Ok(outcome)
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok()
    }
}
