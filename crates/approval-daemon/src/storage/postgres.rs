//! PostgreSQL storage implementation

use approval_engine::{ApprovalStore, RoleDirectory, Storage, StoreError, StoreResult};
use approval_types::{
    ApprovalRecord, ApprovalStatus, Article, ArticleId, Gate, RoleAssignment, TrackedArticle,
    UserId,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::collections::BTreeMap;
use std::time::Duration;

/// PostgreSQL-backed storage
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect to PostgreSQL and initialize schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;
        Ok(storage)
    }

    async fn initialize_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS approval_articles (
                article_id UUID PRIMARY KEY,
                status TEXT NOT NULL,
                version BIGINT NOT NULL,
                article JSONB NOT NULL,
                record JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS approval_articles_status ON approval_articles(status);"#,
            r#"
            CREATE TABLE IF NOT EXISTS approval_roles (
                user_id UUID PRIMARY KEY,
                role TEXT NOT NULL,
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        }

        Ok(())
    }

    fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, StoreError> {
        serde_json::to_value(value)
            .map_err(|e| StoreError::InvalidData(format!("json serialize error: {}", e)))
    }

    fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StoreError> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::InvalidData(format!("json deserialize error: {}", e)))
    }

    /// Stored status strings matching `list_pending(gate)`
    fn pending_statuses(gate: Option<Gate>) -> Vec<String> {
        let gates = match gate {
            Some(gate) => vec![gate],
            None => Gate::ALL.to_vec(),
        };
        gates
            .into_iter()
            .map(|gate| ApprovalStatus::Pending(gate).to_string())
            .collect()
    }

    fn to_version(version: u64) -> Result<i64, StoreError> {
        i64::try_from(version)
            .map_err(|_| StoreError::InvalidData(format!("version {} out of range", version)))
    }

    fn tracked_from_row(row: &sqlx::postgres::PgRow) -> StoreResult<TrackedArticle> {
        let article: Value = row.try_get("article").map_err(map_sqlx)?;
        let record: Value = row.try_get("record").map_err(map_sqlx)?;
        Ok(TrackedArticle {
            article: Self::from_json::<Article>(article)?,
            record: Self::from_json::<ApprovalRecord>(record)?,
        })
    }
}

/// Pool and transport failures mean the database is unreachable; everything
/// else is a query problem.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Connection(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl ApprovalStore for PostgresStorage {
    async fn insert(&self, tracked: TrackedArticle) -> StoreResult<()> {
        let article = Self::to_json(&tracked.article)?;
        let record = Self::to_json(&tracked.record)?;

        let result = sqlx::query(
            r#"
            INSERT INTO approval_articles
                (article_id, status, version, article, record, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (article_id) DO NOTHING
            "#,
        )
        .bind(*tracked.id().as_uuid())
        .bind(tracked.record.status.to_string())
        .bind(Self::to_version(tracked.record.version)?)
        .bind(article)
        .bind(record)
        .bind(tracked.record.created_at)
        .bind(tracked.record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!("article {}", tracked.id())));
        }
        Ok(())
    }

    async fn get(&self, id: &ArticleId) -> StoreResult<Option<TrackedArticle>> {
        let row = sqlx::query("SELECT article, record FROM approval_articles WHERE article_id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.as_ref().map(Self::tracked_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<TrackedArticle>> {
        let rows = sqlx::query("SELECT article, record FROM approval_articles ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(Self::tracked_from_row).collect()
    }

    async fn list_pending(&self, gate: Option<Gate>) -> StoreResult<Vec<TrackedArticle>> {
        let statuses = Self::pending_statuses(gate);
        let rows = sqlx::query(
            r#"
            SELECT article, record FROM approval_articles
            WHERE status = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.iter().map(Self::tracked_from_row).collect()
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: ApprovalRecord,
    ) -> StoreResult<()> {
        let data = Self::to_json(&record)?;

        let result = sqlx::query(
            r#"
            UPDATE approval_articles
            SET status = $3, version = $4, record = $5, updated_at = $6
            WHERE article_id = $1 AND version = $2
            "#,
        )
        .bind(*record.article_id.as_uuid())
        .bind(Self::to_version(expected_version)?)
        .bind(record.status.to_string())
        .bind(Self::to_version(record.version)?)
        .bind(data)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing matched: tell a missing row apart from a lost race.
        let current = sqlx::query("SELECT version FROM approval_articles WHERE article_id = $1")
            .bind(*record.article_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        match current {
            Some(row) => {
                let actual: i64 = row.try_get("version").map_err(map_sqlx)?;
                Err(StoreError::VersionMismatch {
                    expected: expected_version,
                    actual: actual.max(0) as u64,
                })
            }
            None => Err(StoreError::NotFound(format!("article {}", record.article_id))),
        }
    }

    async fn count_by_status(&self) -> StoreResult<BTreeMap<ApprovalStatus, u64>> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS total FROM approval_articles GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let status: String = row.try_get("status").map_err(map_sqlx)?;
            let total: i64 = row.try_get("total").map_err(map_sqlx)?;
            let status = status
                .parse::<ApprovalStatus>()
                .map_err(|e| StoreError::InvalidData(e.to_string()))?;
            counts.insert(status, total.max(0) as u64);
        }
        Ok(counts)
    }
}

#[async_trait]
impl RoleDirectory for PostgresStorage {
    async fn get_role(&self, user_id: &UserId) -> StoreResult<Option<RoleAssignment>> {
        let row = sqlx::query("SELECT data FROM approval_roles WHERE user_id = $1")
            .bind(*user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        match row {
            Some(record) => {
                let data: Value = record.try_get("data").map_err(map_sqlx)?;
                Ok(Some(Self::from_json(data)?))
            }
            None => Ok(None),
        }
    }

    async fn set_role(&self, assignment: RoleAssignment) -> StoreResult<()> {
        let data = Self::to_json(&assignment)?;

        sqlx::query(
            r#"
            INSERT INTO approval_roles (user_id, role, data, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id)
            DO UPDATE SET
                role = EXCLUDED.role,
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(*assignment.user_id.as_uuid())
        .bind(assignment.role.as_str())
        .bind(data)
        .bind(assignment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}

impl Storage for PostgresStorage {}
