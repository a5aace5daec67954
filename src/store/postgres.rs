//! PostgreSQL implementation of [`AccessStore`].
//!
//! # Atomicity Guarantees
//!
//! Validation runs inside one PostgreSQL transaction. The code's row is
//! locked with `FOR UPDATE` before the decision is made, so a second gate
//! scan of the same code waits until the first has written its new usage
//! count and audit entry. Different codes never block each other.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{AccessStore, CodeSnapshot, Settlement};
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::access_code::{AccessCode, AccessCodeRow, NewAccessCode};
use crate::models::access_log::{AccessLog, AccessLogRow};

const CODE_COLUMNS: &str = "id, code, resident_id, resident_name, visitor_label, event_label, \
     event_id, code_class, valid_from, valid_until, is_multi_use, allow_exit, \
     max_usage_limit, usage_count, is_active, created_at, updated_at";

/// Access code row joined with the owner's current unit number.
#[derive(Debug, FromRow)]
struct SnapshotRow {
    #[sqlx(flatten)]
    code: AccessCodeRow,
    unit_number: Option<String>,
}

#[derive(Clone)]
pub struct PgAccessStore {
    pool: DbPool,
}

impl PgAccessStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_codes(rows: Vec<AccessCodeRow>) -> Result<Vec<AccessCode>, AppError> {
    rows.into_iter().map(AccessCode::try_from).collect()
}

impl AccessStore for PgAccessStore {
    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM access_codes WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn insert_code(&self, new: NewAccessCode) -> Result<AccessCode, AppError> {
        let result = sqlx::query_as::<_, AccessCodeRow>(&format!(
            r#"
            INSERT INTO access_codes (
                code,
                resident_id,
                resident_name,
                visitor_label,
                event_label,
                event_id,
                code_class,
                valid_from,
                valid_until,
                is_multi_use,
                allow_exit,
                max_usage_limit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {CODE_COLUMNS}
            "#
        ))
        .bind(&new.code)
        .bind(new.resident_id)
        .bind(&new.resident_name)
        .bind(&new.visitor_label)
        .bind(&new.event_label)
        .bind(new.event_id)
        .bind(new.code_class.as_str())
        .bind(new.valid_from)
        .bind(new.valid_until)
        .bind(new.is_multi_use)
        .bind(new.allow_exit)
        .bind(new.max_usage_limit)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => AccessCode::try_from(row),
            // Unique violation on `code`: the caller resamples
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::CodeConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_event_parent(&self, event_id: Uuid) -> Result<Option<AccessCode>, AppError> {
        let row = sqlx::query_as::<_, AccessCodeRow>(&format!(
            r#"
            SELECT {CODE_COLUMNS}
            FROM access_codes
            WHERE event_id = $1 AND code_class = 'group'
            ORDER BY created_at
            LIMIT 1
            "#
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccessCode::try_from).transpose()
    }

    async fn event_codes(&self, event_id: Uuid) -> Result<Vec<AccessCode>, AppError> {
        let rows = sqlx::query_as::<_, AccessCodeRow>(&format!(
            "SELECT {CODE_COLUMNS} FROM access_codes WHERE event_id = $1 ORDER BY created_at"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        into_codes(rows)
    }

    async fn expire_resident_codes(
        &self,
        resident_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let retired = sqlx::query(
            r#"
            UPDATE access_codes
            SET is_active = false,
                updated_at = NOW()
            WHERE resident_id = $1
              AND is_active = true
              AND valid_until < $2
            "#,
        )
        .bind(resident_id)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(retired)
    }

    async fn resident_codes(&self, resident_id: Uuid) -> Result<Vec<AccessCode>, AppError> {
        let rows = sqlx::query_as::<_, AccessCodeRow>(&format!(
            r#"
            SELECT {CODE_COLUMNS}
            FROM access_codes
            WHERE resident_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(resident_id)
        .fetch_all(&self.pool)
        .await?;

        into_codes(rows)
    }

    async fn settle_validation<F, T>(&self, code: &str, decide: F) -> Result<T, AppError>
    where
        F: FnOnce(Option<&CodeSnapshot>) -> Settlement<T> + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;

        // Lock the code's row; concurrent validations of this code queue here
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT c.id, c.code, c.resident_id, c.resident_name, c.visitor_label,
                   c.event_label, c.event_id, c.code_class, c.valid_from, c.valid_until,
                   c.is_multi_use, c.allow_exit, c.max_usage_limit, c.usage_count,
                   c.is_active, c.created_at, c.updated_at,
                   u.unit_number
            FROM access_codes c
            LEFT JOIN users u ON u.id = c.resident_id
            WHERE c.code = $1
            FOR UPDATE OF c
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let snapshot = match row {
            Some(row) => Some(CodeSnapshot {
                code: AccessCode::try_from(row.code)?,
                unit_number: row.unit_number,
            }),
            None => None,
        };

        let settlement = decide(snapshot.as_ref());

        if let (Some(change), Some(locked)) = (settlement.change, snapshot.as_ref()) {
            sqlx::query(
                r#"
                UPDATE access_codes
                SET usage_count = $1,
                    is_active = $2,
                    updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(change.usage_count)
            .bind(change.is_active)
            .bind(locked.code.id)
            .execute(&mut *tx)
            .await?;
        }

        let log = settlement.log;
        sqlx::query(
            r#"
            INSERT INTO access_logs (
                code_id,
                code,
                visitor_name,
                resident_name,
                unit_number,
                direction,
                validated_by,
                status,
                usage_count,
                timestamp
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(log.code_id)
        .bind(&log.code)
        .bind(&log.visitor_name)
        .bind(&log.resident_name)
        .bind(&log.unit_number)
        .bind(log.direction.as_str())
        .bind(&log.validated_by)
        .bind(log.status.as_str())
        .bind(log.usage_count)
        .bind(log.timestamp)
        .execute(&mut *tx)
        .await?;

        // Commit state change and audit entry together
        tx.commit().await?;

        Ok(settlement.value)
    }

    async fn recent_logs(&self, limit: i64) -> Result<Vec<AccessLog>, AppError> {
        let rows = sqlx::query_as::<_, AccessLogRow>(
            r#"
            SELECT id, code_id, code, visitor_name, resident_name, unit_number,
                   direction, validated_by, status, usage_count, timestamp
            FROM access_logs
            ORDER BY timestamp DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccessLog::try_from).collect()
    }
}
