use super::mappers::{position_i32, record_etag, result_etag, ResultRow};
use super::ResultsDb;
use crate::convert::to_storage;
use crate::error::{Result, ResultsError};
use crate::name::{format_record_name, format_result_name, parse_result_name};
use crate::types::{Execution, Record, RunResult};
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;

impl ResultsDb {
    /// # Errors
    /// Returns `ResultsError::DatabaseError` when the script fails.
    pub async fn initialize_schema_from_sql(&self, schema_sql: &str) -> Result<()> {
        sqlx::raw_sql(schema_sql)
            .execute(self.pool())
            .await
            .map(|_result| ())
            .map_err(|e| ResultsError::DatabaseError(format!("Failed to initialize schema: {e}")))
    }

    /// # Errors
    /// Returns `ResultsError::DatabaseError` when the script fails.
    pub async fn initialize_schema(&self) -> Result<()> {
        self.initialize_schema_from_sql(super::SCHEMA_SQL).await
    }

    /// Stores `result` under `parent` with a fresh v4 id. Each execution
    /// becomes one record, in order.
    pub(crate) async fn insert_result(&self, parent: &str, result: &RunResult) -> Result<RunResult> {
        let id = Uuid::new_v4().to_string();
        let name = format_result_name(parent, &id);
        parse_result_name(&name)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| ResultsError::DatabaseError(format!("Failed to begin tx: {e}")))?;

        let created_at = sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
            "INSERT INTO results (id, parent, name, etag)
             VALUES ($1, $2, $1, '')
             RETURNING created_at",
        )
        .bind(&id)
        .bind(parent)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ResultsError::DatabaseError(format!("Failed to insert result: {e}")))?;

        let etags = insert_records(&mut tx, parent, &id, &result.executions).await?;
        let etag = result_etag(&id, etags.iter().map(String::as_str));
        let updated_at = set_result_etag(&mut tx, &id, &etag).await?;

        tx.commit()
            .await
            .map_err(|e| ResultsError::DatabaseError(format!("Failed to commit tx: {e}")))?;

        info!(result = %name, records = etags.len(), "Created result");
        Ok(RunResult {
            parent: parent.to_string(),
            id,
            executions: result.executions.clone(),
            etag,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        })
    }

    /// Replaces every record of the result `name` under a row lock.
    pub(crate) async fn replace_result(&self, name: &str, result: &RunResult) -> Result<RunResult> {
        let parsed = parse_result_name(name)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| ResultsError::DatabaseError(format!("Failed to begin tx: {e}")))?;

        let row = sqlx::query_as::<_, ResultRow>(
            "SELECT id, parent, etag, created_at, updated_at
             FROM results
             WHERE parent = $1 AND name = $2
             FOR UPDATE",
        )
        .bind(parsed.parent)
        .bind(parsed.result)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| ResultsError::DatabaseError(format!("Failed to lock result: {e}")))?
        .ok_or_else(|| ResultsError::NotFound(format!("result {name}")))?;

        if !result.etag.is_empty() && result.etag != row.etag {
            return Err(ResultsError::Conflict(format!(
                "result {name} changed: expected etag {}, stored {}",
                result.etag, row.etag
            )));
        }

        sqlx::query("DELETE FROM records WHERE result_id = $1")
            .bind(&row.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ResultsError::DatabaseError(format!("Failed to clear records: {e}")))?;

        let etags = insert_records(&mut tx, &row.parent, &row.id, &result.executions).await?;
        let etag = result_etag(&row.id, etags.iter().map(String::as_str));
        let updated_at = set_result_etag(&mut tx, &row.id, &etag).await?;

        tx.commit()
            .await
            .map_err(|e| ResultsError::DatabaseError(format!("Failed to commit tx: {e}")))?;

        info!(result = %name, records = etags.len(), "Replaced result");
        Ok(RunResult {
            parent: row.parent,
            id: parsed.result.to_string(),
            executions: result.executions.clone(),
            etag,
            created_at: Some(row.created_at),
            updated_at: Some(updated_at),
        })
    }
}

/// Inserts one record per execution and returns their etags in order.
async fn insert_records(
    conn: &mut PgConnection,
    parent: &str,
    result_id: &str,
    executions: &[Execution],
) -> Result<Vec<String>> {
    let mut etags = Vec::with_capacity(executions.len());
    for (index, execution) in executions.iter().enumerate() {
        let record_id = Uuid::new_v4().to_string();
        let record = Record {
            name: format_record_name(parent, result_id, &record_id),
            id: record_id.clone(),
            data: Some(execution.pack()?),
            etag: String::new(),
        };
        let stored = to_storage(parent, result_id, result_id, &record_id, &record)?;
        let etag = record_etag(&stored.id, stored.data.as_deref());

        sqlx::query(
            "INSERT INTO records (id, parent, result_id, result_name, name, position, data, etag)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&stored.id)
        .bind(&stored.parent)
        .bind(&stored.result_id)
        .bind(&stored.result_name)
        .bind(&stored.name)
        .bind(position_i32(index))
        .bind(stored.data.as_deref())
        .bind(&etag)
        .execute(&mut *conn)
        .await
        .map_err(|e| ResultsError::DatabaseError(format!("Failed to insert record: {e}")))?;

        debug!(record = %record.name, "Inserted record");
        etags.push(etag);
    }
    Ok(etags)
}

async fn set_result_etag(
    conn: &mut PgConnection,
    id: &str,
    etag: &str,
) -> Result<chrono::DateTime<chrono::Utc>> {
    sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
        "UPDATE results SET etag = $2, updated_at = NOW() WHERE id = $1 RETURNING updated_at",
    )
    .bind(id)
    .bind(etag)
    .fetch_one(conn)
    .await
    .map_err(|e| ResultsError::DatabaseError(format!("Failed to update result etag: {e}")))
}
