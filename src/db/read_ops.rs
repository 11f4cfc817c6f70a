use super::mappers::{RecordRow, ResultRow};
use super::ResultsDb;
use crate::convert::to_api;
use crate::error::{ConversionError, Result, ResultsError};
use crate::name::parse_result_name;
use crate::types::{Execution, ListRecordsRequest, ListRecordsResponse, RunResult, StoredRecord};
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Result segment that lists across every result under a parent.
const ANY_RESULT: &str = "-";

impl ResultsDb {
    pub(crate) async fn load_result(&self, name: &str) -> Result<RunResult> {
        let parsed = parse_result_name(name)?;

        let row = sqlx::query_as::<_, ResultRow>(
            "SELECT id, parent, etag, created_at, updated_at
             FROM results
             WHERE parent = $1 AND name = $2",
        )
        .bind(parsed.parent)
        .bind(parsed.result)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| ResultsError::DatabaseError(format!("Failed to get result: {e}")))?
        .ok_or_else(|| ResultsError::NotFound(format!("result {name}")))?;

        let records = sqlx::query_as::<_, RecordRow>(
            "SELECT parent, result_id, result_name, name, id, data, etag
             FROM records
             WHERE result_id = $1
             ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| ResultsError::DatabaseError(format!("Failed to get records: {e}")))?;

        let executions = records
            .into_iter()
            .map(|record| {
                let record = to_api(&StoredRecord::from(record))?;
                let any = record.data.ok_or(ConversionError::MissingField("data"))?;
                Execution::unpack(&any)
            })
            .collect::<std::result::Result<Vec<_>, ConversionError>>()?;

        Ok(RunResult {
            parent: row.parent,
            id: parsed.result.to_string(),
            executions,
            etag: row.etag,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }

    /// Lists records under a result (`p/results/r`) or under every result of
    /// a parent (`p/results/-`), ordered by record id.
    ///
    /// # Errors
    /// Returns `ResultsError::NameParse` for a malformed parent,
    /// `ResultsError::Conversion` for an undecodable stored record, and
    /// `ResultsError::DatabaseError` when the query fails.
    pub async fn list_records(&self, request: &ListRecordsRequest) -> Result<ListRecordsResponse> {
        let parsed = parse_result_name(&request.parent)?;
        let result = (parsed.result != ANY_RESULT).then_some(parsed.result);
        let filter = request.filter.as_deref().filter(|f| !f.is_empty());
        let page_token = request.page_token.as_deref().filter(|t| !t.is_empty());
        let page_size = effective_page_size(request.page_size);

        let mut rows = sqlx::query_as::<_, RecordRow>(
            "SELECT parent, result_id, result_name, name, id, data, etag
             FROM records
             WHERE parent = $1
               AND ($2::TEXT IS NULL OR result_name = $2)
               AND ($3::TEXT IS NULL OR id > $3)
               AND ($4::TEXT IS NULL OR strpos(name, $4) > 0)
             ORDER BY id
             LIMIT $5",
        )
        .bind(parsed.parent)
        .bind(result)
        .bind(page_token)
        .bind(filter)
        .bind(i64::from(page_size) + 1)
        .fetch_all(self.pool())
        .await
        .map_err(|e| ResultsError::DatabaseError(format!("Failed to list records: {e}")))?;

        let has_more = rows.len() > page_size as usize;
        rows.truncate(page_size as usize);
        let next_page_token = has_more
            .then(|| rows.last().map(|row| row.id.clone()))
            .flatten();

        let records = rows
            .into_iter()
            .map(|row| {
                let etag = row.etag.clone();
                to_api(&StoredRecord::from(row)).map(|mut record| {
                    record.etag = etag;
                    record
                })
            })
            .collect::<std::result::Result<Vec<_>, ConversionError>>()?;

        debug!(
            parent = %request.parent,
            count = records.len(),
            more = next_page_token.is_some(),
            "Listed records"
        );
        Ok(ListRecordsResponse {
            records,
            next_page_token,
        })
    }
}

/// Zero or absent means the default; anything above the cap is clamped.
pub(crate) fn effective_page_size(requested: Option<u32>) -> u32 {
    match requested {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(size) => size.min(MAX_PAGE_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::{effective_page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    #[test]
    fn page_size_defaults_and_clamps() {
        assert_eq!(effective_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(effective_page_size(Some(0)), DEFAULT_PAGE_SIZE);
        assert_eq!(effective_page_size(Some(7)), 7);
        assert_eq!(effective_page_size(Some(5000)), MAX_PAGE_SIZE);
    }
}
