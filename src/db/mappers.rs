use crate::types::StoredRecord;
use sha2::{Digest, Sha256};
use sqlx::FromRow;

#[derive(FromRow)]
pub(crate) struct ResultRow {
    pub(crate) id: String,
    pub(crate) parent: String,
    pub(crate) etag: String,
    pub(crate) created_at: chrono::DateTime<chrono::Utc>,
    pub(crate) updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(FromRow)]
pub(crate) struct RecordRow {
    pub(crate) parent: String,
    pub(crate) result_id: String,
    pub(crate) result_name: String,
    pub(crate) name: String,
    pub(crate) id: String,
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) etag: String,
}

impl From<RecordRow> for StoredRecord {
    fn from(row: RecordRow) -> Self {
        Self {
            parent: row.parent,
            result_id: row.result_id,
            result_name: row.result_name,
            name: row.name,
            id: row.id,
            data: row.data,
        }
    }
}

/// Hex SHA-256 of the record id followed by its payload bytes.
pub fn record_etag(id: &str, data: Option<&[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    if let Some(bytes) = data {
        hasher.update(bytes);
    }
    format!("{:x}", hasher.finalize())
}

/// Hex SHA-256 over the result id and its record etags in position order.
pub fn result_etag<'a, I>(id: &str, record_etags: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    record_etags.into_iter().for_each(|etag| {
        hasher.update(b"\n");
        hasher.update(etag.as_bytes());
    });
    format!("{:x}", hasher.finalize())
}

pub fn position_i32(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}
