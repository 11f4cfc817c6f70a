use super::execution::Any;

/// Wire-level record. Parent and result are folded into `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub id: String,
    pub data: Option<Any>,
    /// Accepted on input, never persisted from here.
    pub etag: String,
}

/// Storage-level record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredRecord {
    pub parent: String,
    pub result_id: String,
    pub result_name: String,
    pub name: String,
    pub id: String,
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRecordsRequest {
    pub parent: String,
    pub filter: Option<String>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRecordsResponse {
    pub records: Vec<Record>,
    pub next_page_token: Option<String>,
}
