#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::error::ConversionError;
use crate::name::format_record_name;
use crate::types::{Any, Record, StoredRecord};

/// Maps a wire record to its storage form.
///
/// The wire etag is dropped: the store computes its own.
///
/// # Errors
/// Returns `ConversionError` when the payload envelope has an unknown type or
/// cannot be serialized.
pub fn to_storage(
    parent: &str,
    result_name: &str,
    result_id: &str,
    record_name: &str,
    record: &Record,
) -> Result<StoredRecord, ConversionError> {
    let data = record
        .data
        .as_ref()
        .map(|any| any.kind().and_then(|_| any.to_bytes()))
        .transpose()?;

    Ok(StoredRecord {
        parent: parent.to_string(),
        result_id: result_id.to_string(),
        result_name: result_name.to_string(),
        name: record_name.to_string(),
        id: record.id.clone(),
        data,
    })
}

/// Maps a stored record back to its wire form.
///
/// # Errors
/// Returns `ConversionError` when the stored bytes are not a valid envelope of
/// a known type.
pub fn to_api(stored: &StoredRecord) -> Result<Record, ConversionError> {
    let data = stored
        .data
        .as_deref()
        .map(|bytes| {
            let any = Any::from_bytes(bytes)?;
            any.kind().map(|_| any)
        })
        .transpose()?;

    Ok(Record {
        name: format_record_name(&stored.parent, &stored.result_name, &stored.name),
        id: stored.id.clone(),
        data,
        etag: String::new(),
    })
}
