//! Hierarchical resource names.
//!
//! A record is addressed as `parent/results/result/records/record` and a
//! result as `parent/results/result`. Value segments are opaque tokens: they
//! must be non-empty and contain no `/`, and they may equal the connector
//! literals themselves.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::error::NameParseError;

pub const RESULTS_CONNECTOR: &str = "results";
pub const RECORDS_CONNECTOR: &str = "records";

const SEPARATOR: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordName<'a> {
    pub parent: &'a str,
    pub result: &'a str,
    pub record: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultName<'a> {
    pub parent: &'a str,
    pub result: &'a str,
}

/// Splits a full record name into its parent, result, and record segments.
///
/// # Errors
/// Returns [`NameParseError`] on a wrong segment count, a connector other than
/// `results`/`records`, or an empty value segment.
pub fn parse_name(name: &str) -> Result<RecordName<'_>, NameParseError> {
    let parts: Vec<&str> = name.split(SEPARATOR).collect();
    let &[parent, results, result, records, record] = parts.as_slice() else {
        return Err(NameParseError::SegmentCount {
            name: name.to_string(),
            expected: 5,
            actual: parts.len(),
        });
    };

    expect_connector(name, 1, results, RESULTS_CONNECTOR)?;
    expect_connector(name, 3, records, RECORDS_CONNECTOR)?;
    expect_value(name, parent, "parent")?;
    expect_value(name, result, "result")?;
    expect_value(name, record, "record")?;

    Ok(RecordName {
        parent,
        result,
        record,
    })
}

/// Splits a result name (`parent/results/result`).
///
/// # Errors
/// Same rules as [`parse_name`], for three segments.
pub fn parse_result_name(name: &str) -> Result<ResultName<'_>, NameParseError> {
    let parts: Vec<&str> = name.split(SEPARATOR).collect();
    let &[parent, results, result] = parts.as_slice() else {
        return Err(NameParseError::SegmentCount {
            name: name.to_string(),
            expected: 3,
            actual: parts.len(),
        });
    };

    expect_connector(name, 1, results, RESULTS_CONNECTOR)?;
    expect_value(name, parent, "parent")?;
    expect_value(name, result, "result")?;

    Ok(ResultName { parent, result })
}

/// Partial form `parent/records/record`, used when the owning result is
/// already known. No validation.
#[must_use]
pub fn format_name(parent: &str, record: &str) -> String {
    format!("{parent}/{RECORDS_CONNECTOR}/{record}")
}

#[must_use]
pub fn format_result_name(parent: &str, result: &str) -> String {
    format!("{parent}/{RESULTS_CONNECTOR}/{result}")
}

#[must_use]
pub fn format_record_name(parent: &str, result: &str, record: &str) -> String {
    format_name(&format_result_name(parent, result), record)
}

fn expect_connector(
    name: &str,
    position: usize,
    found: &str,
    expected: &'static str,
) -> Result<(), NameParseError> {
    if found == expected {
        Ok(())
    } else {
        Err(NameParseError::Connector {
            name: name.to_string(),
            position,
            expected,
            found: found.to_string(),
        })
    }
}

fn expect_value(name: &str, value: &str, segment: &'static str) -> Result<(), NameParseError> {
    if value.is_empty() {
        Err(NameParseError::EmptySegment {
            name: name.to_string(),
            segment,
        })
    } else {
        Ok(())
    }
}
