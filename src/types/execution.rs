#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::identifiers::ObjectKey;
use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const TASK_RUN_TYPE_URL: &str = "type.googleapis.com/tekton.pipeline.v1beta1.TaskRun";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.as_str(), self.name.as_str())
    }

    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRun {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub status: Value,
}

/// Payload kinds an [`Execution`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    TaskRun,
}

impl PayloadKind {
    #[must_use]
    pub const fn type_url(self) -> &'static str {
        match self {
            Self::TaskRun => TASK_RUN_TYPE_URL,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskRun => "TaskRun",
        }
    }

    /// # Errors
    /// Returns `ConversionError::UnsupportedKind` for any type URL outside the known set.
    pub fn from_type_url(type_url: &str) -> Result<Self, ConversionError> {
        match type_url {
            TASK_RUN_TYPE_URL => Ok(Self::TaskRun),
            other => Err(ConversionError::UnsupportedKind(other.to_string())),
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One run observation held by a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Execution {
    TaskRun(TaskRun),
}

impl Execution {
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::TaskRun(_) => PayloadKind::TaskRun,
        }
    }

    #[must_use]
    pub const fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::TaskRun(task_run) => &task_run.metadata,
        }
    }

    /// Whether this execution was converted from the source object `key`.
    #[must_use]
    pub fn is_for(&self, key: &ObjectKey) -> bool {
        let metadata = self.metadata();
        metadata.namespace == key.namespace() && metadata.name == key.name()
    }

    /// Wraps the execution into its typed envelope.
    ///
    /// # Errors
    /// Returns `ConversionError::Encode` if the payload cannot be serialized.
    pub fn pack(&self) -> Result<Any, ConversionError> {
        let kind = self.kind();
        let value = match self {
            Self::TaskRun(task_run) => serde_json::to_vec(task_run),
        }
        .map_err(|e| ConversionError::Encode {
            kind: kind.as_str(),
            reason: e.to_string(),
        })?;
        Ok(Any::new(kind.type_url(), value))
    }

    /// # Errors
    /// Returns `ConversionError` for an unknown type URL or undecodable bytes.
    pub fn unpack(any: &Any) -> Result<Self, ConversionError> {
        match any.kind()? {
            PayloadKind::TaskRun => serde_json::from_slice::<TaskRun>(&any.value)
                .map(Self::TaskRun)
                .map_err(|e| ConversionError::Decode {
                    kind: PayloadKind::TaskRun.as_str(),
                    reason: e.to_string(),
                }),
        }
    }
}

/// Typed envelope: a type URL naming the payload kind plus the payload's
/// serialized bytes, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl Any {
    #[must_use]
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    /// # Errors
    /// Returns `ConversionError::UnsupportedKind` when the type URL is unknown.
    pub fn kind(&self) -> Result<PayloadKind, ConversionError> {
        PayloadKind::from_type_url(&self.type_url)
    }

    /// Serializes the envelope as `u32` big-endian type-URL length, the type
    /// URL, then the payload bytes.
    ///
    /// # Errors
    /// Returns `ConversionError::MalformedEnvelope` if the type URL is empty or
    /// does not fit a `u32` length prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConversionError> {
        if self.type_url.is_empty() {
            return Err(ConversionError::MalformedEnvelope(
                "empty type url".to_string(),
            ));
        }
        let len = u32::try_from(self.type_url.len()).map_err(|_| {
            ConversionError::MalformedEnvelope("type url too long".to_string())
        })?;

        let mut bytes = Vec::with_capacity(4 + self.type_url.len() + self.value.len());
        bytes.extend_from_slice(&len.to_be_bytes());
        bytes.extend_from_slice(self.type_url.as_bytes());
        bytes.extend_from_slice(&self.value);
        Ok(bytes)
    }

    /// Inverse of [`Any::to_bytes`].
    ///
    /// # Errors
    /// Returns `ConversionError::MalformedEnvelope` on truncated input, an empty
    /// or non-UTF-8 type URL.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConversionError> {
        let malformed = |reason: &str| ConversionError::MalformedEnvelope(reason.to_string());

        let (prefix, rest) = bytes
            .split_first_chunk::<4>()
            .ok_or_else(|| malformed("missing length prefix"))?;
        let len = usize::try_from(u32::from_be_bytes(*prefix))
            .map_err(|_| malformed("length prefix overflow"))?;
        if len == 0 {
            return Err(malformed("empty type url"));
        }
        if rest.len() < len {
            return Err(malformed("truncated type url"));
        }

        let (type_url, value) = rest.split_at(len);
        let type_url =
            std::str::from_utf8(type_url).map_err(|_| malformed("type url is not utf-8"))?;
        Ok(Self::new(type_url, value.to_vec()))
    }
}
