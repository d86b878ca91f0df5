//! Per-pipeline metadata records.
//!
//! One JSON object per pipeline at `pipelines-created/{owner}/{name}.json`.
//! Reads never fail: an absent or unreadable record yields the default
//! record. Writes replace the whole object.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use repan_rules::{ValidationCode, ValidationVerdict};

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Key prefix shared by definitions and metadata records.
pub const CREATED_PREFIX: &str = "pipelines-created";

/// Outcome of the last validation run, stored lowercase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    #[default]
    Failed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Success => "success",
            CheckStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ValidationVerdict> for CheckStatus {
    fn from(verdict: &ValidationVerdict) -> Self {
        if verdict.valid {
            CheckStatus::Success
        } else {
            CheckStatus::Failed
        }
    }
}

/// A stored metadata record. Keys this crate does not know about are kept
/// in `extra` and written back untouched.
///
/// Decoding is lenient per field: a known key holding a value of the wrong
/// shape falls back to that field's default without discarding the rest of
/// the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct PipelineMetadata {
    pub description: String,
    /// ISO-8601 creation time, empty when unknown.
    pub created: String,
    pub check_status: CheckStatus,
    /// A [`ValidationCode`] name, or empty before the first check.
    pub check_text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Naive layouts accepted for `created`, all taken as UTC.
const NAIVE_CREATED_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

impl PipelineMetadata {
    /// Parse `created`. Accepts RFC 3339 as well as naive timestamps with a
    /// `T` or a space between date and time.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if self.created.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.created) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_CREATED_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&self.created, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    /// The last check result as a code, if it names one.
    pub fn check_code(&self) -> Option<ValidationCode> {
        self.check_text.parse().ok()
    }
}

fn text_field(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

impl From<Map<String, Value>> for PipelineMetadata {
    fn from(mut map: Map<String, Value>) -> Self {
        let check_status = map
            .remove("check_status")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        Self {
            description: text_field(map.remove("description")),
            created: text_field(map.remove("created")),
            check_status,
            check_text: text_field(map.remove("check_text")),
            extra: map,
        }
    }
}

impl From<PipelineMetadata> for Map<String, Value> {
    fn from(metadata: PipelineMetadata) -> Self {
        let mut map = metadata.extra;
        map.insert("description".into(), metadata.description.into());
        map.insert("created".into(), metadata.created.into());
        map.insert("check_status".into(), metadata.check_status.as_str().into());
        map.insert("check_text".into(), metadata.check_text.into());
        map
    }
}

/// Partial update for a metadata record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataPatch {
    pub description: Option<String>,
    pub created: Option<String>,
    pub check_status: Option<CheckStatus>,
    pub check_text: Option<String>,
    pub extra: Map<String, Value>,
}

impl MetadataPatch {
    /// The check fields for a validation outcome.
    pub fn from_verdict(verdict: &ValidationVerdict) -> Self {
        Self {
            check_status: Some(CheckStatus::from(verdict)),
            check_text: Some(verdict.code.to_string()),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    /// Overwrite the keys this patch sets. Every other key in `record`,
    /// including values this crate cannot interpret, is left as stored.
    pub fn apply_to(self, record: &mut Map<String, Value>) {
        if let Some(description) = self.description {
            record.insert("description".into(), description.into());
        }
        if let Some(created) = self.created {
            record.insert("created".into(), created.into());
        }
        if let Some(status) = self.check_status {
            record.insert("check_status".into(), status.as_str().into());
        }
        if let Some(text) = self.check_text {
            record.insert("check_text".into(), text.into());
        }
        record.extend(self.extra);
    }
}

/// Metadata records in the pipelines bucket.
#[derive(Clone)]
pub struct MetadataStore {
    backend: Arc<StorageBackend>,
}

impl MetadataStore {
    pub fn new(backend: Arc<StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn key(owner: &str, name: &str) -> String {
        format!("{CREATED_PREFIX}/{owner}/{name}.json")
    }

    /// Read a record, falling back to the default on any failure.
    pub async fn get(&self, owner: &str, name: &str) -> PipelineMetadata {
        PipelineMetadata::from(self.read_record(&Self::key(owner, name)).await)
    }

    /// The stored JSON object as-is, or the default record when it is
    /// absent or not a JSON object.
    async fn read_record(&self, key: &str) -> Map<String, Value> {
        let bytes = match self.backend.get_bytes(key).await {
            Ok(bytes) => bytes,
            Err(StorageError::ObjectStore(object_store::Error::NotFound { .. })) => {
                debug!(%key, "no metadata record, using default");
                return PipelineMetadata::default().into();
            }
            Err(e) => {
                warn!(%key, error = %e, "metadata read failed, using default");
                return PipelineMetadata::default().into();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(%key, error = %e, "metadata record unreadable, using default");
            PipelineMetadata::default().into()
        })
    }

    async fn write_record(&self, key: &str, record: &Map<String, Value>) -> Result<(), StorageError> {
        let body = serde_json::to_vec_pretty(record)?;
        self.backend.put_bytes(key, body).await?;
        Ok(())
    }

    /// Replace the stored record.
    pub async fn save(
        &self,
        owner: &str,
        name: &str,
        metadata: &PipelineMetadata,
    ) -> Result<(), StorageError> {
        let key = Self::key(owner, name);
        let record: Map<String, Value> = metadata.clone().into();
        self.write_record(&key, &record).await?;
        debug!(%key, check_status = %metadata.check_status, "metadata saved");
        Ok(())
    }

    /// Read, merge `patch`, write back, and return the merged record.
    ///
    /// The merge happens on the stored JSON object, so keys outside the
    /// patch keep their stored values even when they do not decode.
    pub async fn update(
        &self,
        owner: &str,
        name: &str,
        patch: MetadataPatch,
    ) -> Result<PipelineMetadata, StorageError> {
        let key = Self::key(owner, name);
        let mut record = self.read_record(&key).await;
        patch.apply_to(&mut record);
        self.write_record(&key, &record).await?;
        debug!(%key, "metadata updated");
        Ok(PipelineMetadata::from(record))
    }
}
