//! Pipeline definitions in the pipelines bucket.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};

use repan_rules::{parse_definition, PipelineDefinition, PipelineValidator, ValidationVerdict};

use crate::backend::StorageBackend;
use crate::error::StorageError;
use crate::metadata::{
    CheckStatus, MetadataPatch, MetadataStore, PipelineMetadata, CREATED_PREFIX,
};

const TEMPLATES_PREFIX: &str = "templates";

/// Characters a pipeline name may not contain.
const FORBIDDEN_NAME_CHARS: &str = "!@#$%^&*()+=[]{}\\|;:'\",<>/?";

/// Reject names that would escape the owner's key space or break keys.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    let bad = name
        .chars()
        .find(|c| c.is_whitespace() || FORBIDDEN_NAME_CHARS.contains(*c));
    match bad {
        Some(c) => Err(StorageError::InvalidName(format!(
            "{name:?} contains forbidden character {c:?}"
        ))),
        None if name.is_empty() => Err(StorageError::InvalidName("name is empty".into())),
        None => Ok(()),
    }
}

/// Naive UTC with microseconds, e.g. `2024-05-01T08:30:00.123456`.
fn created_now() -> String {
    Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Definitions, templates and their metadata, validated on every write.
#[derive(Clone)]
pub struct PipelineStore {
    backend: Arc<StorageBackend>,
    metadata: MetadataStore,
    validator: PipelineValidator,
}

impl PipelineStore {
    pub fn new(backend: Arc<StorageBackend>) -> Self {
        Self {
            metadata: MetadataStore::new(backend.clone()),
            backend,
            validator: PipelineValidator::default(),
        }
    }

    pub fn with_validator(mut self, validator: PipelineValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn definition_key(owner: &str, name: &str) -> String {
        format!("{CREATED_PREFIX}/{owner}/{name}.hpl")
    }

    /// Public template first, then the owner's private one.
    fn template_candidates(owner: &str, template: &str) -> [String; 2] {
        [
            format!("{TEMPLATES_PREFIX}/{template}"),
            format!("{TEMPLATES_PREFIX}/{owner}/{template}"),
        ]
    }

    /// Create a pipeline by copying a template and record its metadata.
    pub async fn create_from_template(
        &self,
        owner: &str,
        name: &str,
        template: &str,
        description: &str,
    ) -> Result<PipelineMetadata, StorageError> {
        validate_name(name)?;

        let target = Self::definition_key(owner, name);
        if self.backend.exists(&target).await? {
            return Err(StorageError::AlreadyExists(target));
        }

        let mut source = None;
        for candidate in Self::template_candidates(owner, template) {
            if self.backend.exists(&candidate).await? {
                source = Some(candidate);
                break;
            }
        }
        let source = source.ok_or_else(|| StorageError::TemplateNotFound(template.to_string()))?;

        self.backend.copy(&source, &target).await?;

        let metadata = PipelineMetadata {
            description: description.to_string(),
            created: created_now(),
            check_status: CheckStatus::Success,
            check_text: repan_rules::ValidationCode::ValidPipeline.to_string(),
            ..Default::default()
        };
        self.metadata.save(owner, name, &metadata).await?;

        info!(owner, name, template = %source, "pipeline created from template");
        Ok(metadata)
    }

    pub async fn fetch_definition(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<PipelineDefinition, StorageError> {
        let bytes = self.backend.get_bytes(&Self::definition_key(owner, name)).await?;
        Ok(parse_definition(&bytes)?)
    }

    /// Validate the stored definition and record the outcome.
    pub async fn check(&self, owner: &str, name: &str) -> Result<ValidationVerdict, StorageError> {
        let definition = self.fetch_definition(owner, name).await?;
        let verdict = self.validator.validate(&definition);

        self.metadata
            .update(owner, name, MetadataPatch::from_verdict(&verdict))
            .await?;

        if verdict.valid {
            info!(owner, name, "pipeline check passed");
        } else {
            warn!(owner, name, code = %verdict.code, "pipeline check failed");
        }
        Ok(verdict)
    }

    /// Store a new definition, record its metadata, then check it.
    ///
    /// Fails with `AlreadyExists` when the name is taken; use
    /// [`PipelineStore::replace`] to overwrite.
    pub async fn upload(
        &self,
        owner: &str,
        name: &str,
        definition: impl Into<Bytes>,
        description: &str,
    ) -> Result<ValidationVerdict, StorageError> {
        validate_name(name)?;

        let key = Self::definition_key(owner, name);
        if self.backend.exists(&key).await? {
            return Err(StorageError::AlreadyExists(key));
        }
        self.backend.put_bytes(&key, definition).await?;

        let metadata = PipelineMetadata {
            description: description.to_string(),
            created: created_now(),
            ..Default::default()
        };
        self.metadata.save(owner, name, &metadata).await?;
        info!(owner, name, "pipeline uploaded");

        self.check(owner, name).await
    }

    /// Overwrite a definition and re-check it. Metadata other than the
    /// check fields keeps its stored values.
    pub async fn replace(
        &self,
        owner: &str,
        name: &str,
        definition: impl Into<Bytes>,
    ) -> Result<ValidationVerdict, StorageError> {
        validate_name(name)?;
        self.backend
            .put_bytes(&Self::definition_key(owner, name), definition)
            .await?;
        debug!(owner, name, "pipeline definition replaced");
        self.check(owner, name).await
    }

    /// Copy an owner's pipeline into their private templates.
    pub async fn save_as_template(&self, owner: &str, name: &str) -> Result<String, StorageError> {
        let target = format!("{TEMPLATES_PREFIX}/{owner}/{name}.hpl");
        self.backend
            .copy(&Self::definition_key(owner, name), &target)
            .await?;
        info!(owner, name, template = %target, "pipeline saved as template");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(validate_name("daily_sales-v2.1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("../other").is_err());
        assert!(validate_name("x?").is_err());
    }

    #[test]
    fn keys() {
        assert_eq!(
            PipelineStore::definition_key("alice", "p"),
            "pipelines-created/alice/p.hpl"
        );
        assert_eq!(
            PipelineStore::template_candidates("alice", "t.hpl"),
            ["templates/t.hpl".to_string(), "templates/alice/t.hpl".to_string()]
        );
    }
}
