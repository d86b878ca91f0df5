//! Object storage for pipeline definitions and their metadata.

pub mod backend;
pub mod error;
pub mod metadata;
pub mod pipelines;

pub use backend::{LocalBackend, S3Backend, StorageBackend};
pub use error::StorageError;
pub use metadata::{CheckStatus, MetadataPatch, MetadataStore, PipelineMetadata};
pub use pipelines::{validate_name, PipelineStore};
