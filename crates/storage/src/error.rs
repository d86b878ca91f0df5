use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pipeline definition: {0}")]
    Definition(#[from] repan_rules::RuleError),

    #[error("invalid pipeline name: {0}")]
    InvalidName(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}
