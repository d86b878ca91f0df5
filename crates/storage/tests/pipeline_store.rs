//! PipelineStore flows against an in-memory bucket.

use std::sync::Arc;

use bytes::Bytes;
use repan_rules::ValidationCode;
use repan_storage::{
    CheckStatus, MetadataPatch, MetadataStore, PipelineMetadata, PipelineStore, StorageBackend,
    StorageError,
};

const PARQUET_OUTPUT: &str = include_str!("fixtures/parquet_output.hpl");

async fn seeded() -> (Arc<StorageBackend>, PipelineStore) {
    let backend = Arc::new(StorageBackend::in_memory());
    backend
        .put_bytes("templates/parquet.hpl", Bytes::from_static(PARQUET_OUTPUT.as_bytes()))
        .await
        .unwrap();
    let store = PipelineStore::new(backend.clone());
    (backend, store)
}

#[tokio::test]
async fn default_then_update_touches_only_patched_fields() {
    let backend = Arc::new(StorageBackend::in_memory());
    let store = MetadataStore::new(backend);

    let before = store.get("alice", "fresh").await;
    assert_eq!(before, PipelineMetadata::default());
    assert_eq!(before.check_status, CheckStatus::Failed);

    let patch = MetadataPatch {
        check_text: Some("InvalidFilenameBase".into()),
        ..Default::default()
    };
    store.update("alice", "fresh", patch).await.unwrap();

    let after = store.get("alice", "fresh").await;
    assert_eq!(after.check_text, "InvalidFilenameBase");
    assert_eq!(after.check_status, CheckStatus::Failed);
    assert_eq!(after.description, "");
    assert_eq!(after.created, "");
    assert!(after.extra.is_empty());
}

#[tokio::test]
async fn create_copies_public_template_and_records_success() {
    let (backend, store) = seeded().await;

    let metadata = store
        .create_from_template("alice", "sales", "parquet.hpl", "daily sales")
        .await
        .unwrap();

    assert_eq!(metadata.check_status, CheckStatus::Success);
    assert_eq!(metadata.check_text, "ValidPipeline");
    assert!(metadata.created_at().is_some());

    let copied = backend
        .get_bytes("pipelines-created/alice/sales.hpl")
        .await
        .unwrap();
    assert_eq!(copied, Bytes::from_static(PARQUET_OUTPUT.as_bytes()));
    assert_eq!(store.metadata().get("alice", "sales").await, metadata);
}

#[tokio::test]
async fn create_falls_back_to_private_template() {
    let backend = Arc::new(StorageBackend::in_memory());
    backend
        .put_bytes("templates/alice/mine.hpl", Bytes::from_static(b"<pipeline/>"))
        .await
        .unwrap();
    let store = PipelineStore::new(backend.clone());

    store
        .create_from_template("alice", "p", "mine.hpl", "")
        .await
        .unwrap();
    assert!(backend.exists("pipelines-created/alice/p.hpl").await.unwrap());

    let err = store
        .create_from_template("bob", "p", "mine.hpl", "")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::TemplateNotFound(t) if t == "mine.hpl"));
}

#[tokio::test]
async fn create_refuses_existing_name() {
    let (_, store) = seeded().await;
    store
        .create_from_template("alice", "sales", "parquet.hpl", "")
        .await
        .unwrap();
    let err = store
        .create_from_template("alice", "sales", "parquet.hpl", "")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(_)));
}

#[tokio::test]
async fn create_rejects_bad_name() {
    let (_, store) = seeded().await;
    let err = store
        .create_from_template("alice", "my pipeline", "parquet.hpl", "")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidName(_)));
}

#[tokio::test]
async fn replace_invalid_definition_records_failure() {
    let (_, store) = seeded().await;
    let created = store
        .create_from_template("alice", "sales", "parquet.hpl", "keep me")
        .await
        .unwrap();

    let csv = PARQUET_OUTPUT.replace(
        "<filename_ext>parquet</filename_ext>",
        "<filename_ext>csv</filename_ext>",
    );
    let verdict = store.replace("alice", "sales", csv).await.unwrap();
    assert!(!verdict.valid);
    assert_eq!(verdict.code, ValidationCode::InvalidFilenameExtension);

    let metadata = store.metadata().get("alice", "sales").await;
    assert_eq!(metadata.check_status, CheckStatus::Failed);
    assert_eq!(metadata.check_text, "InvalidFilenameExtension");
    assert_eq!(metadata.description, "keep me");
    assert_eq!(metadata.created, created.created);

    let verdict = store.replace("alice", "sales", PARQUET_OUTPUT).await.unwrap();
    assert!(verdict.valid);
    let metadata = store.metadata().get("alice", "sales").await;
    assert_eq!(metadata.check_status, CheckStatus::Success);
    assert_eq!(metadata.check_code(), Some(ValidationCode::ValidPipeline));
}

#[tokio::test]
async fn upload_records_description_created_and_verdict() {
    let (backend, store) = seeded().await;

    let verdict = store
        .upload("alice", "fresh", PARQUET_OUTPUT, "uploaded by hand")
        .await
        .unwrap();
    assert!(verdict.valid);
    assert!(backend.exists("pipelines-created/alice/fresh.hpl").await.unwrap());

    let metadata = store.metadata().get("alice", "fresh").await;
    assert_eq!(metadata.description, "uploaded by hand");
    assert!(metadata.created_at().is_some());
    assert_eq!(metadata.check_status, CheckStatus::Success);
    assert_eq!(metadata.check_code(), Some(ValidationCode::ValidPipeline));
}

#[tokio::test]
async fn upload_refuses_existing_name_and_keeps_definition() {
    let (backend, store) = seeded().await;
    store
        .create_from_template("alice", "sales", "parquet.hpl", "original")
        .await
        .unwrap();

    let err = store
        .upload("alice", "sales", "<pipeline/>", "other")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(k) if k == "pipelines-created/alice/sales.hpl"));

    let stored = backend
        .get_bytes("pipelines-created/alice/sales.hpl")
        .await
        .unwrap();
    assert_eq!(stored, Bytes::from_static(PARQUET_OUTPUT.as_bytes()));
    assert_eq!(store.metadata().get("alice", "sales").await.description, "original");
}

#[tokio::test]
async fn upload_rejects_bad_name() {
    let (_, store) = seeded().await;
    let err = store
        .upload("alice", "a/b", PARQUET_OUTPUT, "")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidName(_)));
}

#[tokio::test]
async fn check_missing_definition_propagates() {
    let (_, store) = seeded().await;
    let err = store.check("alice", "ghost").await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::ObjectStore(object_store::Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn check_malformed_definition_propagates() {
    let (_, store) = seeded().await;
    let err = store
        .upload("alice", "broken", "<pipeline><transform>", "")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Definition(_)));
}

#[tokio::test]
async fn save_as_template_round_trips_into_create() {
    let (_, store) = seeded().await;
    store
        .create_from_template("alice", "sales", "parquet.hpl", "")
        .await
        .unwrap();
    let key = store.save_as_template("alice", "sales").await.unwrap();
    assert_eq!(key, "templates/alice/sales.hpl");

    store
        .create_from_template("alice", "sales2", "sales.hpl", "")
        .await
        .unwrap();
}

#[tokio::test]
async fn metadata_write_failure_propagates() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("pipelines");
    std::fs::create_dir_all(&root).unwrap();
    let backend = Arc::new(StorageBackend::Local(
        repan_storage::LocalBackend::new(&root).unwrap(),
    ));
    let store = MetadataStore::new(backend);

    // Replace the bucket directory with a plain file so every write fails.
    std::fs::remove_dir_all(&root).unwrap();
    std::fs::write(&root, b"").unwrap();

    assert_eq!(store.get("alice", "p").await, PipelineMetadata::default());
    let err = store
        .save("alice", "p", &PipelineMetadata::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::ObjectStore(_)));
}
