//! Druid batch ingestion: task spec model, parquet schema inference, the
//! indexer client and the non-blocking job monitor.

pub mod client;
pub mod error;
pub mod job;
pub mod monitor;
pub mod schema;
pub mod spec;

pub use client::{DruidClient, IndexingEngine, TaskStatus};
pub use error::{DruidError, IngestionError};
pub use job::{IngestionJob, JobReport, JobState, PollOutcome};
pub use monitor::{IngestionJobMonitor, JobHandle, PollPolicy};
pub use schema::{
    footer_metadata_range, infer_from_footer, infer_from_parquet, FOOTER_SIZE,
};
pub use spec::{DataSchema, Dimension, DimensionType, IngestionTask, S3Source, TimestampFormat, TimestampSpec};
