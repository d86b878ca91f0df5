mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Parser;
use tracing::info;

use repan_core::config::{self, Config};
use repan_druid::{
    footer_metadata_range, infer_from_footer, DataSchema, DruidClient, IngestionJobMonitor,
    IngestionTask, PollPolicy, S3Source, FOOTER_SIZE,
};
use repan_rules::ValidationVerdict;
use repan_storage::{PipelineStore, StorageBackend};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    config::load_dotenv();
    let args = CliArgs::parse();

    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    }
    .context("invalid configuration")?;
    config.log_summary();

    run(args.command, &config).await
}

fn pipeline_store(config: &Config) -> Result<PipelineStore> {
    let backend = StorageBackend::from_config(&config.storage, &config.storage.pipelines_bucket)
        .context("failed to open pipelines bucket")?;
    Ok(PipelineStore::new(Arc::new(backend)))
}

fn read_definition(file: &Path) -> Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))
}

/// Print the verdict; an invalid pipeline is a failed command.
fn report_verdict(owner: &str, name: &str, verdict: &ValidationVerdict) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(verdict)?);
    if !verdict.valid {
        bail!("pipeline {owner}/{name} is invalid: {}", verdict.code);
    }
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Create {
            owner,
            name,
            template,
            description,
        } => {
            let store = pipeline_store(config)?;
            let metadata = store
                .create_from_template(&owner, &name, &template, &description)
                .await
                .with_context(|| format!("failed to create {owner}/{name} from {template}"))?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }

        Command::Upload {
            owner,
            name,
            file,
            description,
        } => {
            let bytes = read_definition(&file)?;
            let verdict = pipeline_store(config)?
                .upload(&owner, &name, bytes, &description)
                .await
                .with_context(|| format!("failed to upload {owner}/{name}"))?;
            report_verdict(&owner, &name, &verdict)?;
        }

        Command::Replace { owner, name, file } => {
            let bytes = read_definition(&file)?;
            let verdict = pipeline_store(config)?
                .replace(&owner, &name, bytes)
                .await
                .with_context(|| format!("failed to replace {owner}/{name}"))?;
            report_verdict(&owner, &name, &verdict)?;
        }

        Command::Check { owner, name } => {
            let verdict = pipeline_store(config)?
                .check(&owner, &name)
                .await
                .with_context(|| format!("failed to check {owner}/{name}"))?;
            report_verdict(&owner, &name, &verdict)?;
        }

        Command::Metadata { owner, name } => {
            let metadata = pipeline_store(config)?.metadata().get(&owner, &name).await;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }

        Command::SaveTemplate { owner, name } => {
            let key = pipeline_store(config)?
                .save_as_template(&owner, &name)
                .await
                .with_context(|| format!("failed to save {owner}/{name} as template"))?;
            println!("{key}");
        }

        Command::Ingest {
            owner,
            file,
            data_source,
        } => ingest(config, &owner, &file, &data_source).await?,

        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
        }
    }
    Ok(())
}

async fn ingest(config: &Config, owner: &str, file: &str, data_source: &str) -> Result<()> {
    let storage = &config.storage;
    let (Some(endpoint), Some(access_key), Some(secret_key)) = (
        storage.endpoint_url.as_deref(),
        storage.access_key_id.as_deref(),
        storage.secret_access_key.as_deref(),
    ) else {
        bail!("ingestion needs MINIO_URL, MINIO_ACCESS_KEY and MINIO_SECRET_KEY");
    };

    let path = format!("{owner}/{file}");
    let parquets = StorageBackend::from_config(storage, &storage.parquet_bucket)
        .context("failed to open parquet bucket")?;
    let footer = read_parquet_footer(&parquets, &path)
        .await
        .with_context(|| format!("failed to read footer of {}/{path}", storage.parquet_bucket))?;

    let (timestamp_spec, dimensions) =
        infer_from_footer(&footer).with_context(|| format!("failed to read schema of {path}"))?;
    info!(
        path = %path,
        timestamp = %timestamp_spec.column,
        dimensions = dimensions.len(),
        "parquet schema inferred"
    );

    let task = IngestionTask::parquet_from_s3(
        S3Source::minio(endpoint, access_key, secret_key, &storage.parquet_bucket, &path),
        DataSchema::new(data_source, timestamp_spec, dimensions),
    );

    let client = DruidClient::from_config(&config.druid).context("failed to set up Druid client")?;
    let policy = PollPolicy::from_config(&config.druid).context("invalid poll settings")?;
    let monitor = IngestionJobMonitor::new(Arc::new(client), policy);

    let report = monitor
        .run(&task)
        .await
        .with_context(|| format!("ingestion of {path} into {data_source} failed"))?;

    info!(
        task_id = %report.task_id,
        polls = report.polls,
        elapsed_secs = report.elapsed.as_secs(),
        data_source = %data_source,
        "ingestion complete"
    );
    println!("{}", report.task_id);
    Ok(())
}

/// Fetch only the footer metadata of a parquet object: its size, the
/// trailing length and magic, then the metadata range.
async fn read_parquet_footer(parquets: &StorageBackend, path: &str) -> Result<Bytes> {
    let size = parquets.size(path).await?;
    if size < FOOTER_SIZE {
        bail!("{path} is {size} bytes, too short for parquet");
    }
    let tail = parquets.get_range(path, size - FOOTER_SIZE..size).await?;
    let range = footer_metadata_range(size, &tail)?;
    Ok(parquets.get_range(path, range).await?)
}
