use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Validate producer pipelines and ingest their parquet output into Druid.
#[derive(Parser, Debug)]
#[command(name = "repan", version, about = "Pipeline validation and Druid ingestion")]
pub struct CliArgs {
    /// Configuration profile; keys are read as {PROFILE}_{KEY} first
    #[arg(long, global = true, env = "REPAN_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a pipeline from a public or private template
    Create {
        owner: String,
        name: String,
        /// Template object name, e.g. `parquet_export.hpl`
        #[arg(long)]
        template: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Upload a new pipeline from a local .hpl file and validate it
    Upload {
        owner: String,
        name: String,
        file: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Overwrite a pipeline definition from a local .hpl file and re-validate it
    Replace {
        owner: String,
        name: String,
        file: PathBuf,
    },

    /// Re-validate a stored pipeline and record the result
    Check { owner: String, name: String },

    /// Print the stored metadata record as JSON
    Metadata { owner: String, name: String },

    /// Copy a pipeline into the owner's private templates
    SaveTemplate { owner: String, name: String },

    /// Ingest a parquet object into Druid and wait for the task to finish
    Ingest {
        owner: String,
        /// Object name under the owner's prefix in the parquet bucket
        file: String,
        /// Target Druid datasource
        #[arg(long)]
        data_source: String,
    },

    /// Print the effective configuration with secrets removed
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn parses_ingest() {
        let args = CliArgs::parse_from([
            "repan",
            "ingest",
            "alice",
            "Test1.parquet",
            "--data-source",
            "Test1",
        ]);
        match args.command {
            Command::Ingest {
                owner,
                file,
                data_source,
            } => {
                assert_eq!(owner, "alice");
                assert_eq!(file, "Test1.parquet");
                assert_eq!(data_source, "Test1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_create_with_default_description() {
        let args = CliArgs::parse_from([
            "repan", "create", "alice", "sales", "--template", "parquet.hpl",
        ]);
        assert!(matches!(
            args.command,
            Command::Create { ref description, .. } if description.is_empty()
        ));
    }

    #[test]
    fn parses_upload_with_description() {
        let args = CliArgs::parse_from([
            "repan",
            "upload",
            "alice",
            "sales",
            "sales.hpl",
            "--description",
            "daily",
        ]);
        match args.command {
            Command::Upload {
                file, description, ..
            } => {
                assert_eq!(file, PathBuf::from("sales.hpl"));
                assert_eq!(description, "daily");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
