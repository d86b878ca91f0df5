//! `index_parallel` task spec for parquet objects in S3-compatible storage.
//!
//! Field names follow Druid's JSON (camelCase). Only the parts of the ingestion task
//! this crate sets are modelled; the indexer fills in its own defaults.

use serde::{Deserialize, Serialize};

use repan_core::config::with_http_scheme;

const INDEX_PARALLEL: &str = "index_parallel";

/// MinIO ignores regions but the S3 extension insists on one.
pub const SIGNING_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    Millis,
    Nano,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampSpec {
    pub column: String,
    pub format: TimestampFormat,
    pub missing_value: i64,
}

impl TimestampSpec {
    pub fn new(column: impl Into<String>, format: TimestampFormat) -> Self {
        Self {
            column: column.into(),
            format,
            missing_value: 0,
        }
    }
}

impl Default for TimestampSpec {
    /// Used when the input has no timestamp column.
    fn default() -> Self {
        Self::new("Date", TimestampFormat::Millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    Long,
    Double,
    Float,
}

/// A dimension is either typed or a bare name, which Druid reads as string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Typed {
        name: String,
        #[serde(rename = "type")]
        kind: DimensionType,
    },
    Name(String),
}

impl Dimension {
    pub fn typed(name: impl Into<String>, kind: DimensionType) -> Self {
        Dimension::Typed {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Dimension::Typed { name, .. } | Dimension::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionTask {
    #[serde(rename = "type")]
    pub kind: String,
    pub spec: TaskSpec,
}

impl IngestionTask {
    /// Parallel batch ingestion of parquet objects.
    pub fn parquet_from_s3(source: S3Source, data_schema: DataSchema) -> Self {
        Self {
            kind: INDEX_PARALLEL.to_string(),
            spec: TaskSpec {
                io_config: IoConfig {
                    kind: INDEX_PARALLEL.to_string(),
                    drop_existing: true,
                    input_source: source,
                    input_format: TypeOnly::new("parquet"),
                },
                tuning_config: TuningConfig {
                    kind: INDEX_PARALLEL.to_string(),
                    partitions_spec: TypeOnly::new("dynamic"),
                },
                data_schema,
            },
        }
    }

    pub fn data_source(&self) -> &str {
        &self.spec.data_schema.data_source
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub io_config: IoConfig,
    pub tuning_config: TuningConfig,
    pub data_schema: DataSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub drop_existing: bool,
    pub input_source: S3Source,
    pub input_format: TypeOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub partitions_spec: TypeOnly,
}

/// `{"type": ...}` objects such as the input format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOnly {
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypeOnly {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Source {
    #[serde(rename = "type")]
    pub kind: String,
    pub endpoint_config: EndpointConfig,
    pub client_config: ClientConfig,
    pub objects: Vec<S3Object>,
    pub properties: S3Properties,
}

impl S3Source {
    /// One object on a MinIO endpoint, read over plain HTTP with path-style
    /// addressing.
    pub fn minio(
        endpoint: &str,
        access_key_id: &str,
        secret_access_key: &str,
        bucket: &str,
        path: &str,
    ) -> Self {
        Self {
            kind: "s3".to_string(),
            endpoint_config: EndpointConfig {
                url: with_http_scheme(endpoint),
                signing_region: SIGNING_REGION.to_string(),
            },
            client_config: ClientConfig {
                protocol: "http".to_string(),
                enable_path_style_access: true,
            },
            objects: vec![S3Object {
                bucket: bucket.to_string(),
                path: path.to_string(),
            }],
            properties: S3Properties {
                access_key_id: access_key_id.to_string(),
                secret_access_key: secret_access_key.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub url: String,
    pub signing_region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub protocol: String,
    pub enable_path_style_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Object {
    pub bucket: String,
    pub path: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Properties {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Properties")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSchema {
    pub data_source: String,
    pub timestamp_spec: TimestampSpec,
    pub dimensions_spec: DimensionsSpec,
    pub granularity_spec: GranularitySpec,
}

impl DataSchema {
    pub fn new(
        data_source: impl Into<String>,
        timestamp_spec: TimestampSpec,
        dimensions: Vec<Dimension>,
    ) -> Self {
        Self {
            data_source: data_source.into(),
            timestamp_spec,
            dimensions_spec: DimensionsSpec { dimensions },
            granularity_spec: GranularitySpec::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsSpec {
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GranularitySpec {
    pub query_granularity: String,
    pub rollup: bool,
    pub segment_granularity: String,
}

impl Default for GranularitySpec {
    fn default() -> Self {
        Self {
            query_granularity: "none".to_string(),
            rollup: false,
            segment_granularity: "day".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> IngestionTask {
        IngestionTask::parquet_from_s3(
            S3Source::minio("minio:9000", "AK", "SK", "parquets", "alice/Test1.parquet"),
            DataSchema::new(
                "Test1",
                TimestampSpec::new("date", TimestampFormat::Millis),
                vec![
                    Dimension::typed("qty", DimensionType::Long),
                    Dimension::Name("city".into()),
                ],
            ),
        )
    }

    #[test]
    fn serializes_to_index_parallel_task() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "index_parallel",
                "spec": {
                    "ioConfig": {
                        "type": "index_parallel",
                        "dropExisting": true,
                        "inputSource": {
                            "type": "s3",
                            "endpointConfig": {"url": "http://minio:9000", "signingRegion": "us-east-1"},
                            "clientConfig": {"protocol": "http", "enablePathStyleAccess": true},
                            "objects": [{"bucket": "parquets", "path": "alice/Test1.parquet"}],
                            "properties": {"accessKeyId": "AK", "secretAccessKey": "SK"}
                        },
                        "inputFormat": {"type": "parquet"}
                    },
                    "tuningConfig": {
                        "type": "index_parallel",
                        "partitionsSpec": {"type": "dynamic"}
                    },
                    "dataSchema": {
                        "dataSource": "Test1",
                        "timestampSpec": {"column": "date", "format": "millis", "missingValue": 0},
                        "dimensionsSpec": {"dimensions": [{"name": "qty", "type": "long"}, "city"]},
                        "granularitySpec": {"queryGranularity": "none", "rollup": false, "segmentGranularity": "day"}
                    }
                }
            })
        );
    }

    #[test]
    fn endpoint_scheme_is_kept() {
        let source = S3Source::minio("https://s3.example", "AK", "SK", "b", "p");
        assert_eq!(source.endpoint_config.url, "https://s3.example");
    }

    #[test]
    fn dimensions_parse_both_forms() {
        let dims: Vec<Dimension> =
            serde_json::from_value(json!([{"name": "n", "type": "float"}, "s"])).unwrap();
        assert_eq!(dims[0], Dimension::typed("n", DimensionType::Float));
        assert_eq!(dims[1].name(), "s");
    }

    #[test]
    fn secret_hidden_from_debug() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("\"SK\""));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn default_timestamp_spec() {
        assert_eq!(
            serde_json::to_value(TimestampSpec::default()).unwrap(),
            json!({"column": "Date", "format": "millis", "missingValue": 0})
        );
    }
}
