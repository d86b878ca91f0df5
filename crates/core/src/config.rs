use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional numeric setting. Present but unparseable is an error,
/// never a silent fallback.
fn parse_u64(key: &'static str, raw: Option<String>) -> Result<Option<u64>, CoreError> {
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|_| CoreError::Invalid { key, value })
    })
    .transpose()
}

fn profiled_env_u64(profile: &str, key: &'static str, default: u64) -> Result<u64, CoreError> {
    Ok(parse_u64(key, profiled_env_opt(profile, key))?.unwrap_or(default))
}

fn profiled_env_u64_opt(profile: &str, key: &'static str) -> Result<Option<u64>, CoreError> {
    parse_u64(key, profiled_env_opt(profile, key))
}

// ── Top-level config ──────────────────────────────────────────

/// Process-wide settings, built once at startup and passed by reference
/// into every component constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub druid: DruidConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `REPAN_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, CoreError> {
        let profile = env_or("REPAN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, CoreError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            druid: DruidConfig::from_env_profiled(p)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  storage:  endpoint={}, pipelines={}, parquets={}",
            self.storage.endpoint_url.as_deref().unwrap_or("(local)"),
            self.storage.pipelines_bucket,
            self.storage.parquet_bucket
        );
        tracing::info!(
            "  druid:    coordinator={}, poll={}s",
            self.druid.coordinator_url.as_deref().unwrap_or("(none)"),
            self.druid.poll_interval_secs
        );
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "storage": {
                "endpoint_url": self.storage.endpoint_url,
                "region": self.storage.region,
                "pipelines_bucket": self.storage.pipelines_bucket,
                "parquet_bucket": self.storage.parquet_bucket,
                "configured": self.storage.is_configured(),
            },
            "druid": {
                "coordinator_url": self.druid.coordinator_url,
                "admin_user": self.druid.admin_user,
                "poll_interval_secs": self.druid.poll_interval_secs,
                "max_polls": self.druid.max_polls,
                "deadline_secs": self.druid.deadline_secs,
                "max_transport_errors": self.druid.max_transport_errors,
            },
        })
    }
}

// ── Object storage (MinIO / S3) ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: String,
    pub pipelines_bucket: String,
    pub parquet_bucket: String,
    /// Root directory used when no object store is configured.
    pub local_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            endpoint_url: profiled_env_opt(p, "MINIO_URL"),
            access_key_id: profiled_env_opt(p, "MINIO_ACCESS_KEY"),
            secret_access_key: profiled_env_opt(p, "MINIO_SECRET_KEY"),
            // MinIO has no regions, but the S3 signer insists on one.
            region: profiled_env_or(p, "MINIO_REGION", "us-east-1"),
            pipelines_bucket: profiled_env_or(p, "PIPELINES_BUCKET", "pipelines"),
            parquet_bucket: profiled_env_or(p, "PARQUET_BUCKET", "parquets"),
            local_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }

    /// Endpoint with an explicit scheme; plain `host:port` is taken as HTTP.
    pub fn endpoint_with_scheme(&self) -> Option<String> {
        self.endpoint_url.as_deref().map(with_http_scheme)
    }
}

/// Prefix `http://` unless the endpoint already carries a scheme.
pub fn with_http_scheme(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

// ── Druid ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DruidConfig {
    pub coordinator_url: Option<String>,
    pub admin_user: String,
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
    pub poll_interval_secs: u64,
    /// Unset = poll until a terminal status is observed.
    pub max_polls: Option<u64>,
    pub deadline_secs: Option<u64>,
    pub max_transport_errors: Option<u64>,
}

impl DruidConfig {
    fn from_env_profiled(p: &str) -> Result<Self, CoreError> {
        Ok(Self {
            coordinator_url: profiled_env_opt(p, "DRUID_COORDINATOR_URL"),
            admin_user: profiled_env_or(p, "DRUID_ADMIN_USER", "admin"),
            admin_password: profiled_env_opt(p, "DRUID_ADMIN_PASSWORD"),
            poll_interval_secs: profiled_env_u64(p, "DRUID_POLL_INTERVAL_SECS", 5)?,
            max_polls: profiled_env_u64_opt(p, "DRUID_MAX_POLLS")?,
            deadline_secs: profiled_env_u64_opt(p, "DRUID_DEADLINE_SECS")?,
            max_transport_errors: profiled_env_u64_opt(p, "DRUID_MAX_TRANSPORT_ERRORS")?,
        })
    }

    /// Coordinator base URL with any trailing slash removed.
    pub fn coordinator(&self) -> Result<&str, CoreError> {
        self.coordinator_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or(CoreError::Missing("DRUID_COORDINATOR_URL"))
    }

    pub fn poll_interval(&self) -> Result<Duration, CoreError> {
        if self.poll_interval_secs == 0 {
            return Err(CoreError::Invalid {
                key: "DRUID_POLL_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }
        Ok(Duration::from_secs(self.poll_interval_secs))
    }
}
