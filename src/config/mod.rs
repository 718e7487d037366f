#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::model::{SchemaDefinition, SinkTarget, TableTarget};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_identifier, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_required_field, validate_unique_names, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

/// One pipeline run: where records come from, where they go, and the table
/// layout when the destination is a database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    pub source_path: PathBuf,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    pub sink_target: SinkTarget,
    #[serde(default)]
    pub schema_definition: SchemaDefinition,
    pub connection: Option<ConnectionConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_pipeline_name")]
    pub name: String,
    #[serde(default = "default_strict_verification")]
    pub strict_verification: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            strict_verification: default_strict_verification(),
        }
    }
}

fn default_pipeline_name() -> String {
    "flat-etl".to_string()
}

fn default_strict_verification() -> bool {
    true
}

/// Where the relational store keeps its databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub data_dir: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl EtlConfig {
    /// Uppercase `source` line by line into `output`.
    pub fn text_pipeline(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source.into(),
            pipeline: PipelineSettings::default(),
            sink_target: SinkTarget::File {
                path: output.into(),
            },
            schema_definition: SchemaDefinition::default(),
            connection: None,
            monitoring: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("env substitution pattern failed to compile: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// Database destination as a table target, `None` for file sinks.
    pub fn table_target(&self) -> Option<TableTarget> {
        match &self.sink_target {
            SinkTarget::Database { database, table } => Some(TableTarget {
                database: database.clone(),
                table: table.clone(),
                schema: self.schema_definition.clone(),
            }),
            SinkTarget::File { .. } => None,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        let ms = self
            .connection
            .as_ref()
            .map(|c| c.busy_timeout_ms)
            .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
        Duration::from_millis(ms)
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        validate_path("source_path", &self.source_path.to_string_lossy())?;
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        match &self.sink_target {
            SinkTarget::File { path } => {
                validate_path("sink_target.path", &path.to_string_lossy())?;
            }
            SinkTarget::Database { database, table } => {
                validate_identifier("sink_target.database", database)?;
                validate_identifier("sink_target.table", table)?;

                let schema = &self.schema_definition;
                validate_identifier("schema_definition.key_column", &schema.key_column)?;
                validate_positive_number("schema_definition.columns", schema.columns.len(), 1)?;
                for column in &schema.columns {
                    validate_identifier("schema_definition.columns.name", &column.name)?;
                    validate_positive_number("schema_definition.columns.width", column.width, 1)?;
                }
                validate_unique_names("schema_definition.columns", schema.column_names())?;

                let connection = validate_required_field("connection", &self.connection)?;
                validate_path("connection.data_dir", &connection.data_dir.to_string_lossy())?;
                validate_range(
                    "connection.busy_timeout_ms",
                    connection.busy_timeout_ms,
                    0,
                    MAX_BUSY_TIMEOUT_MS,
                )?;
            }
        }

        Ok(())
    }
}
