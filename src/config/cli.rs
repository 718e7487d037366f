use crate::config::{EtlConfig, MonitoringConfig};
use crate::utils::error::{EtlError, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "flat-etl")]
#[command(about = "Load a flat file into a text file or a SQLite table and verify the result")]
pub struct CliArgs {
    /// Path to a TOML pipeline configuration
    #[arg(short, long, conflicts_with_all = ["source", "output"])]
    pub config: Option<PathBuf>,

    /// Text file to uppercase (shorthand for a file-to-file pipeline)
    #[arg(long, requires = "output")]
    pub source: Option<PathBuf>,

    /// Destination file for --source
    #[arg(long, requires = "source")]
    pub output: Option<PathBuf>,

    /// Report verification mismatches instead of failing the run
    #[arg(long)]
    pub lenient: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory after each stage")]
    pub monitor: bool,

    #[arg(long, help = "Print the run report as JSON")]
    pub json: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliArgs {
    /// Resolve the configuration and apply command-line overrides.
    pub fn to_config(&self) -> Result<EtlConfig> {
        let mut config = match (&self.config, &self.source, &self.output) {
            (Some(path), _, _) => EtlConfig::from_file(path)?,
            (None, Some(source), Some(output)) => EtlConfig::text_pipeline(source, output),
            _ => {
                return Err(EtlError::MissingConfigError {
                    field: "--config or --source/--output".to_string(),
                })
            }
        };

        if self.monitor {
            config.monitoring = Some(MonitoringConfig { enabled: true });
        }
        if self.lenient {
            config.pipeline.strict_verification = false;
        }
        Ok(config)
    }
}
