pub mod pipelines;

use crate::adapters::SqliteStore;
use crate::config::EtlConfig;
use crate::core::{PipelineFailure, PipelineState, RunReport};
use crate::domain::model::SinkTarget;
use crate::utils::error::EtlError;
use crate::utils::validation::Validate;
use pipelines::{csv_to_database_pipeline, text_pipeline};

/// Validate `config`, build the pipeline its sink target calls for, and run it once.
pub fn run_configured(config: &EtlConfig) -> Result<RunReport, PipelineFailure> {
    let idle_failure = |source: EtlError| PipelineFailure {
        stage: PipelineState::Idle,
        source,
    };

    config.validate().map_err(idle_failure)?;

    let name = config.pipeline.name.clone();
    let strict = config.pipeline.strict_verification;
    let monitor = config.monitoring_enabled();

    match &config.sink_target {
        SinkTarget::File { path } => text_pipeline(name, &config.source_path, path)
            .with_strict_verification(strict)
            .with_monitoring(monitor)
            .run(),
        SinkTarget::Database { .. } => {
            let (Some(connection), Some(target)) = (&config.connection, config.table_target())
            else {
                return Err(idle_failure(EtlError::MissingConfigError {
                    field: "connection".to_string(),
                }));
            };
            let store = SqliteStore::new(&connection.data_dir, config.busy_timeout());
            csv_to_database_pipeline(name, &config.source_path, store, target)
                .with_strict_verification(strict)
                .with_monitoring(monitor)
                .run()
        }
    }
}
