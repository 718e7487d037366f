pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use app::run_configured;
pub use config::EtlConfig;
pub use crate::core::{EtlEngine, PipelineFailure, PipelineState, RunReport};
pub use utils::error::{EtlError, Result};
