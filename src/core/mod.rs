pub mod etl;
pub mod transform;

pub use crate::domain::model::{LoadResult, TableRow, VerificationOutcome};
pub use crate::domain::ports::{Loader, RecordSource, SinkProvisioner, Transformer, Verifier};
pub use crate::utils::error::Result;
pub use etl::{EtlEngine, PipelineFailure, PipelineState, RunReport};
pub use transform::{TableRowParser, Uppercase};
