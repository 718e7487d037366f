pub mod csv_db_pipeline;
pub mod text_pipeline;

pub use csv_db_pipeline::{csv_to_database_pipeline, CsvToDatabasePipeline};
pub use text_pipeline::{text_pipeline, TextPipeline};
