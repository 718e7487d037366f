use crate::adapters::{CsvSource, DatabaseSink};
use crate::core::{EtlEngine, TableRowParser};
use crate::domain::model::TableTarget;
use crate::domain::ports::RelationalStore;
use std::path::PathBuf;

/// Imports a headed CSV file into a relational table.
pub type CsvToDatabasePipeline<R> = EtlEngine<CsvSource, TableRowParser, DatabaseSink<R>>;

pub fn csv_to_database_pipeline<R: RelationalStore>(
    name: impl Into<String>,
    source_path: impl Into<PathBuf>,
    store: R,
    target: TableTarget,
) -> CsvToDatabasePipeline<R> {
    let parser = TableRowParser::new(target.schema.clone());
    EtlEngine::new(
        name,
        CsvSource::new(source_path),
        parser,
        DatabaseSink::new(store, target),
    )
}
