// Adapters layer: concrete sources and sinks behind the domain ports.

pub mod database_sink;
pub mod file_sink;
pub mod source;
pub mod sqlite_store;

pub use database_sink::DatabaseSink;
pub use file_sink::FileSink;
pub use source::{CsvSource, LineSource};
pub use sqlite_store::SqliteStore;
