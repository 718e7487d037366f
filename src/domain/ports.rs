use crate::domain::model::{
    LoadResult, Provisioned, Provisioning, TableRow, TableTarget, VerificationOutcome,
};
use crate::utils::error::Result;

/// Produces the raw records of one run. Every call re-reads the source from
/// the beginning.
pub trait RecordSource {
    type Record;

    fn read_records(&self) -> Result<Vec<Self::Record>>;
    fn describe(&self) -> String;
}

/// Pure per-record mapping. Must not perform I/O.
pub trait Transformer {
    type Input;
    type Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}

pub trait SinkProvisioner {
    /// Make the destination ready for writes. Safe to call on every run.
    fn provision(&self) -> Result<Provisioning>;
    fn describe(&self) -> String;
}

pub trait Loader {
    type Record;

    fn load(&self, records: &[Self::Record]) -> Result<LoadResult>;
}

pub trait Verifier: Loader {
    /// Read the sink back and compare it with what was loaded.
    fn verify(&self, expected: &[Self::Record]) -> Result<VerificationOutcome>;
}

/// Statement capability of a relational store. Connection details live in
/// the implementation; each call acquires and releases its own connection.
pub trait RelationalStore {
    fn create_database_if_absent(&self, database: &str) -> Result<Provisioned>;
    fn create_table_if_absent(&self, target: &TableTarget) -> Result<Provisioned>;
    /// Insert all rows in one transaction; nothing is committed on failure.
    fn insert_rows(&self, target: &TableTarget, rows: &[TableRow]) -> Result<usize>;
    fn select_rows(&self, target: &TableTarget) -> Result<Vec<TableRow>>;
    /// Stored DDL of the table, `None` when the table does not exist.
    fn table_definition(&self, target: &TableTarget) -> Result<Option<String>>;
}
