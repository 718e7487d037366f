use crate::domain::model::{LoadResult, Mismatch, Provisioning, TableRow, TableTarget, VerificationOutcome};
use crate::domain::ports::{Loader, RelationalStore, SinkProvisioner, Verifier};
use crate::utils::error::Result;
use std::collections::HashMap;

/// Relational destination. Rows are appended; keys must be new.
pub struct DatabaseSink<R: RelationalStore> {
    store: R,
    target: TableTarget,
}

impl<R: RelationalStore> DatabaseSink<R> {
    pub fn new(store: R, target: TableTarget) -> Self {
        Self { store, target }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn target(&self) -> &TableTarget {
        &self.target
    }
}

impl<R: RelationalStore> SinkProvisioner for DatabaseSink<R> {
    fn provision(&self) -> Result<Provisioning> {
        let database = self.store.create_database_if_absent(&self.target.database)?;
        let table = self.store.create_table_if_absent(&self.target)?;
        tracing::debug!(
            "Provisioned {}.{}: database {:?}, table {:?}",
            self.target.database,
            self.target.table,
            database,
            table
        );
        Ok(Provisioning {
            database: Some(database),
            table: Some(table),
        })
    }

    fn describe(&self) -> String {
        format!("database:{}.{}", self.target.database, self.target.table)
    }
}

impl<R: RelationalStore> Loader for DatabaseSink<R> {
    type Record = TableRow;

    fn load(&self, records: &[TableRow]) -> Result<LoadResult> {
        let inserted = self.store.insert_rows(&self.target, records)?;
        Ok(LoadResult {
            records_written: inserted,
            confirmed: inserted == records.len(),
        })
    }
}

impl<R: RelationalStore> Verifier for DatabaseSink<R> {
    /// Rows left by earlier runs are expected and ignored; only the rows of
    /// this load are checked.
    fn verify(&self, expected: &[TableRow]) -> Result<VerificationOutcome> {
        let stored: HashMap<i64, TableRow> = self
            .store
            .select_rows(&self.target)?
            .into_iter()
            .map(|row| (row.key, row))
            .collect();

        let mismatches = expected
            .iter()
            .enumerate()
            .filter_map(|(index, want)| match stored.get(&want.key) {
                None => Some(Mismatch::MissingRecord {
                    index,
                    expected: want.to_string(),
                }),
                Some(got) if got != want => Some(Mismatch::RecordDiffers {
                    index,
                    expected: want.to_string(),
                    actual: got.to_string(),
                }),
                Some(_) => None,
            })
            .collect();

        Ok(VerificationOutcome {
            checked: expected.len(),
            mismatches,
        })
    }
}
