use crate::domain::model::{Provisioned, TableRow, TableTarget};
use crate::domain::ports::RelationalStore;
use crate::utils::error::{EtlError, Result};
use rusqlite::types::Value;
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Written into every database this store creates ("FLET").
const APPLICATION_ID: i32 = 0x464C_4554;

/// SQLite-backed relational store. Each named database is a `<name>.db` file
/// inside `data_dir`; the directory plays the role of the database server.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    data_dir: PathBuf,
    busy_timeout: Duration,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
    )
}

fn create_table_sql(target: &TableTarget) -> String {
    let schema = &target.schema;
    let mut columns = vec![format!("{} INTEGER PRIMARY KEY", quote_ident(&schema.key_column))];
    columns.extend(
        schema
            .columns
            .iter()
            .map(|c| format!("{} VARCHAR({})", quote_ident(&c.name), c.width)),
    );
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&target.table),
        columns.join(", ")
    )
}

fn insert_sql(target: &TableTarget) -> String {
    let names: Vec<String> = target.schema.column_names().map(quote_ident).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&target.table),
        names.join(", "),
        placeholders.join(", ")
    )
}

fn select_sql(target: &TableTarget) -> String {
    let names: Vec<String> = target.schema.column_names().map(quote_ident).collect();
    format!(
        "SELECT {} FROM {} ORDER BY {}",
        names.join(", "),
        quote_ident(&target.table),
        quote_ident(&target.schema.key_column)
    )
}

impl SqliteStore {
    pub fn new(data_dir: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            data_dir: data_dir.into(),
            busy_timeout,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self, database: &str) -> PathBuf {
        self.data_dir.join(format!("{}.db", database))
    }

    fn unreachable(&self, database: &str, reason: impl Into<String>) -> EtlError {
        EtlError::SinkUnreachable {
            target: self.database_path(database).display().to_string(),
            reason: reason.into(),
        }
    }

    /// Errors meaning "the store cannot be used" become `SinkUnreachable`;
    /// everything else stays a plain database error.
    fn classify(&self, database: &str, err: rusqlite::Error) -> EtlError {
        let unreachable = matches!(
            &err,
            rusqlite::Error::SqliteFailure(e, _) if matches!(
                e.code,
                ErrorCode::CannotOpen
                    | ErrorCode::PermissionDenied
                    | ErrorCode::ReadOnly
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::SystemIoFailure
            )
        );
        if unreachable {
            self.unreachable(database, err.to_string())
        } else {
            EtlError::DatabaseError(err)
        }
    }

    fn ensure_reachable(&self, database: &str) -> Result<()> {
        if !self.data_dir.is_dir() {
            return Err(self.unreachable(
                database,
                format!("data directory {} does not exist", self.data_dir.display()),
            ));
        }
        Ok(())
    }

    fn open(&self, database: &str, flags: OpenFlags) -> Result<Connection> {
        let conn = Connection::open_with_flags(self.database_path(database), flags)
            .map_err(|e| self.classify(database, e))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| self.classify(database, e))?;
        Ok(conn)
    }

    fn connect(&self, database: &str) -> Result<Connection> {
        self.ensure_reachable(database)?;
        if !self.database_path(database).exists() {
            return Err(self.unreachable(database, "database does not exist"));
        }
        self.open(
            database,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn table_columns(&self, conn: &Connection, target: &TableTarget) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(&target.table)))
            .map_err(|e| self.classify(&target.database, e))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

impl RelationalStore for SqliteStore {
    fn create_database_if_absent(&self, database: &str) -> Result<Provisioned> {
        self.ensure_reachable(database)?;

        if self.database_path(database).exists() {
            // Must really be a database, not just any file with the right name.
            let conn = self.connect(database)?;
            conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
                .map_err(|e| self.classify(database, e))?;
            tracing::debug!("Database {} already exists", database);
            return Ok(Provisioned::AlreadyPresent);
        }

        let conn = self.open(
            database,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        // Forces the file header to disk so the database exists before any table does.
        conn.pragma_update(None, "application_id", APPLICATION_ID)
            .map_err(|e| self.classify(database, e))?;

        tracing::info!("Created database {}", database);
        Ok(Provisioned::Created)
    }

    fn create_table_if_absent(&self, target: &TableTarget) -> Result<Provisioned> {
        let conn = self.connect(&target.database)?;
        let existed = self.table_definition_on(&conn, target)?.is_some();

        conn.execute_batch(&create_table_sql(target))
            .map_err(|e| self.classify(&target.database, e))?;

        if !existed {
            tracing::info!("Created table {}.{}", target.database, target.table);
            return Ok(Provisioned::Created);
        }

        let expected: Vec<&str> = target.schema.column_names().collect();
        let actual = self.table_columns(&conn, target)?;
        if actual != expected {
            return Err(EtlError::SinkUnreachable {
                target: format!("{}.{}", target.database, target.table),
                reason: format!(
                    "existing table has columns {:?}, schema definition expects {:?}",
                    actual, expected
                ),
            });
        }
        Ok(Provisioned::AlreadyPresent)
    }

    fn insert_rows(&self, target: &TableTarget, rows: &[TableRow]) -> Result<usize> {
        let mut conn = self.connect(&target.database)?;
        let tx = conn
            .transaction()
            .map_err(|e| self.classify(&target.database, e))?;

        {
            let mut stmt = tx
                .prepare(&insert_sql(target))
                .map_err(|e| self.classify(&target.database, e))?;

            for row in rows {
                let mut params = Vec::with_capacity(row.values.len() + 1);
                params.push(Value::Integer(row.key));
                params.extend(row.values.iter().cloned().map(Value::Text));

                stmt.execute(params_from_iter(params)).map_err(|e| {
                    if is_duplicate_key(&e) {
                        EtlError::DuplicateKey {
                            table: target.table.clone(),
                            key: row.key,
                        }
                    } else {
                        self.classify(&target.database, e)
                    }
                })?;
            }
        }

        tx.commit()
            .map_err(|e| self.classify(&target.database, e))?;
        tracing::debug!("Committed {} rows into {}.{}", rows.len(), target.database, target.table);
        Ok(rows.len())
    }

    fn select_rows(&self, target: &TableTarget) -> Result<Vec<TableRow>> {
        let conn = self.connect(&target.database)?;
        let width = target.schema.columns.len();

        let mut stmt = conn
            .prepare(&select_sql(target))
            .map_err(|e| self.classify(&target.database, e))?;
        let rows = stmt
            .query_map([], |row| {
                let key: i64 = row.get(0)?;
                let mut values = Vec::with_capacity(width);
                for index in 1..=width {
                    // NULL reads back as an empty string
                    let value: Option<String> = row.get(index)?;
                    values.push(value.unwrap_or_default());
                }
                Ok(TableRow { key, values })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn table_definition(&self, target: &TableTarget) -> Result<Option<String>> {
        let conn = self.connect(&target.database)?;
        self.table_definition_on(&conn, target)
    }
}

impl SqliteStore {
    fn table_definition_on(&self, conn: &Connection, target: &TableTarget) -> Result<Option<String>> {
        conn.query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [&target.table],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| self.classify(&target.database, e))
    }
}
