use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// One line of a line-oriented source, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub line: u64,
    pub text: String,
}

/// One data row of a delimited source, keyed by header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: u64,
    pub fields: HashMap<String, String>,
}

/// A typed row for the relational sink: integer primary key followed by the
/// text columns in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: i64,
    pub values: Vec<String>,
}

impl fmt::Display for TableRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.key)?;
        for value in &self.values {
            write!(f, ", {:?}", value)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkTarget {
    File { path: PathBuf },
    Database { database: String, table: String },
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::File { path } => write!(f, "file:{}", path.display()),
            SinkTarget::Database { database, table } => write!(f, "{}.{}", database, table),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextColumn {
    pub name: String,
    pub width: usize,
}

/// Fixed table layout: an integer primary key plus bounded-length text columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub key_column: String,
    pub columns: Vec<TextColumn>,
}

impl Default for SchemaDefinition {
    fn default() -> Self {
        Self {
            key_column: "id_no".to_string(),
            columns: vec![
                TextColumn {
                    name: "first_name".to_string(),
                    width: 25,
                },
                TextColumn {
                    name: "last_name".to_string(),
                    width: 25,
                },
            ],
        }
    }
}

impl SchemaDefinition {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key_column.as_str()).chain(self.columns.iter().map(|c| c.name.as_str()))
    }
}

/// A relational destination: database name, table name and the table layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub database: String,
    pub table: String,
    pub schema: SchemaDefinition,
}

/// Whether a provisioning level had to be created on this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provisioned {
    Created,
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provisioning {
    pub database: Option<Provisioned>,
    pub table: Option<Provisioned>,
}

impl Provisioning {
    pub fn none_required() -> Self {
        Self {
            database: None,
            table: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    pub records_written: usize,
    /// File sink: destination exists. Database sink: every record was inserted.
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    CountDiffers {
        expected: usize,
        actual: usize,
    },
    RecordDiffers {
        index: usize,
        expected: String,
        actual: String,
    },
    MissingRecord {
        index: usize,
        expected: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::CountDiffers { expected, actual } => {
                write!(f, "expected {} records, found {}", expected, actual)
            }
            Mismatch::RecordDiffers {
                index,
                expected,
                actual,
            } => write!(f, "record {}: expected {:?}, found {:?}", index, expected, actual),
            Mismatch::MissingRecord { index, expected } => {
                write!(f, "record {} missing: expected {:?}", index, expected)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl VerificationOutcome {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}
