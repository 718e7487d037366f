use crate::domain::model::{CsvRow, SchemaDefinition, TableRow, TextLine};
use crate::domain::ports::Transformer;
use crate::utils::error::{EtlError, Result};

/// Uppercases every character of a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uppercase;

impl Transformer for Uppercase {
    type Input = TextLine;
    type Output = String;

    fn transform(&self, input: TextLine) -> Result<String> {
        Ok(input.text.to_uppercase())
    }
}

/// Interprets CSV fields as typed table columns. No values are rewritten;
/// rows that do not fit the schema are rejected.
#[derive(Debug, Clone)]
pub struct TableRowParser {
    schema: SchemaDefinition,
}

impl TableRowParser {
    pub fn new(schema: SchemaDefinition) -> Self {
        Self { schema }
    }

    fn field<'a>(&self, row: &'a CsvRow, name: &str) -> Result<&'a str> {
        row.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| EtlError::MalformedRecord {
                line: row.line,
                reason: format!("missing column {}", name),
            })
    }
}

impl Transformer for TableRowParser {
    type Input = CsvRow;
    type Output = TableRow;

    fn transform(&self, input: CsvRow) -> Result<TableRow> {
        let raw_key = self.field(&input, &self.schema.key_column)?;
        let key = raw_key
            .trim()
            .parse::<i64>()
            .map_err(|e| EtlError::MalformedRecord {
                line: input.line,
                reason: format!("{} {:?} is not an integer: {}", self.schema.key_column, raw_key, e),
            })?;

        let mut values = Vec::with_capacity(self.schema.columns.len());
        for column in &self.schema.columns {
            let value = self.field(&input, &column.name)?;
            let length = value.chars().count();
            if length > column.width {
                return Err(EtlError::MalformedRecord {
                    line: input.line,
                    reason: format!(
                        "{} is {} characters, column allows {}",
                        column.name, length, column.width
                    ),
                });
            }
            values.push(value.to_string());
        }

        Ok(TableRow { key, values })
    }
}
