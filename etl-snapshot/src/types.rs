use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identifier of the pipeline that owns a tracker.
pub type PipelineId = u64;

/// Separator between the parts of a [`TableId`] in its string form.
const TABLE_ID_SEPARATOR: char = '.';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseTableIdError {
    #[error("The table identifier is empty")]
    Empty,

    #[error("The table identifier '{0}' contains an empty part")]
    EmptyPart(String),

    #[error("The table identifier '{0}' has more than three parts")]
    TooManyParts(String),
}

/// A fully qualified table identifier, made of an optional catalog, an optional schema and a
/// table name.
///
/// The [`fmt::Display`] form joins the present parts with `.` and is the key under which the
/// snapshot tracker stores every per-table fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub table: String,
}

impl TableId {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> TableId {
        Self {
            catalog: None,
            schema: Some(schema.into()),
            table: table.into(),
        }
    }

    pub fn with_catalog(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> TableId {
        Self {
            catalog: Some(catalog.into()),
            schema: Some(schema.into()),
            table: table.into(),
        }
    }

    /// Creates an identifier for a table that lives outside any schema.
    pub fn unqualified(table: impl Into<String>) -> TableId {
        Self {
            catalog: None,
            schema: None,
            table: table.into(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(catalog) = &self.catalog {
            write!(f, "{catalog}{TABLE_ID_SEPARATOR}")?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "{schema}{TABLE_ID_SEPARATOR}")?;
        }

        f.write_str(&self.table)
    }
}

impl FromStr for TableId {
    type Err = ParseTableIdError;

    /// Parses `table`, `schema.table` or `catalog.schema.table`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseTableIdError::Empty);
        }

        let parts: Vec<&str> = s.split(TABLE_ID_SEPARATOR).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ParseTableIdError::EmptyPart(s.to_string()));
        }

        match parts.as_slice() {
            [table] => Ok(TableId::unqualified(*table)),
            [schema, table] => Ok(TableId::new(*schema, *table)),
            [catalog, schema, table] => Ok(TableId::with_catalog(*catalog, *schema, *table)),
            _ => Err(ParseTableIdError::TooManyParts(s.to_string())),
        }
    }
}
