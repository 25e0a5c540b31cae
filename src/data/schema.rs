use std::fmt;

use serde::{
    Deserialize,
    Serialize
};

use crate::data::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Float64,
    Int64
}

impl ColumnType {
    /// Int64 columns may stand in where Float64 is expected.
    fn accepts(&self, actual: ColumnType) -> bool {
        match self {
            ColumnType::Float64 => true,
            ColumnType::Int64 => actual == ColumnType::Int64
        }
    }
}

/// Expected columns of an input table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType)>
}

impl Schema {
    pub fn new() -> Schema {
        Schema { columns: Vec::new() }
    }

    pub fn with(mut self, name: &str, column_type: ColumnType) -> Schema {
        self.columns.push((name.to_owned(), column_type));
        self
    }

    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MistypedColumn {
    pub name: String,
    pub expected: ColumnType,
    pub actual: ColumnType
}

/// Outcome of checking a table against a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaValidation {
    missing: Vec<String>,
    mistyped: Vec<MistypedColumn>
}

impl SchemaValidation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.mistyped.is_empty()
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn mistyped(&self) -> &[MistypedColumn] {
        &self.mistyped
    }
}

impl fmt::Display for SchemaValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "valid");
        }
        let mut parts: Vec<String> = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing columns [{}]", self.missing.join(", ")));
        }
        for column in &self.mistyped {
            parts.push(format!(
                "column '{}' is {:?}, expected {:?}", column.name, column.actual, column.expected
            ));
        }
        write!(f, "{}", parts.join("; "))
    }
}

pub fn validate_schema(table: &Table, schema: &Schema) -> SchemaValidation {
    let mut validation = SchemaValidation::default();
    for (name, expected) in schema.columns() {
        match table.column(name) {
            None => validation.missing.push(name.to_owned()),
            Some(column) => {
                let actual = column.column_type();
                if !expected.accepts(actual) {
                    validation.mistyped.push(MistypedColumn {
                        name: name.to_owned(),
                        expected: *expected,
                        actual
                    });
                }
            }
        }
    }
    validation
}
