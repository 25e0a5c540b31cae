use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize
};

use crate::data::schema::ColumnType;
use crate::error::toolboxerror::{
    Result,
    ToolboxError
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Float64(Vec<f64>),
    Int64(Vec<i64>)
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float64(values) => values.len(),
            Column::Int64(values) => values.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Float64(_) => ColumnType::Float64,
            Column::Int64(_) => ColumnType::Int64
        }
    }

    /// Float view of the column; integer columns are widened.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Column::Float64(values) => values.clone(),
            Column::Int64(values) => values.iter().map(|&v| v as f64).collect()
        }
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            Column::Int64(values) => Some(values),
            Column::Float64(_) => None
        }
    }

    fn select(&self, rows: &[usize]) -> Column {
        match self {
            Column::Float64(values) => Column::Float64(rows.iter().map(|&i| values[i]).collect()),
            Column::Int64(values) => Column::Int64(rows.iter().map(|&i| values[i]).collect())
        }
    }
}

#[derive(Deserialize)]
struct TableJsonProp {
    columns: BTreeMap<String, Column>
}

impl TryFrom<TableJsonProp> for Table {
    type Error = ToolboxError;

    fn try_from(json_prop: TableJsonProp) -> Result<Table> {
        Table::from_columns(json_prop.columns)
    }
}

/// Named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableJsonProp")]
pub struct Table {
    columns: BTreeMap<String, Column>
}

impl Table {
    pub fn new() -> Table {
        Table { columns: BTreeMap::new() }
    }

    pub fn from_columns(columns: BTreeMap<String, Column>) -> Result<Table> {
        columns.into_iter()
            .try_fold(Table::new(), |table, (name, column)| table.with_column(name, column))
    }

    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Table> {
        let name = name.into();
        if let Some(rows) = self.num_rows_opt() {
            if rows != column.len() {
                return Err(ToolboxError::numeric_domain(format!(
                    "column '{}' has {} rows, table has {}", name, column.len(), rows
                )));
            }
        }
        self.columns.insert(name, column);
        Ok(self)
    }

    fn num_rows_opt(&self) -> Option<usize> {
        self.columns.values().next().map(Column::len)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows_opt().unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn float_column(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)
            .map(Column::to_f64)
            .ok_or_else(|| ToolboxError::numeric_domain(format!("column '{}' not present", name)))
    }

    pub fn int_column(&self, name: &str) -> Result<Vec<i64>> {
        let column = self.column(name)
            .ok_or_else(|| ToolboxError::numeric_domain(format!("column '{}' not present", name)))?;
        column.as_i64()
            .map(<[i64]>::to_vec)
            .ok_or_else(|| ToolboxError::numeric_domain(format!("column '{}' is not Int64", name)))
    }

    /// Rows at the given indices, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns
                .iter()
                .map(|(name, column)| (name.to_owned(), column.select(rows)))
                .collect()
        }
    }
}
