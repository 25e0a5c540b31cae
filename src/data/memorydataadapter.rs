use std::collections::{
    BTreeMap,
    HashMap
};
use std::io::Read;

use serde::Deserialize;
use tracing::debug;

use crate::data::dataadapter::DataAdapter;
use crate::data::table::{
    Column,
    Table
};
use crate::error::toolboxerror::{
    Result,
    ToolboxError,
    parse_json_value
};

#[derive(Deserialize)]
struct NamedTableJsonProp {
    name: String,
    columns: BTreeMap<String, Column>
}

/// Tables held in memory under their logical name.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataAdapter {
    tables: HashMap<String, Table>
}

impl MemoryDataAdapter {
    pub fn new() -> MemoryDataAdapter {
        MemoryDataAdapter { tables: HashMap::new() }
    }

    pub fn with_table(mut self, name: &str, table: Table) -> MemoryDataAdapter {
        self.tables.insert(name.to_owned(), table);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn insert_table_from_json(&mut self, json_value: serde_json::Value) -> Result<()> {
        let json_prop: NamedTableJsonProp = parse_json_value(json_value)?;
        let table = Table::from_columns(json_prop.columns)?;
        debug!(name = %json_prop.name, rows = table.num_rows(), "table loaded");
        self.tables.insert(json_prop.name, table);
        Ok(())
    }

    pub fn insert_tables_from_json_vec(&mut self, json_vec: &[serde_json::Value]) -> Result<()> {
        for j in json_vec.iter() {
            self.insert_table_from_json(j.clone())?;
        }
        Ok(())
    }

    /// Load one named table or an array of them, e.g.
    /// `[{"name": "fragility_curve", "columns": {"hydraulicload": {"Float64": [...]}}}]`.
    pub fn from_reader<R: Read>(reader: R) -> Result<MemoryDataAdapter> {
        let json_value: serde_json::Value = serde_json::from_reader(reader)?;
        MemoryDataAdapter::from_json_value(json_value)
    }

    pub fn from_json_value(json_value: serde_json::Value) -> Result<MemoryDataAdapter> {
        let mut adapter = MemoryDataAdapter::new();
        if json_value.is_array() {
            let json_array: Vec<serde_json::Value> = parse_json_value(json_value)?;
            adapter.insert_tables_from_json_vec(&json_array)?;
        } else {
            adapter.insert_table_from_json(json_value)?;
        }
        Ok(adapter)
    }
}

impl DataAdapter for MemoryDataAdapter {
    fn read(&self, name: &str) -> Result<Table> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| ToolboxError::TableNotFound(name.to_owned()))
    }

    fn write(&mut self, name: &str, table: Table) -> Result<()> {
        self.tables.insert(name.to_owned(), table);
        Ok(())
    }
}
