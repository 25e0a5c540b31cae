use crate::data::schema::{
    Schema,
    validate_schema
};
use crate::data::table::Table;
use crate::error::toolboxerror::{
    Result,
    ToolboxError
};

/// Boundary between the numeric core and whatever stores the tables.
///
/// Implementations resolve logical names (`"fragility_curve"`,
/// `"exceedance_frequency"`, ...) to tables; the core never sees files,
/// sockets or databases.
pub trait DataAdapter {
    fn read(&self, name: &str) -> Result<Table>;

    fn write(&mut self, name: &str, table: Table) -> Result<()>;

    /// Read a table and check it against `schema` before handing it out.
    fn input(&self, name: &str, schema: &Schema) -> Result<Table> {
        let table = self.read(name)?;
        let validation = validate_schema(&table, schema);
        if validation.is_valid() {
            Ok(table)
        } else {
            Err(ToolboxError::SchemaViolation {
                table: name.to_owned(),
                validation
            })
        }
    }

    fn output(&mut self, name: &str, table: Table) -> Result<()> {
        self.write(name, table)
    }
}
