use serde::Deserialize;
use thiserror::Error;

use crate::data::schema::SchemaValidation;

#[derive(Debug, Error)]
pub enum ToolboxError {
    #[error("table '{table}' does not match schema: {validation}")]
    SchemaViolation {
        table: String,
        validation: SchemaValidation
    },

    #[error("{0}")]
    NumericDomain(String),

    #[error("fragility curve load range {fragility:?} does not overlap exceedance load range {exceedance:?}")]
    RangeViolation {
        fragility: (f64, f64),
        exceedance: (f64, f64)
    },

    #[error("no exceedance frequency data for section {0}")]
    MissingSection(i64),

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error(transparent)]
    JsonParse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error)
}

pub type Result<T> = std::result::Result<T, ToolboxError>;

impl ToolboxError {
    pub fn numeric_domain(message: impl Into<String>) -> ToolboxError {
        ToolboxError::NumericDomain(message.into())
    }
}

pub fn parse_json_value<T>(json_value: serde_json::Value) -> Result<T>
    where T: for<'a> Deserialize<'a> {
    serde_json::from_value(json_value).map_err(ToolboxError::JsonParse)
}
