mod column;
mod entity;


pub use column::{AppType, ColumnDecl, ColumnKind, ColumnMeta, resolve};
pub use entity::{EntityDecl, EntityMeta};

use thiserror::Error as ThisError;

///
/// SchemaError
/// registration-time failures; fatal to the entity being registered
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("unknown column type '{type_name}'")]
    UnknownTypeKind { type_name: String },

    #[error("type '{type_name}' does not accept a precision (got {precision})")]
    PrecisionNotAllowed { type_name: String, precision: u8 },

    #[error("precision {precision} exceeds max {max}")]
    PrecisionOutOfRange { precision: u8, max: u8 },

    #[error("application type {app} is not supported by storage type '{type_name}'")]
    ApplicationTypeUnsupported { app: AppType, type_name: String },

    #[error("duplicate column name '{name}'")]
    DuplicateColumnName { name: String },

    #[error("entity '{entity}' declares no primary key column")]
    NoPrimaryKeyDeclared { entity: String },

    #[error("entity name '{name}' is invalid: {reason}")]
    InvalidEntityName { name: String, reason: &'static str },

    #[error("column name '{name}' is invalid: {reason}")]
    InvalidColumnName { name: String, reason: &'static str },
}

/// Identifiers are non-empty ASCII with no surrounding whitespace.
fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty");
    }
    if !name.is_ascii() {
        return Err("must be ASCII");
    }
    if name.trim() != name {
        return Err("leading or trailing whitespace");
    }

    Ok(())
}
