use crate::{
    schema::SchemaError,
    types::MAX_FRACTIONAL_DIGITS,
    value::Value,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// AppType
/// the application-side shape a column declares for its values
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AppType {
    #[display("bool")]
    Bool,
    #[display("date")]
    Date,
    #[display("datetime")]
    DateTime,
    #[display("int")]
    Int,
    #[display("text")]
    Text,
    #[display("uint")]
    Uint,
}

impl AppType {
    /// Exact shape match; `Null` matches no application type.
    #[must_use]
    pub const fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => matches!(value, Value::Bool(_)),
            Self::Date => matches!(value, Value::Date(_)),
            Self::DateTime => matches!(value, Value::DateTime(_)),
            Self::Int => matches!(value, Value::Int(_)),
            Self::Text => matches!(value, Value::Text(_)),
            Self::Uint => matches!(value, Value::Uint(_)),
        }
    }
}

///
/// ColumnKind
/// the resolved storage descriptor for a column type name
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Bool,
    Date,
    DateTime { precision: u8 },
    Int,
    Text,
    Uint,
}

impl ColumnKind {
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Date => "date",
            Self::DateTime { .. } => "datetime",
            Self::Int => "int",
            Self::Text => "text",
            Self::Uint => "uint",
        }
    }

    /// Which application shapes this storage kind can carry.
    ///
    /// `date` storage is the permissive one: native dates, instants (the
    /// time of day truncates away on encode), and verbatim text for
    /// callers that keep date keys as plain strings.
    #[must_use]
    pub const fn supports(self, app: AppType) -> bool {
        match self {
            Self::Bool => matches!(app, AppType::Bool),
            Self::Date => matches!(app, AppType::Date | AppType::DateTime | AppType::Text),
            Self::DateTime { .. } => matches!(app, AppType::DateTime),
            Self::Int => matches!(app, AppType::Int),
            Self::Text => matches!(app, AppType::Text),
            Self::Uint => matches!(app, AppType::Uint),
        }
    }
}

///
/// Type name registry
///

/// Resolve a declared storage type name and optional precision into a
/// column kind descriptor.
///
/// Names match case-insensitively. `datetime` and `timestamp` are the only
/// kinds that accept a precision (fractional-second digits, at most 9);
/// omitting it means second-level storage.
pub fn resolve(type_name: &str, precision: Option<u8>) -> Result<ColumnKind, SchemaError> {
    let normalized = type_name.trim().to_ascii_lowercase();

    let kind = match normalized.as_str() {
        "bool" | "boolean" => ColumnKind::Bool,
        "date" => ColumnKind::Date,
        "datetime" | "timestamp" => {
            let digits = precision.unwrap_or(0);
            if digits > MAX_FRACTIONAL_DIGITS {
                return Err(SchemaError::PrecisionOutOfRange {
                    precision: digits,
                    max: MAX_FRACTIONAL_DIGITS,
                });
            }

            return Ok(ColumnKind::DateTime { precision: digits });
        }
        "int" | "integer" => ColumnKind::Int,
        "text" | "varchar" => ColumnKind::Text,
        "uint" => ColumnKind::Uint,
        _ => {
            return Err(SchemaError::UnknownTypeKind {
                type_name: type_name.to_string(),
            });
        }
    };

    if let Some(digits) = precision {
        return Err(SchemaError::PrecisionNotAllowed {
            type_name: normalized,
            precision: digits,
        });
    }

    Ok(kind)
}

///
/// ColumnDecl
/// the declaration contract handed over by the mapping layer
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnDecl {
    pub name: String,
    pub application_type: AppType,
    pub storage_type: String,
    pub precision: Option<u8>,
    pub primary_key: bool,
}

impl ColumnDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, app: AppType, storage_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_type: app,
            storage_type: storage_type.into(),
            precision: None,
            primary_key: false,
        }
    }

    #[must_use]
    pub fn with_precision(mut self, digits: u8) -> Self {
        self.precision = Some(digits);
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

///
/// ColumnMeta
/// a resolved column, immutable once its entity registers
///

#[derive(Clone, Debug, Serialize)]
pub struct ColumnMeta {
    name: String,
    kind: ColumnKind,
    application_type: AppType,
    primary_key: bool,
    position: usize,
}

impl ColumnMeta {
    pub(crate) fn resolve_decl(decl: &ColumnDecl, position: usize) -> Result<Self, SchemaError> {
        if let Err(reason) = super::validate_name(&decl.name) {
            return Err(SchemaError::InvalidColumnName {
                name: decl.name.clone(),
                reason,
            });
        }

        let kind = resolve(&decl.storage_type, decl.precision)?;
        if !kind.supports(decl.application_type) {
            return Err(SchemaError::ApplicationTypeUnsupported {
                app: decl.application_type,
                type_name: kind.type_name().to_string(),
            });
        }

        Ok(Self {
            name: decl.name.clone(),
            kind,
            application_type: decl.application_type,
            primary_key: decl.primary_key,
            position,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        self.kind
    }

    #[must_use]
    pub const fn application_type(&self) -> AppType {
        self.application_type
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }
}
