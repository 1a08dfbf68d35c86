use crate::types::{Date, DateTime};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Value
/// application-side scalar carried by entity instances, keys, and criteria
///
/// Null → the field's value is absent (i.e., SQL NULL).
///

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Date(Date),
    DateTime(DateTime),
    Int(i64),
    Null,
    Text(String),
    Uint(u64),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Date(_) => ValueKind::Date,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Int(_) => ValueKind::Int,
            Self::Null => ValueKind::Null,
            Self::Text(_) => ValueKind::Text,
            Self::Uint(_) => ValueKind::Uint,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Null => write!(f, "null"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_value_from {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from! {
    Date     => Date,
    DateTime => DateTime,
    bool     => Bool,
    i8       => Int,
    i16      => Int,
    i32      => Int,
    i64      => Int,
    &str     => Text,
    String   => Text,
    u8       => Uint,
    u16      => Uint,
    u32      => Uint,
    u64      => Uint,
}

///
/// ValueKind
/// the runtime shape of a `Value`, used in diagnostics and shape checks
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[display("bool")]
    Bool,
    #[display("date")]
    Date,
    #[display("datetime")]
    DateTime,
    #[display("int")]
    Int,
    #[display("null")]
    Null,
    #[display("text")]
    Text,
    #[display("uint")]
    Uint,
}

///
/// TESTS
///
