use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// StorageValue
/// a storage-native scalar, exactly as the driver layer carries it
///
/// Key fingerprints compare these encoded values, so the enum derives the
/// full equality/ordering/hash set. Canonical temporal encodings travel as
/// `Text`.
///

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum StorageValue {
    Bool(bool),
    Int(i64),
    Null,
    Text(String),
    Uint(u64),
}

impl StorageValue {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Uint(_) => "uint",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Null => write!(f, "null"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
        }
    }
}

///
/// TESTS
///
