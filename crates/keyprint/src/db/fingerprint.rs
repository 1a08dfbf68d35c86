use crate::{
    db::{
        instance::EntityInstance,
        store::{Predicate, StorageValue},
    },
    error::Error,
    schema::{ColumnMeta, EntityMeta},
    transform::{self, TransformError},
    types::{Date, DateTime},
    value::Value,
};
use derive_more::From;
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};
use thiserror::Error as ThisError;

///
/// KeyError
/// per-call key resolution failures; recoverable
///

#[derive(Debug, ThisError)]
pub enum KeyError {
    #[error("entity '{entity}' has a {count}-column key; pass a column-to-value mapping")]
    CompositeKeyRequiresMapping { entity: String, count: usize },

    #[error("entity '{entity}' is missing primary key fields {missing:?}")]
    IncompleteKey { entity: String, missing: Vec<String> },

    #[error("column '{column}' is not part of the primary key of entity '{entity}'")]
    NotAKeyColumn { entity: String, column: String },

    #[error("primary key field '{column}' of entity '{entity}' is null")]
    NullKeyComponent { entity: String, column: String },
}

///
/// KeyFingerprint
///
/// The storage-encoded identity of one row: the entity name plus the
/// primary-key columns in declaration order, each value already in its
/// canonical stored form. Equality and ordering are defined on the
/// encoded parts, so two fingerprints compare equal exactly when a
/// backend lookup on those pairs would address the same row.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyFingerprint {
    entity: String,
    parts: Vec<(String, StorageValue)>,
}

impl KeyFingerprint {
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Key components in primary-key declaration order.
    #[must_use]
    pub fn parts(&self) -> &[(String, StorageValue)] {
        &self.parts
    }

    /// Backend predicate addressing exactly this key.
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        let mut predicate = Predicate::new();
        for (column, value) in &self.parts {
            predicate.push(column.clone(), value.clone());
        }

        predicate
    }
}

impl Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (", self.entity)?;
        for (i, (column, value)) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}={value}")?;
        }
        write!(f, ")")
    }
}

///
/// KeyInput
/// a caller-provided key: one bare value for single-column keys, or an
/// explicit column-to-value mapping for composite keys
///

#[derive(Clone, Debug, From)]
pub enum KeyInput {
    Single(Value),
    Composite(BTreeMap<String, Value>),
}

impl KeyInput {
    /// Build a composite key from `(column, value)` pairs.
    pub fn composite<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Composite(
            pairs
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

// Carrier conversions mirror the Value table so bare values read
// naturally at call sites.
macro_rules! impl_key_input_from {
    ($($type:ty),* $(,)?) => {
        $(
            impl From<$type> for KeyInput {
                fn from(value: $type) -> Self {
                    Self::Single(Value::from(value))
                }
            }
        )*
    };
}

impl_key_input_from!(
    Date, DateTime, bool, i8, i16, i32, i64, &str, String, u8, u16, u32, u64,
);

/// Fingerprint a full instance by reading its primary-key fields.
///
/// Absent key fields are collected and reported together so the caller
/// sees the whole shortfall at once; a present-but-null field fails on
/// its own.
pub fn fingerprint_of(
    meta: &EntityMeta,
    instance: &EntityInstance,
) -> Result<KeyFingerprint, Error> {
    let parts = encode_key_columns(meta, |name| instance.get(name))?;

    Ok(KeyFingerprint {
        entity: meta.name().to_string(),
        parts,
    })
}

/// Fingerprint a caller-provided key without a full instance.
pub fn fingerprint_of_key(meta: &EntityMeta, key: KeyInput) -> Result<KeyFingerprint, Error> {
    let parts = match key {
        KeyInput::Single(value) => {
            let mut columns = meta.primary_key_columns();
            let (Some(column), None) = (columns.next(), columns.next()) else {
                return Err(KeyError::CompositeKeyRequiresMapping {
                    entity: meta.name().to_string(),
                    count: meta.primary_key_len(),
                }
                .into());
            };

            vec![encode_part(meta, column, &value)?]
        }
        KeyInput::Composite(map) => {
            for name in map.keys() {
                match meta.column(name) {
                    None => {
                        return Err(TransformError::UnknownColumn {
                            column: name.clone(),
                        }
                        .into());
                    }
                    Some(column) if !column.is_primary_key() => {
                        return Err(KeyError::NotAKeyColumn {
                            entity: meta.name().to_string(),
                            column: name.clone(),
                        }
                        .into());
                    }
                    Some(_) => {}
                }
            }

            encode_key_columns(meta, |name| map.get(name))?
        }
    };

    Ok(KeyFingerprint {
        entity: meta.name().to_string(),
        parts,
    })
}

// Walk the primary-key columns in declaration order, gating on
// completeness before any value is encoded.
fn encode_key_columns<'v>(
    meta: &EntityMeta,
    mut lookup: impl FnMut(&str) -> Option<&'v Value>,
) -> Result<Vec<(String, StorageValue)>, Error> {
    let mut missing = Vec::new();
    let mut present = Vec::with_capacity(meta.primary_key_len());

    for column in meta.primary_key_columns() {
        match lookup(column.name()) {
            Some(value) => present.push((column, value)),
            None => missing.push(column.name().to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(KeyError::IncompleteKey {
            entity: meta.name().to_string(),
            missing,
        }
        .into());
    }

    let mut parts = Vec::with_capacity(present.len());
    for (column, value) in present {
        parts.push(encode_part(meta, column, value)?);
    }

    Ok(parts)
}

fn encode_part(
    meta: &EntityMeta,
    column: &ColumnMeta,
    value: &Value,
) -> Result<(String, StorageValue), Error> {
    if value.is_null() {
        return Err(KeyError::NullKeyComponent {
            entity: meta.name().to_string(),
            column: column.name().to_string(),
        }
        .into());
    }

    let encoded = transform::to_storage(column, value)?;

    Ok((column.name().to_string(), encoded))
}

///
/// TESTS
///
