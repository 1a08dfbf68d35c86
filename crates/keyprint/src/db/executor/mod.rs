mod load;
mod remove;
mod save;

#[cfg(test)]
mod tests;

pub use load::{LoadExecutor, ResultSet};
pub use remove::RemoveExecutor;
pub use save::SaveExecutor;

use crate::{
    db::{fingerprint::KeyFingerprint, instance::EntityInstance, store::Row},
    error::Error,
    schema::EntityMeta,
    transform::{self, TransformError},
};
use thiserror::Error as ThisError;

///
/// ExecutorError
/// identity violations detected while coordinating statements
///

#[derive(Debug, ThisError)]
pub enum ExecutorError {
    #[error("key {fingerprint} matches {count} rows; stored data violates key uniqueness")]
    DuplicateFingerprint {
        fingerprint: KeyFingerprint,
        count: usize,
    },

    #[error("a row with key {fingerprint} already exists")]
    KeyExists { fingerprint: KeyFingerprint },

    #[error("no row with key {fingerprint}")]
    RowNotFound { fingerprint: KeyFingerprint },
}

/// Encode every field of an instance into its stored form. Fields that
/// name no declared column are rejected, never silently dropped.
pub(crate) fn encode_row(meta: &EntityMeta, instance: &EntityInstance) -> Result<Row, Error> {
    let mut row = Row::new();
    for (name, value) in instance.iter() {
        let Some(column) = meta.column(name) else {
            return Err(TransformError::UnknownColumn {
                column: name.to_string(),
            }
            .into());
        };
        row.set(column.name(), transform::to_storage(column, value)?);
    }

    Ok(row)
}

/// Decode a stored row back into application values.
pub(crate) fn decode_row(meta: &EntityMeta, row: &Row) -> Result<EntityInstance, Error> {
    let mut instance = EntityInstance::new();
    for (name, stored) in row.iter() {
        let Some(column) = meta.column(name) else {
            return Err(TransformError::UnknownColumn {
                column: name.to_string(),
            }
            .into());
        };
        instance.set(column.name(), transform::from_storage(column, stored)?);
    }

    Ok(instance)
}
