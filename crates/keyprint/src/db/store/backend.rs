use crate::db::store::{Row, StorageValue};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Predicate
/// ordered column equality terms, already in encoded form
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    terms: Vec<(String, StorageValue)>,
}

impl Predicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, column: impl Into<String>, value: StorageValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: StorageValue) {
        self.terms.push((column.into(), value));
    }

    #[must_use]
    pub fn terms(&self) -> &[(String, StorageValue)] {
        &self.terms
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Row matching as the reference backend evaluates it: every term's
    /// column present and equal on the encoded value. Null equals null
    /// here; SQL backends keep their own NULL semantics.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.terms
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

impl Extend<(String, StorageValue)> for Predicate {
    fn extend<T: IntoIterator<Item = (String, StorageValue)>>(&mut self, iter: T) {
        self.terms.extend(iter);
    }
}

impl IntoIterator for Predicate {
    type Item = (String, StorageValue);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.into_iter()
    }
}

///
/// Statement
/// one storage operation; the core never renders these to SQL
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Statement {
    Insert { row: Row },
    Update { assignments: Row, predicate: Predicate },
    Select { predicate: Predicate },
    Delete { predicate: Predicate },
}

///
/// QueryBackend
///
/// The execution seam to the database driver. Row contract per statement:
/// `Select` returns the matching rows, `Insert` the stored row as
/// persisted (store defaults applied), `Update` the post-image of every
/// updated row, `Delete` the pre-image of every deleted row.
///

pub trait QueryBackend {
    fn execute(&self, entity: &str, statement: Statement) -> Result<Vec<Row>, BackendError>;
}

///
/// BackendError
/// storage-layer failures; surfaced to callers verbatim, never retried
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BackendError {
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("storage failure: {message}")]
    Other { message: String },
}

///
/// TESTS
///
