use crate::db::store::StorageValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Row
/// one stored row: column name → storage value
///
/// Columns a caller never set stay absent rather than null, which lets the
/// store apply its own defaults on insert.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Row {
    cells: BTreeMap<String, StorageValue>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: StorageValue) {
        self.cells.insert(column.into(), value);
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: StorageValue) -> Self {
        self.set(column, value);
        self
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&StorageValue> {
        self.cells.get(column)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StorageValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite this row's cells with every assignment in `other`.
    pub fn apply(&mut self, other: &Self) {
        for (column, value) in &other.cells {
            self.cells.insert(column.clone(), value.clone());
        }
    }
}

impl FromIterator<(String, StorageValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, StorageValue)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

///
/// TESTS
///
