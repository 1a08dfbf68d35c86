use crate::db::store::{BackendError, Predicate, QueryBackend, Row, Statement};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

///
/// MemoryBackend
///
/// In-memory reference backend. Rows live per entity in insertion order
/// and nothing is enforced here: uniqueness discipline belongs to the
/// coordinator. Clones share the same storage.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: BTreeMap<String, Vec<Row>>,
    fail_next: Option<BackendError>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one failure; the next `execute` call returns it instead of
    /// touching storage.
    pub fn inject_failure(&self, error: BackendError) {
        self.lock().fail_next = Some(error);
    }

    /// Snapshot of an entity's stored rows, for assertions.
    #[must_use]
    pub fn rows(&self, entity: &str) -> Vec<Row> {
        self.lock().tables.get(entity).cloned().unwrap_or_default()
    }

    /// Seed a raw row directly, bypassing the coordinator.
    pub fn seed(&self, entity: &str, row: Row) {
        self.lock()
            .tables
            .entry(entity.to_string())
            .or_default()
            .push(row);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QueryBackend for MemoryBackend {
    fn execute(&self, entity: &str, statement: Statement) -> Result<Vec<Row>, BackendError> {
        let mut inner = self.lock();
        if let Some(err) = inner.fail_next.take() {
            return Err(err);
        }

        match statement {
            Statement::Insert { row } => {
                inner
                    .tables
                    .entry(entity.to_string())
                    .or_default()
                    .push(row.clone());

                Ok(vec![row])
            }
            Statement::Select { predicate } => Ok(select(&inner, entity, &predicate)),
            Statement::Update {
                assignments,
                predicate,
            } => {
                let mut updated = Vec::new();
                if let Some(rows) = inner.tables.get_mut(entity) {
                    for row in rows.iter_mut().filter(|r| predicate.matches(r)) {
                        row.apply(&assignments);
                        updated.push(row.clone());
                    }
                }

                Ok(updated)
            }
            Statement::Delete { predicate } => {
                let mut removed = Vec::new();
                if let Some(rows) = inner.tables.get_mut(entity) {
                    rows.retain(|row| {
                        if predicate.matches(row) {
                            removed.push(row.clone());
                            false
                        } else {
                            true
                        }
                    });
                }

                Ok(removed)
            }
        }
    }
}

fn select(inner: &Inner, entity: &str, predicate: &Predicate) -> Vec<Row> {
    inner
        .tables
        .get(entity)
        .map(|rows| {
            rows.iter()
                .filter(|row| predicate.matches(row))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

///
/// TESTS
///
