pub mod executor;
pub mod fingerprint;
pub mod instance;
pub mod store;

// re-exports
pub use executor::{ExecutorError, LoadExecutor, RemoveExecutor, ResultSet, SaveExecutor};
pub use fingerprint::{KeyError, KeyFingerprint, KeyInput, fingerprint_of, fingerprint_of_key};
pub use instance::EntityInstance;

use crate::{
    db::store::{Predicate, QueryBackend},
    error::Error,
    schema::EntityMeta,
    transform::{self, TransformError},
    value::Value,
};
use std::sync::Arc;

///
/// Criteria
/// ordered application-typed equality terms; each term encodes through
/// its column's canonical storage form before it reaches a backend
///

#[derive(Clone, Debug, Default)]
pub struct Criteria {
    terms: Vec<(String, Value)>,
}

impl Criteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality term.
    #[must_use]
    pub fn and(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push((column.into(), value.into()));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn terms(&self) -> &[(String, Value)] {
        &self.terms
    }

    // Key and plain columns alike compare on their canonical encoding.
    pub(crate) fn to_predicate(&self, meta: &EntityMeta) -> Result<Predicate, Error> {
        let mut predicate = Predicate::new();
        for (name, value) in &self.terms {
            let Some(column) = meta.column(name) else {
                return Err(TransformError::UnknownColumn {
                    column: name.clone(),
                }
                .into());
            };
            predicate.push(column.name(), transform::to_storage(column, value)?);
        }

        Ok(predicate)
    }
}

///
/// Repository
///
/// One entity's persistence surface over a query backend. Every
/// operation is synchronous and stateless across calls; identity always
/// goes through the key fingerprint. Operations delegate to the
/// per-operation executors.
///

#[derive(Clone, Debug)]
pub struct Repository<B: QueryBackend> {
    meta: Arc<EntityMeta>,
    backend: B,
    debug: bool,
}

impl<B: QueryBackend> Repository<B> {
    #[must_use]
    pub const fn new(meta: Arc<EntityMeta>, backend: B) -> Self {
        Self {
            meta,
            backend,
            debug: false,
        }
    }

    /// Enable verbose executor logging for this handle.
    #[must_use]
    pub const fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    // ======================================================================
    // Save operations
    // ======================================================================

    /// Insert or update by stored key identity.
    pub fn save(&self, instance: EntityInstance) -> Result<EntityInstance, Error> {
        self.save_executor().save(instance)
    }

    /// Insert a brand-new row (errors if the key already exists).
    pub fn insert(&self, instance: EntityInstance) -> Result<EntityInstance, Error> {
        self.save_executor().insert(instance)
    }

    /// Update an existing row (errors if it does not exist).
    pub fn update(&self, instance: EntityInstance) -> Result<EntityInstance, Error> {
        self.save_executor().update(instance)
    }

    /// Save a batch, fail-fast and non-atomic.
    pub fn save_many(
        &self,
        instances: impl IntoIterator<Item = EntityInstance>,
    ) -> Result<Vec<EntityInstance>, Error> {
        self.save_executor().save_many(instances)
    }

    // ======================================================================
    // Read operations
    // ======================================================================

    /// Select by equality criteria; rows decode as the set is iterated.
    pub fn find(&self, criteria: &Criteria) -> Result<ResultSet<'_>, Error> {
        self.load_executor().find(criteria)
    }

    /// Select one row by key, with optional extra criteria. No match is
    /// a normal `None`.
    pub fn find_one(
        &self,
        key: impl Into<KeyInput>,
        extra: &Criteria,
    ) -> Result<Option<EntityInstance>, Error> {
        self.load_executor().find_one(key.into(), extra)
    }

    /// Existence check by key.
    pub fn exists(&self, key: impl Into<KeyInput>) -> Result<bool, Error> {
        self.load_executor().exists(key.into())
    }

    /// Count rows matching the criteria.
    pub fn count(&self, criteria: &Criteria) -> Result<usize, Error> {
        self.load_executor().count(criteria)
    }

    // ======================================================================
    // Remove operations
    // ======================================================================

    /// Delete by the instance's key fields and detach them from the
    /// returned instance.
    pub fn remove(&self, instance: EntityInstance) -> Result<EntityInstance, Error> {
        self.remove_executor().remove(instance)
    }

    /// Delete by bare key value, returning the affected-row count.
    pub fn delete_by_key(&self, key: impl Into<KeyInput>) -> Result<usize, Error> {
        self.remove_executor().delete_by_key(key.into())
    }

    // ======================================================================
    // Executors
    // ======================================================================

    fn save_executor(&self) -> SaveExecutor<'_, B> {
        SaveExecutor::new(&self.meta, &self.backend, self.debug)
    }

    fn load_executor(&self) -> LoadExecutor<'_, B> {
        LoadExecutor::new(&self.meta, &self.backend, self.debug)
    }

    fn remove_executor(&self) -> RemoveExecutor<'_, B> {
        RemoveExecutor::new(&self.meta, &self.backend, self.debug)
    }
}
