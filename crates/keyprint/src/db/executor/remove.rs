use crate::{
    db::{
        fingerprint::{KeyInput, fingerprint_of, fingerprint_of_key},
        instance::EntityInstance,
        store::{QueryBackend, Row, Statement},
    },
    error::Error,
    obs::sink::{ExecKind, Span},
    schema::EntityMeta,
};

///
/// RemoveExecutor
///

pub struct RemoveExecutor<'a, B: QueryBackend> {
    meta: &'a EntityMeta,
    backend: &'a B,
    debug: bool,
}

impl<'a, B: QueryBackend> RemoveExecutor<'a, B> {
    #[must_use]
    pub const fn new(meta: &'a EntityMeta, backend: &'a B, debug: bool) -> Self {
        Self {
            meta,
            backend,
            debug,
        }
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    /// Delete the row addressed by the instance's key fields, then
    /// detach those fields from the returned instance.
    ///
    /// Deleting an absent row is still success (0 affected); the key
    /// fields detach either way.
    pub fn remove(&self, mut instance: EntityInstance) -> Result<EntityInstance, Error> {
        let fingerprint = fingerprint_of(self.meta, &instance)?;
        let mut span = Span::new(ExecKind::Remove, self.meta.name());
        self.debug_log(format!("remove {fingerprint}"));

        let removed = self.execute(Statement::Delete {
            predicate: fingerprint.predicate(),
        })?;
        span.set_rows(removed.len() as u64);

        for (column, _) in fingerprint.parts() {
            instance.unset(column);
        }

        Ok(instance)
    }

    /// Delete by bare key value, returning the affected-row count.
    pub fn delete_by_key(&self, key: KeyInput) -> Result<usize, Error> {
        let fingerprint = fingerprint_of_key(self.meta, key)?;
        let mut span = Span::new(ExecKind::Remove, self.meta.name());
        self.debug_log(format!("delete {fingerprint}"));

        let removed = self.execute(Statement::Delete {
            predicate: fingerprint.predicate(),
        })?;
        span.set_rows(removed.len() as u64);

        Ok(removed.len())
    }

    fn execute(&self, statement: Statement) -> Result<Vec<Row>, Error> {
        self.backend
            .execute(self.meta.name(), statement)
            .map_err(Error::from)
    }
}
