use crate::{
    db::{
        executor::{ExecutorError, decode_row, encode_row},
        fingerprint::{KeyFingerprint, fingerprint_of},
        instance::EntityInstance,
        store::{QueryBackend, Row, Statement},
    },
    error::Error,
    obs::sink::{ExecKind, Span},
    schema::EntityMeta,
};

///
/// SaveExecutor
///

pub struct SaveExecutor<'a, B: QueryBackend> {
    meta: &'a EntityMeta,
    backend: &'a B,
    debug: bool,
}

impl<'a, B: QueryBackend> SaveExecutor<'a, B> {
    // Debug is handle-scoped and propagated into executors; executors
    // do not expose independent debug control.
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

    // ======================================================================
    // Single-instance save operations
    // ======================================================================

    /// Insert or update by stored key identity.
    ///
    /// A select on the key fingerprint decides the lane: no match
    /// inserts a new row, one match updates its non-key columns, more
    /// than one match means the store itself violates key uniqueness.
    /// A key value changed since the row was loaded simply lands in the
    /// insert lane; rows are never relocated.
    pub fn save(&self, instance: EntityInstance) -> Result<EntityInstance, Error> {
        let fingerprint = fingerprint_of(self.meta, &instance)?;
        let mut span = Span::new(ExecKind::Save, self.meta.name());

        let existing = self.select_by(&fingerprint)?;
        let saved = match existing.as_slice() {
            [] => {
                self.debug_log(format!("save: no row for {fingerprint}, inserting"));
                self.insert_row(&instance)?
            }
            [current] => {
                self.debug_log(format!("save: updating {fingerprint}"));
                self.update_row(&fingerprint, &instance, current)?
            }
            rows => {
                return Err(ExecutorError::DuplicateFingerprint {
                    count: rows.len(),
                    fingerprint,
                }
                .into());
            }
        };
        span.set_rows(1);

        Ok(saved)
    }

    /// Insert a brand-new row (errors if the key already exists).
    pub fn insert(&self, instance: EntityInstance) -> Result<EntityInstance, Error> {
        let fingerprint = fingerprint_of(self.meta, &instance)?;
        let mut span = Span::new(ExecKind::Save, self.meta.name());

        let existing = self.select_by(&fingerprint)?;
        if !existing.is_empty() {
            return Err(ExecutorError::KeyExists { fingerprint }.into());
        }

        self.debug_log(format!("insert {fingerprint}"));
        let saved = self.insert_row(&instance)?;
        span.set_rows(1);

        Ok(saved)
    }

    /// Update an existing row (errors if it does not exist).
    pub fn update(&self, instance: EntityInstance) -> Result<EntityInstance, Error> {
        let fingerprint = fingerprint_of(self.meta, &instance)?;
        let mut span = Span::new(ExecKind::Save, self.meta.name());

        let existing = self.select_by(&fingerprint)?;
        let saved = match existing.as_slice() {
            [] => return Err(ExecutorError::RowNotFound { fingerprint }.into()),
            [current] => {
                self.debug_log(format!("update {fingerprint}"));
                self.update_row(&fingerprint, &instance, current)?
            }
            rows => {
                return Err(ExecutorError::DuplicateFingerprint {
                    count: rows.len(),
                    fingerprint,
                }
                .into());
            }
        };
        span.set_rows(1);

        Ok(saved)
    }

    // ======================================================================
    // Batch save
    // ======================================================================

    /// Save a batch with explicitly non-atomic semantics.
    ///
    /// WARNING: this helper is fail-fast and non-atomic. If one element
    /// fails, earlier elements in the batch remain committed.
    pub fn save_many(
        &self,
        instances: impl IntoIterator<Item = EntityInstance>,
    ) -> Result<Vec<EntityInstance>, Error> {
        let iter = instances.into_iter();
        let mut out = Vec::with_capacity(iter.size_hint().0);
        let mut batch_index = 0_usize;

        for instance in iter {
            batch_index = batch_index.saturating_add(1);
            match self.save(instance) {
                Ok(saved) => out.push(saved),
                Err(err) => {
                    if !out.is_empty() {
                        // Batch writes are intentionally non-atomic; surface partial commits loudly.
                        println!(
                            "[warn] keyprint non-atomic batch partial commit: entity={} committed={} failed_at_item={batch_index} error={err}",
                            self.meta.name(),
                            out.len(),
                        );
                    }

                    return Err(err);
                }
            }
        }

        Ok(out)
    }

    // ======================================================================
    // Lanes
    // ======================================================================

    fn insert_row(&self, instance: &EntityInstance) -> Result<EntityInstance, Error> {
        let row = encode_row(self.meta, instance)?;
        let mut stored = self.execute(Statement::Insert { row: row.clone() })?;

        // A backend that cannot return its stored image falls back to
        // our canonical encoding.
        let stored_row = stored.pop().unwrap_or(row);
        decode_row(self.meta, &stored_row)
    }

    fn update_row(
        &self,
        fingerprint: &KeyFingerprint,
        instance: &EntityInstance,
        current: &Row,
    ) -> Result<EntityInstance, Error> {
        let full = encode_row(self.meta, instance)?;
        let mut assignments = Row::new();
        for (column, value) in full.iter() {
            if !self.meta.is_primary_key(column) {
                assignments.set(column, value.clone());
            }
        }

        // Nothing beyond the key to write; the stored row is already
        // the canonical image.
        if assignments.is_empty() {
            return decode_row(self.meta, current);
        }

        let updated = self.execute(Statement::Update {
            assignments,
            predicate: fingerprint.predicate(),
        })?;
        match updated.as_slice() {
            [] => Err(ExecutorError::RowNotFound {
                fingerprint: fingerprint.clone(),
            }
            .into()),
            [row] => decode_row(self.meta, row),
            rows => Err(ExecutorError::DuplicateFingerprint {
                count: rows.len(),
                fingerprint: fingerprint.clone(),
            }
            .into()),
        }
    }

    fn select_by(&self, fingerprint: &KeyFingerprint) -> Result<Vec<Row>, Error> {
        self.execute(Statement::Select {
            predicate: fingerprint.predicate(),
        })
    }

    fn execute(&self, statement: Statement) -> Result<Vec<Row>, Error> {
        self.backend
            .execute(self.meta.name(), statement)
            .map_err(Error::from)
    }
}
