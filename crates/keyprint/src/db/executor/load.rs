use crate::{
    db::{
        Criteria,
        executor::{ExecutorError, decode_row},
        fingerprint::{KeyInput, fingerprint_of_key},
        instance::EntityInstance,
        store::{QueryBackend, Row, Statement},
    },
    error::Error,
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    schema::EntityMeta,
};
use std::vec;

///
/// ResultSet
/// finite result iterator for find calls; rows decode as they are
/// consumed, each row on its own
///

pub struct ResultSet<'a> {
    meta: &'a EntityMeta,
    rows: vec::IntoIter<Row>,
}

impl<'a> ResultSet<'a> {
    pub(crate) fn new(meta: &'a EntityMeta, rows: Vec<Row>) -> Self {
        Self {
            meta,
            rows: rows.into_iter(),
        }
    }
}

impl Iterator for ResultSet<'_> {
    type Item = Result<EntityInstance, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| decode_row(self.meta, &row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for ResultSet<'_> {}

///
/// LoadExecutor
///

pub struct LoadExecutor<'a, B: QueryBackend> {
    meta: &'a EntityMeta,
    backend: &'a B,
    debug: bool,
}

impl<'a, B: QueryBackend> LoadExecutor<'a, B> {
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

    /// Select by equality criteria.
    pub fn find(&self, criteria: &Criteria) -> Result<ResultSet<'a>, Error> {
        let predicate = criteria.to_predicate(self.meta)?;
        let mut span = Span::new(ExecKind::Find, self.meta.name());
        self.debug_log(format!(
            "find on {} with {} criteria terms",
            self.meta.name(),
            predicate.terms().len()
        ));

        let rows = self.execute(Statement::Select { predicate })?;
        sink::record(MetricsEvent::RowsScanned {
            entity: self.meta.name(),
            rows_scanned: rows.len() as u64,
        });
        span.set_rows(rows.len() as u64);

        Ok(ResultSet::new(self.meta, rows))
    }

    /// Select one row by key, with optional extra equality criteria.
    /// No match is a normal `None`, never an error.
    pub fn find_one(
        &self,
        key: KeyInput,
        extra: &Criteria,
    ) -> Result<Option<EntityInstance>, Error> {
        let fingerprint = fingerprint_of_key(self.meta, key)?;
        let mut predicate = fingerprint.predicate();
        predicate.extend(extra.to_predicate(self.meta)?);

        let mut span = Span::new(ExecKind::FindOne, self.meta.name());
        self.debug_log(format!("find_one {fingerprint}"));

        let rows = self.execute(Statement::Select { predicate })?;
        span.set_rows(rows.len() as u64);
        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(decode_row(self.meta, row)?)),
            rows => Err(ExecutorError::DuplicateFingerprint {
                count: rows.len(),
                fingerprint,
            }
            .into()),
        }
    }

    /// Existence check by key.
    pub fn exists(&self, key: KeyInput) -> Result<bool, Error> {
        let fingerprint = fingerprint_of_key(self.meta, key)?;
        let mut span = Span::new(ExecKind::FindOne, self.meta.name());
        self.debug_log(format!("exists {fingerprint}"));

        let rows = self.execute(Statement::Select {
            predicate: fingerprint.predicate(),
        })?;
        span.set_rows(rows.len() as u64);
        match rows.len() {
            0 => Ok(false),
            1 => Ok(true),
            count => Err(ExecutorError::DuplicateFingerprint { count, fingerprint }.into()),
        }
    }

    /// Count rows matching the criteria.
    pub fn count(&self, criteria: &Criteria) -> Result<usize, Error> {
        let predicate = criteria.to_predicate(self.meta)?;
        let mut span = Span::new(ExecKind::Find, self.meta.name());

        let rows = self.execute(Statement::Select { predicate })?;
        sink::record(MetricsEvent::RowsScanned {
            entity: self.meta.name(),
            rows_scanned: rows.len() as u64,
        });
        span.set_rows(rows.len() as u64);

        Ok(rows.len())
    }

    fn execute(&self, statement: Statement) -> Result<Vec<Row>, Error> {
        self.backend
            .execute(self.meta.name(), statement)
            .map_err(Error::from)
    }
}
