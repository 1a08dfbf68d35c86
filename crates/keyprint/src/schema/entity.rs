use crate::schema::{ColumnDecl, ColumnMeta, SchemaError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

///
/// EntityDecl
/// an entity declaration collected column by column
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityDecl {
    name: String,
    columns: Vec<ColumnDecl>,
}

impl EntityDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, decl: ColumnDecl) -> Self {
        self.columns.push(decl);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

///
/// EntityMeta
///
/// The registered shape of one entity: every column resolved through the
/// type registry, in declaration order, with the primary-key subset in
/// declaration order as well. That subset order is the canonical component
/// order of every key fingerprint for the entity.
///
/// Registration is the only constructor; the result is shared read-only.
///

#[derive(Debug, Serialize)]
pub struct EntityMeta {
    name: String,
    columns: Vec<ColumnMeta>,
    primary_key: Vec<usize>,
}

impl EntityMeta {
    /// Validate a declaration and freeze it into shared metadata.
    pub fn register(decl: EntityDecl) -> Result<Arc<Self>, SchemaError> {
        if let Err(reason) = super::validate_name(&decl.name) {
            return Err(SchemaError::InvalidEntityName {
                name: decl.name,
                reason,
            });
        }

        let mut columns: Vec<ColumnMeta> = Vec::with_capacity(decl.columns.len());
        for (position, column) in decl.columns.iter().enumerate() {
            if columns.iter().any(|c| c.name() == column.name) {
                return Err(SchemaError::DuplicateColumnName {
                    name: column.name.clone(),
                });
            }
            columns.push(ColumnMeta::resolve_decl(column, position)?);
        }

        let primary_key: Vec<usize> = columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(ColumnMeta::position)
            .collect();
        if primary_key.is_empty() {
            return Err(SchemaError::NoPrimaryKeyDeclared { entity: decl.name });
        }

        Ok(Arc::new(Self {
            name: decl.name,
            columns,
            primary_key,
        }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Look a column up by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// The primary-key columns, in declaration order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.primary_key.iter().map(|&i| &self.columns[i])
    }

    #[must_use]
    pub fn primary_key_len(&self) -> usize {
        self.primary_key.len()
    }

    #[must_use]
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.column(name).is_some_and(ColumnMeta::is_primary_key)
    }
}
