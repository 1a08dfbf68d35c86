//! Core runtime for keyprint: schema declarations, canonical value encoding,
//! key fingerprints, and the executors wired together by `Repository`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod obs;
pub mod schema;
pub mod transform;
pub mod types;
pub mod value;

///
/// CONSTANTS
///

/// Crate version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///
/// Prelude contains the domain vocabulary plus the repository surface.
/// Backend implementors reach into `db::store` directly.
///

pub mod prelude {
    pub use crate::{
        db::{
            Criteria, EntityInstance, KeyFingerprint, KeyInput, Repository, fingerprint_of,
            fingerprint_of_key,
            store::{
                BackendError, MemoryBackend, Predicate, QueryBackend, Row, Statement,
                StorageValue,
            },
        },
        error::Error,
        schema::{AppType, ColumnDecl, ColumnMeta, EntityDecl, EntityMeta},
        types::{Date, DateTime},
        value::{Value, ValueKind},
    };
}
