mod backend;
mod memory;
mod row;
mod value;

pub use backend::{BackendError, Predicate, QueryBackend, Statement};
pub use memory::MemoryBackend;
pub use row::Row;
pub use value::StorageValue;
