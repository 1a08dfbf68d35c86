use crate::{
    db::{executor::ExecutorError, fingerprint::KeyError, store::BackendError},
    schema::SchemaError,
    transform::TransformError,
};
use thiserror::Error as ThisError;

///
/// Error
/// the single error type every fallible operation in this crate returns;
/// each boundary keeps its own enum and nests here transparently
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_display_unwrapped() {
        let inner = SchemaError::UnknownTypeKind {
            type_name: "datetime2".to_string(),
        };
        let expected = inner.to_string();

        let error = Error::from(inner);
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn backend_errors_convert_without_rewrapping() {
        let error = Error::from(BackendError::Unavailable {
            message: "connection refused".to_string(),
        });

        assert!(matches!(
            error,
            Error::Backend(BackendError::Unavailable { .. })
        ));
    }
}
