use thiserror::Error;

/// The kinds of failure a caller may want to tell apart.
///
/// Every fallible operation returns an [`anyhow::Error`]; the kind is recovered with
/// `error.downcast_ref::<DatabaseError>()`, which also works after context was attached.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Missing or invalid credentials or driver identifier.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A connection could not be acquired or established.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The driver rejected or failed a statement.
    #[error("Execution error: {0}")]
    Execution(String),
    /// A cell could not be converted to the requested type.
    #[error("Cannot convert `{value}` to {target}: {reason}")]
    Coercion {
        value: String,
        target: &'static str,
        reason: String,
    },
    /// The requested target type has no cell conversion.
    #[error("Cannot convert a string to {0}: unsupported conversion")]
    UnsupportedConversion(&'static str),
    /// An object mapper was configured incorrectly.
    #[error("Invalid object mapper: {0}")]
    MappingConstruction(String),
    /// The executor refused to accept a task.
    #[error("The executor rejected the task: {0}")]
    Rejected(String),
    /// The task that should have produced a result went away without producing it.
    #[error("The action was dropped before producing a result")]
    Abandoned,
}

impl DatabaseError {
    pub(crate) fn coercion(
        value: impl Into<String>,
        target: &'static str,
        reason: impl ToString,
    ) -> Self {
        DatabaseError::Coercion {
            value: value.into(),
            target,
            reason: reason.to_string(),
        }
    }
}

/// Returns the [`DatabaseError`] carried by `error`, if any.
pub fn error_kind(error: &anyhow::Error) -> Option<&DatabaseError> {
    error.downcast_ref::<DatabaseError>()
}
