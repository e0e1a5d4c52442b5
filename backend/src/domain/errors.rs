//! Domain error taxonomy shared by all services.

/// Failure kinds surfaced by the domain layer.
///
/// Storage failures wrap the underlying error for logging but are presented
/// to callers as an opaque operational failure; raw storage error text never
/// crosses the REST boundary.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Malformed input detected at the boundary of the operation that
    /// received it. Never partially applied.
    #[error("{0}")]
    Validation(String),

    /// The target of a mutating operation does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation lost a compare-and-swap race or attempted an illegal
    /// state transition.
    #[error("{0}")]
    Conflict(String),

    /// Backing-store failure.
    #[error("storage operation failed")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
