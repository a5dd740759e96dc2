use synd_core::SyndError;
use synd_entity::EntityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// The external flatten step failed. The original error is kept as-is.
    #[error("graph flatten failed: {0}")]
    Flatten(#[source] SyndError),

    #[error("signed subject record '{0}' not supplied")]
    UnknownRecord(String),

    #[error("signed record '{record}' has no '{claim}' claim")]
    MissingClaim { record: String, claim: &'static str },

    #[error("node '{node}' not found in subject payload of record '{record}'")]
    NodeNotInRecord { record: String, node: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<ResolveError> for SyndError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Flatten(inner) => inner,
            ResolveError::Entity(inner) => inner.into(),
            other => SyndError::Resolve(other.to_string()),
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
