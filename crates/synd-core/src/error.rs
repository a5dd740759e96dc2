use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyndError {
    #[error("entity error: {0}")]
    Entity(String),

    #[error("resolve error: {0}")]
    Resolve(String),

    #[error("graph flatten error: {0}")]
    Flatten(String),

    #[error("record error: {0}")]
    Record(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for SyndError {
    fn from(e: serde_json::Error) -> Self {
        SyndError::Serialization(e.to_string())
    }
}

pub type SyndResult<T> = Result<T, SyndError>;
