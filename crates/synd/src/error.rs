use thiserror::Error;

/// Error type for the synd service and binary, aggregating the errors of
/// the library crates.
#[derive(Debug, Error)]
pub enum RootError {
    #[error(transparent)]
    Core(#[from] synd_core::SyndError),

    #[error("entity error: {0}")]
    Entity(#[from] synd_entity::EntityError),

    #[error("resolve error: {0}")]
    Resolve(#[from] synd_resolve::ResolveError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;
