use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid strategy config: {0}")]
    Validation(String),

    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
