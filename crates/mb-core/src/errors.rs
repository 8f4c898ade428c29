/// Core error type for the relay.
///
/// Adapter crates map their specific errors (sqlx, teloxide) into this type so
/// the top level can decide between aborting startup and logging a dropped
/// event.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
