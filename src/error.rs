use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found")]
    NotFound,

    /// Returned for a missing account and for a wrong password alike.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no admin account exists")]
    NoAdminAccount,

    #[error("an admin account already exists")]
    AlreadyInitialized,

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored multi-value field that cannot be decoded. Catalog reads
    /// fall back to an empty list instead of returning it.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
