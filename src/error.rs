//! Main Crate Error

#[derive(thiserror::Error, Debug)]
/// dht-refresh crate error enum.
pub enum Error {
    #[error(transparent)]
    /// Transparent [std::io::Error], returned if the refresh thread could not be spawned.
    IO(#[from] std::io::Error),

    /// A bootstrap seed is not a valid `host:port` pair.
    #[error("Invalid bootstrap address: {0}")]
    InvalidBootstrapAddress(String),

    /// Id bytes are not [crate::common::ID_SIZE] long.
    #[error("Invalid Id size, expected 20, got {0}")]
    InvalidIdSize(usize),

    /// Id string is not 40 hex characters.
    #[error("Invalid Id encoding: {0}")]
    InvalidIdEncoding(String),
}

/// Alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
