//! Error types for song references and URIs.

use thiserror::Error;

/// Result type for soundsword operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was missing or unusable (empty path, relative base, wrong scheme)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Text that does not form a URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// The working directory needed to resolve a relative path is unavailable
    #[error("Cannot resolve relative path: {0}")]
    Resolve(#[from] std::io::Error),
}
