//! Error types for the FastDFS client
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using FdfsError
pub type Result<T> = std::result::Result<T, FdfsError>;

/// Unified error type for FastDFS client operations
#[derive(Debug, Error)]
pub enum FdfsError {
    // -------------------------------------------------------------------------
    // I/O Errors (local files and sockets)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to dial {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Pool Errors
    // -------------------------------------------------------------------------
    #[error("invalid pool configuration: {0}")]
    Config(String),

    #[error("connection pool exhausted: all {max} connections in use")]
    PoolExhausted { max: usize },

    #[error("connection pool is closed")]
    PoolClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Nonzero status byte in a response header. The numeric value is the
    /// peer's errno-style status code.
    #[error("server returned status {status}: {}", status_message(*status))]
    Protocol { status: u8 },

    #[error("malformed frame header: {0}")]
    MalformedHeader(String),

    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: u64, got: u64 },

    #[error("short response: expected {expected} bytes, got {got}")]
    ShortResponse { expected: u64, got: u64 },

    // -------------------------------------------------------------------------
    // Identifier Errors
    // -------------------------------------------------------------------------
    #[error("invalid remote file id {0:?}: missing '/' separator")]
    InvalidFileId(String),
}

/// Human-readable meaning of the known server status codes.
fn status_message(status: u8) -> &'static str {
    match status {
        2 => "no such file or directory",
        17 => "file exists",
        22 => "invalid argument",
        _ => "server error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_preserves_status() {
        let err = FdfsError::Protocol { status: 17 };
        assert!(err.to_string().contains("17"));
        assert!(err.to_string().contains("file exists"));
    }

    #[test]
    fn test_unknown_status_message() {
        let err = FdfsError::Protocol { status: 99 };
        assert!(err.to_string().contains("99"));
    }
}
