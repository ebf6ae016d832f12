//! # fdfs-client
//!
//! A pooled TCP client for the FastDFS distributed file storage protocol:
//! - Tracker resolution (which storage server serves an operation)
//! - Upload (new, slave, appender) from a path, buffer, or seekable stream
//! - Delete and ranged download (to file or memory)
//! - Bounded, health-checked connection pools shared across threads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FdfsClient                             │
//! │        (resolve via tracker, then transfer per verb)         │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//! ┌──────────▼──────────┐            ┌──────────▼──────────┐
//! │    TrackerClient    │            │    StorageClient     │
//! │  (store/fetch/      │            │  (upload/delete/     │
//! │   update queries)   │            │   download)          │
//! └──────────┬──────────┘            └──────────┬──────────┘
//!            │                                  │
//! ┌──────────▼──────────┐            ┌──────────▼──────────┐
//! │    tracker pool     │            │   PoolRegistry       │
//! │  (ConnectionPool)   │            │  (pool per ip:port)  │
//! └──────────┬──────────┘            └──────────┬──────────┘
//!            │                                  │
//! ┌──────────▼──────────────────────────────────▼──────────┐
//! │              Wire Codec (10-byte frames)                │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use fdfs_client::{Config, FdfsClient};
//!
//! # fn main() -> fdfs_client::Result<()> {
//! let config = Config::builder()
//!     .tracker_hosts(vec!["10.0.1.32".to_string()])
//!     .build();
//! let client = FdfsClient::new(config)?;
//!
//! let uploaded = client.upload_by_buffer(b"hello".to_vec(), "txt")?;
//! let downloaded = client.download_to_buffer(&uploaded.remote_file_id, 0, 0)?;
//! client.delete_file(&uploaded.remote_file_id)?;
//! # let _ = downloaded;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod pool;
pub mod protocol;
pub mod storage;
pub mod tracker;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::{split_remote_file_id, FdfsClient};
pub use config::Config;
pub use error::{FdfsError, Result};
pub use pool::{ConnectionPool, PoolRegistry, PooledConn};
pub use protocol::{Command, FrameHeader, StorageServer, UploadFileResponse};
pub use storage::{
    DownloadContent, DownloadFileResponse, DownloadSink, StorageClient, UploadKind, UploadSource,
    UploadStream,
};
pub use tracker::TrackerClient;

// =============================================================================
// Version Info
// =============================================================================

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
