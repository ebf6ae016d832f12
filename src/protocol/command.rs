//! Protocol command bytes
//!
//! Numeric values are fixed by the storage service's published protocol and
//! must not be changed.

/// Command byte of a frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum Command {
    /// Liveness probe; the server echoes a `Response` frame with status 0
    ActiveTest = 111,

    /// Generic response command echoed by trackers and storage servers
    Response = 100,

    /// Ask the tracker for any storage server to store a new file
    TrackerQueryStoreWithoutGroup = 101,

    /// Ask the tracker which storage server holds an existing file
    TrackerQueryFetch = 102,

    /// Ask the tracker which storage server may modify an existing file
    TrackerQueryUpdate = 103,

    /// Ask the tracker for a storage server within a specific group
    TrackerQueryStoreWithGroup = 104,

    /// Upload a standalone immutable file
    StorageUploadFile = 11,

    /// Delete a file
    StorageDeleteFile = 12,

    /// Download a byte range of a file
    StorageDownloadFile = 14,

    /// Upload a slave file linked to a prior master upload
    StorageUploadSlaveFile = 21,

    /// Upload an appender file open for later appends
    StorageUploadAppenderFile = 23,
}

impl Command {
    /// Raw command byte as sent on the wire
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}
