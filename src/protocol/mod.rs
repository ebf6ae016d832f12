//! Protocol Module
//!
//! Defines the binary wire protocol spoken with trackers and storage servers.
//!
//! ## Frame Format
//!
//! Every exchange is a frame: a fixed 10-byte header followed by
//! `payload_len` payload bytes. All integers are big-endian, with no
//! padding between fields.
//!
//! ```text
//! ┌──────────────────┬──────────┬──────────┬──────────────────┐
//! │ payload_len (8)  │ cmd (1)  │status (1)│     Payload      │
//! └──────────────────┴──────────┴──────────┴──────────────────┘
//! ```
//!
//! Status 0 on a response means success; any other value is the server's
//! errno-style failure code.
//!
//! ## Fixed-Width String Fields
//!
//! Group names (16), IP addresses (15), extensions (6) and prefix names (16)
//! are fixed-width on the wire: truncated to the field width, zero-padded on
//! the right, and read back up to the first zero byte.

mod command;
mod header;
mod request;
mod response;

pub use command::Command;
pub use header::FrameHeader;
pub use request::{
    delete_file_request, download_file_request, group_query_request, put_fixed_str,
    upload_file_request, upload_slave_file_request,
};
pub use response::{
    decode_upload_response, read_exact_payload, take_fixed_str, StorageServer,
    UploadFileResponse,
};

/// Frame header size: 8-byte payload length + command byte + status byte
pub const HEADER_SIZE: usize = 10;

/// Fixed width of a group name on the wire
pub const GROUP_NAME_MAX_LEN: usize = 16;

/// Fixed width of an IP address field on the wire
pub const IP_ADDRESS_LEN: usize = 15;

/// Fixed width of a file extension field on the wire
pub const FILE_EXT_NAME_MAX_LEN: usize = 6;

/// Fixed width of a slave prefix name field on the wire
pub const PREFIX_NAME_MAX_LEN: usize = 16;

/// Width of every length/offset/size field on the wire
pub const PKG_LEN_SIZE: usize = 8;

/// Body length of a tracker storage-server reply:
/// group (16) + ip (15) + port (8) + store path index (1)
pub const STORAGE_SERVER_BODY_LEN: usize =
    GROUP_NAME_MAX_LEN + IP_ADDRESS_LEN + PKG_LEN_SIZE + 1;

/// Fixed request fields preceding upload content: store path index (1) +
/// file size (8) + extension (6)
pub const UPLOAD_FIXED_LEN: usize = 1 + PKG_LEN_SIZE + FILE_EXT_NAME_MAX_LEN;

/// Fixed request fields preceding slave upload content: master name length
/// (8) + file size (8) + prefix (16) + extension (6)
pub const UPLOAD_SLAVE_FIXED_LEN: usize =
    PKG_LEN_SIZE + PKG_LEN_SIZE + PREFIX_NAME_MAX_LEN + FILE_EXT_NAME_MAX_LEN;
