//! Request body encoders
//!
//! Builds the payload bytes that follow the frame header for each request.
//! Upload request bodies cover the fixed fields only; file content is
//! streamed separately after them.

use bytes::{BufMut, BytesMut};

use crate::protocol::{
    FILE_EXT_NAME_MAX_LEN, GROUP_NAME_MAX_LEN, PREFIX_NAME_MAX_LEN, UPLOAD_FIXED_LEN,
    UPLOAD_SLAVE_FIXED_LEN,
};

/// Write a fixed-width string field: truncated to `width` bytes and
/// zero-padded on the right
pub fn put_fixed_str(buf: &mut impl BufMut, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let take = bytes.len().min(width);
    buf.put_slice(&bytes[..take]);
    buf.put_bytes(0, width - take);
}

/// Fixed fields of an upload / appender-upload request:
/// store path index (1) + file size (8) + extension (6)
pub fn upload_file_request(store_path_index: u8, file_size: u64, ext: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(UPLOAD_FIXED_LEN);
    buf.put_u8(store_path_index);
    buf.put_u64(file_size);
    put_fixed_str(&mut buf, ext, FILE_EXT_NAME_MAX_LEN);
    buf
}

/// Fixed fields of a slave upload request:
/// master name length (8) + file size (8) + prefix (16) + extension (6) +
/// master filename (variable)
pub fn upload_slave_file_request(
    file_size: u64,
    prefix: &str,
    ext: &str,
    master_filename: &str,
) -> BytesMut {
    let mut buf = BytesMut::with_capacity(UPLOAD_SLAVE_FIXED_LEN + master_filename.len());
    buf.put_u64(master_filename.len() as u64);
    buf.put_u64(file_size);
    put_fixed_str(&mut buf, prefix, PREFIX_NAME_MAX_LEN);
    put_fixed_str(&mut buf, ext, FILE_EXT_NAME_MAX_LEN);
    buf.put_slice(master_filename.as_bytes());
    buf
}

/// Delete request body: group (16) + remote filename (variable)
pub fn delete_file_request(group_name: &str, remote_filename: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(GROUP_NAME_MAX_LEN + remote_filename.len());
    put_fixed_str(&mut buf, group_name, GROUP_NAME_MAX_LEN);
    buf.put_slice(remote_filename.as_bytes());
    buf
}

/// Download request body:
/// offset (8) + download size (8) + group (16) + remote filename (variable)
pub fn download_file_request(
    offset: u64,
    download_size: u64,
    group_name: &str,
    remote_filename: &str,
) -> BytesMut {
    let mut buf = BytesMut::with_capacity(8 + 8 + GROUP_NAME_MAX_LEN + remote_filename.len());
    buf.put_u64(offset);
    buf.put_u64(download_size);
    put_fixed_str(&mut buf, group_name, GROUP_NAME_MAX_LEN);
    buf.put_slice(remote_filename.as_bytes());
    buf
}

/// Tracker store query body for a caller-chosen group: group (16)
pub fn group_query_request(group_name: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(GROUP_NAME_MAX_LEN);
    put_fixed_str(&mut buf, group_name, GROUP_NAME_MAX_LEN);
    buf
}
