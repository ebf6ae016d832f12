//! Response body decoders

use std::io::Read;

use bytes::Buf;

use crate::error::{FdfsError, Result};
use crate::protocol::{GROUP_NAME_MAX_LEN, IP_ADDRESS_LEN, STORAGE_SERVER_BODY_LEN};

/// A storage endpoint resolved by the tracker for one operation
///
/// Produced per call and never cached; the tracker is free to return a
/// different server next time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageServer {
    /// IP address of the storage server
    pub ip_addr: String,

    /// TCP port of the storage server
    pub port: u16,

    /// Group the server was chosen from. When the caller named no group,
    /// this tracker-chosen value is authoritative downstream.
    pub group_name: String,

    /// Store path index the upload request must carry back unchanged
    pub store_path_index: u8,
}

impl StorageServer {
    /// Decode a tracker reply body:
    /// group (16) + ip (15) + port (8) + store path index (1)
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < STORAGE_SERVER_BODY_LEN {
            return Err(FdfsError::ShortResponse {
                expected: STORAGE_SERVER_BODY_LEN as u64,
                got: payload.len() as u64,
            });
        }
        let mut buf = payload;
        let group_name = take_fixed_str(&mut buf, GROUP_NAME_MAX_LEN)?;
        let ip_addr = take_fixed_str(&mut buf, IP_ADDRESS_LEN)?;
        let port = buf.get_u64();
        let store_path_index = buf.get_u8();
        let port = u16::try_from(port).map_err(|_| {
            FdfsError::MalformedHeader(format!("storage server port {port} out of range"))
        })?;
        Ok(Self {
            ip_addr,
            port,
            group_name,
            store_path_index,
        })
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFileResponse {
    /// Group the file was stored in
    pub group_name: String,

    /// Full `<group>/<remote filename>` identifier for later operations
    pub remote_file_id: String,
}

/// Decode an upload reply body: group (16) + remote filename (rest)
///
/// A body shorter than the group field cannot name a file.
pub fn decode_upload_response(payload: &[u8]) -> Result<UploadFileResponse> {
    if payload.len() <= GROUP_NAME_MAX_LEN {
        return Err(FdfsError::ShortResponse {
            expected: GROUP_NAME_MAX_LEN as u64 + 1,
            got: payload.len() as u64,
        });
    }
    let mut buf = payload;
    let group_name = take_fixed_str(&mut buf, GROUP_NAME_MAX_LEN)?;
    let remote_filename = String::from_utf8_lossy(buf).into_owned();
    let remote_file_id = format!("{group_name}/{remote_filename}");
    Ok(UploadFileResponse {
        group_name,
        remote_file_id,
    })
}

/// Read a fixed-width string field: consumes exactly `width` bytes and
/// returns the prefix up to the first zero byte
pub fn take_fixed_str(buf: &mut &[u8], width: usize) -> Result<String> {
    if buf.len() < width {
        return Err(FdfsError::ShortRead {
            expected: width as u64,
            got: buf.len() as u64,
        });
    }
    let field = &buf[..width];
    let end = field.iter().position(|&b| b == 0).unwrap_or(width);
    let value = String::from_utf8_lossy(&field[..end]).into_owned();
    buf.advance(width);
    Ok(value)
}

/// Read exactly `len` payload bytes off a stream
///
/// An early end of stream fails `ShortResponse` with the byte counts, so a
/// peer that closes mid-payload never yields a partial result.
pub fn read_exact_payload<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; len as usize];
    let mut got: usize = 0;
    while got < payload.len() {
        let n = reader.read(&mut payload[got..])?;
        if n == 0 {
            return Err(FdfsError::ShortResponse {
                expected: len,
                got: got as u64,
            });
        }
        got += n;
    }
    Ok(payload)
}
