//! Storage Protocol
//!
//! Binary exchanges with a storage server: upload (new, slave, appender),
//! delete, and ranged download. Upload content comes from a sum type over
//! {path, buffer, stream}; downloads go to a file or accumulate in memory.
//!
//! Every operation leases one connection, performs the full exchange, and
//! releases the connection via the [`PooledConn`] guard on every exit path.
//! Any I/O or framing error discards the connection instead of pooling it.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{FdfsError, Result};
use crate::pool::{ConnectionPool, PooledConn};
use crate::protocol::{
    decode_upload_response, delete_file_request, download_file_request, read_exact_payload,
    upload_file_request, upload_slave_file_request, Command, FrameHeader, StorageServer,
    UploadFileResponse,
};

/// Chunk size for stream-sourced uploads
pub const UPLOAD_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Seekable, readable upload stream
pub trait UploadStream: Read + Seek + Send {}
impl<T: Read + Seek + Send> UploadStream for T {}

/// Content source for an upload
pub enum UploadSource {
    /// Stream a local file's bytes
    Path(PathBuf),

    /// Write an in-memory byte buffer
    Buffer(Vec<u8>),

    /// Read a seekable stream in fixed-size chunks; size discovered by
    /// seeking to the end
    Stream(Box<dyn UploadStream>),
}

impl UploadSource {
    /// Discover the number of content bytes this source will produce
    fn size(&mut self) -> Result<u64> {
        match self {
            UploadSource::Path(path) => Ok(std::fs::metadata(path)?.len()),
            UploadSource::Buffer(buf) => Ok(buf.len() as u64),
            UploadSource::Stream(reader) => {
                reader.seek(SeekFrom::Start(0))?;
                let size = reader.seek(SeekFrom::End(0))?;
                reader.seek(SeekFrom::Start(0))?;
                Ok(size)
            }
        }
    }
}

/// Upload operation kind
pub enum UploadKind {
    /// Standalone immutable file
    New,

    /// File open for later appends
    Appender,

    /// Secondary file linked to a prior master upload
    Slave {
        /// Remote filename of the master file (without its group)
        master_filename: String,

        /// Prefix distinguishing this slave from others of the same master
        prefix: String,
    },
}

/// Destination for a download
pub enum DownloadSink {
    /// Stream into a newly created local file
    Path(PathBuf),

    /// Accumulate in memory
    Buffer,
}

/// Where downloaded content ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadContent {
    /// Content was written to this local file
    SavedTo(PathBuf),

    /// Content accumulated in memory
    Bytes(Vec<u8>),
}

/// Result of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFileResponse {
    /// `<group>/<remote filename>` of the downloaded file
    pub remote_file_id: String,

    /// The downloaded content or its on-disk location
    pub content: DownloadContent,

    /// Bytes actually received
    pub download_size: u64,
}

/// Client for the storage transfer protocol against one endpoint
pub struct StorageClient {
    pool: Arc<ConnectionPool>,
}

impl StorageClient {
    /// Create a storage client over the endpoint's pool
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Upload content and return its new remote identifier
    ///
    /// `server` is the tracker resolution for this operation; its store
    /// path index is carried back unchanged on new/appender uploads.
    pub fn upload(
        &self,
        server: &StorageServer,
        mut source: UploadSource,
        kind: UploadKind,
        file_ext: &str,
    ) -> Result<UploadFileResponse> {
        let file_size = source.size()?;

        let (command, fixed) = match &kind {
            UploadKind::New => (
                Command::StorageUploadFile,
                upload_file_request(server.store_path_index, file_size, file_ext),
            ),
            UploadKind::Appender => (
                Command::StorageUploadAppenderFile,
                upload_file_request(server.store_path_index, file_size, file_ext),
            ),
            UploadKind::Slave {
                master_filename,
                prefix,
            } => (
                Command::StorageUploadSlaveFile,
                upload_slave_file_request(file_size, prefix, file_ext, master_filename),
            ),
        };
        let payload_len = fixed.len() as u64 + file_size;

        let mut conn = self.pool.get()?;
        let result = Self::upload_exchange(
            conn.stream(),
            command,
            payload_len,
            &fixed,
            &mut source,
            file_size,
        );
        discard_on_wire_error(&mut conn, &result);
        let response = result?;
        tracing::debug!(
            remote_file_id = %response.remote_file_id,
            file_size,
            "uploaded file"
        );
        Ok(response)
    }

    fn upload_exchange(
        stream: &mut TcpStream,
        command: Command,
        payload_len: u64,
        fixed: &[u8],
        source: &mut UploadSource,
        file_size: u64,
    ) -> Result<UploadFileResponse> {
        FrameHeader::new(command, payload_len).write_to(stream)?;
        stream.write_all(fixed)?;
        send_content(stream, source, file_size)?;

        let header = FrameHeader::read_from(stream)?;
        header.ensure_ok()?;

        let payload = read_exact_payload(stream, header.payload_len)?;
        decode_upload_response(&payload)
    }

    /// Delete a remote file; success has no response body
    pub fn delete(&self, group_name: &str, remote_filename: &str) -> Result<()> {
        let body = delete_file_request(group_name, remote_filename);

        let mut conn = self.pool.get()?;
        let result = (|| {
            let stream = conn.stream();
            FrameHeader::new(Command::StorageDeleteFile, body.len() as u64).write_to(stream)?;
            stream.write_all(&body)?;
            FrameHeader::read_from(stream)?.ensure_ok()
        })();
        discard_on_wire_error(&mut conn, &result);
        result?;
        tracing::debug!(group = group_name, name = remote_filename, "deleted file");
        Ok(())
    }

    /// Download a byte range of a remote file
    ///
    /// `download_size` 0 requests the whole remaining file from `offset`;
    /// a positive value is a minimum: receiving fewer bytes fails
    /// `ShortResponse` with no partial result.
    pub fn download(
        &self,
        sink: DownloadSink,
        group_name: &str,
        remote_filename: &str,
        offset: u64,
        download_size: u64,
    ) -> Result<DownloadFileResponse> {
        let body = download_file_request(offset, download_size, group_name, remote_filename);

        let mut conn = self.pool.get()?;
        let result = Self::download_exchange(conn.stream(), &body, &sink);
        discard_on_wire_error(&mut conn, &result);
        let (content, received) = result?;
        drop(conn);

        if download_size > 0 && received < download_size {
            return Err(FdfsError::ShortResponse {
                expected: download_size,
                got: received,
            });
        }

        tracing::debug!(
            group = group_name,
            name = remote_filename,
            received,
            "downloaded file"
        );
        Ok(DownloadFileResponse {
            remote_file_id: format!("{group_name}/{remote_filename}"),
            content,
            download_size: received,
        })
    }

    fn download_exchange(
        stream: &mut TcpStream,
        body: &[u8],
        sink: &DownloadSink,
    ) -> Result<(DownloadContent, u64)> {
        FrameHeader::new(Command::StorageDownloadFile, body.len() as u64).write_to(stream)?;
        stream.write_all(body)?;

        let header = FrameHeader::read_from(stream)?;
        header.ensure_ok()?;
        let len = header.payload_len;

        match sink {
            DownloadSink::Buffer => {
                let payload = read_exact_payload(stream, len)?;
                Ok((DownloadContent::Bytes(payload), len))
            }
            DownloadSink::Path(path) => {
                let mut file = File::create(path)?;
                let copied = std::io::copy(&mut std::io::Read::by_ref(stream).take(len), &mut file)?;
                if copied < len {
                    return Err(FdfsError::ShortResponse {
                        expected: len,
                        got: copied,
                    });
                }
                Ok((DownloadContent::SavedTo(path.clone()), copied))
            }
        }
    }
}

/// Discard the leased connection unless the operation succeeded or failed
/// cleanly at a frame boundary (nonzero-status reply)
fn discard_on_wire_error<T>(conn: &mut PooledConn, result: &Result<T>) {
    if let Err(e) = result {
        if !matches!(e, FdfsError::Protocol { .. }) {
            conn.discard();
        }
    }
}

/// Send upload content after the fixed request fields
fn send_content(stream: &mut TcpStream, source: &mut UploadSource, file_size: u64) -> Result<()> {
    match source {
        UploadSource::Path(path) => {
            let mut file = File::open(path)?;
            let copied = std::io::copy(&mut (&mut file).take(file_size), stream)?;
            if copied < file_size {
                return Err(FdfsError::ShortRead {
                    expected: file_size,
                    got: copied,
                });
            }
            Ok(())
        }
        UploadSource::Buffer(buf) => {
            stream.write_all(buf)?;
            Ok(())
        }
        UploadSource::Stream(reader) => {
            let mut chunk = vec![0u8; UPLOAD_CHUNK_SIZE.min(file_size as usize).max(1)];
            let mut sent: u64 = 0;
            while sent < file_size {
                let want = UPLOAD_CHUNK_SIZE.min((file_size - sent) as usize);
                let n = read_full(reader.as_mut(), &mut chunk[..want])?;
                if n == 0 {
                    // Source ended before producing the promised bytes.
                    return Err(FdfsError::ShortRead {
                        expected: file_size,
                        got: sent,
                    });
                }
                stream.write_all(&chunk[..n])?;
                sent += n as u64;
            }
            Ok(())
        }
    }
}

/// Read into `buf` until it is full or the reader reaches end of input
fn read_full(reader: &mut dyn UploadStream, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
