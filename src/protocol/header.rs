//! Frame header
//!
//! The 10-byte header carried on every request and response frame.

use std::io::{Read, Write};

use bytes::{Buf, BufMut};

use crate::error::{FdfsError, Result};
use crate::protocol::{Command, HEADER_SIZE};

/// Fixed-size frame header: payload length + command byte + status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Exact number of payload bytes following the header
    pub payload_len: u64,

    /// Command byte (see [`Command`])
    pub command: i8,

    /// Status byte; 0 means success on a response
    pub status: u8,
}

impl FrameHeader {
    /// Create a request header for the given command
    pub fn new(command: Command, payload_len: u64) -> Self {
        Self {
            payload_len,
            command: command.as_i8(),
            status: 0,
        }
    }

    /// Encode to the 10-byte wire representation
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        let mut buf = &mut bytes[..];
        buf.put_u64(self.payload_len);
        buf.put_i8(self.command);
        buf.put_u8(self.status);
        bytes
    }

    /// Decode from the wire representation
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(FdfsError::MalformedHeader(format!(
                "expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }
        let mut buf = bytes;
        Ok(Self {
            payload_len: buf.get_u64(),
            command: buf.get_i8(),
            status: buf.get_u8(),
        })
    }

    /// Read a header off a stream
    ///
    /// An early end of stream is a protocol fault, not a clean close.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                FdfsError::MalformedHeader("stream ended mid-header".to_string())
            } else {
                FdfsError::Io(e)
            }
        })?;
        Self::decode(&bytes)
    }

    /// Write the header to a stream
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        Ok(())
    }

    /// Fail with the preserved status code if this response reports an error
    pub fn ensure_ok(&self) -> Result<()> {
        if self.status != 0 {
            return Err(FdfsError::Protocol {
                status: self.status,
            });
        }
        Ok(())
    }
}
