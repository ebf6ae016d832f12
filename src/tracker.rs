//! Tracker Protocol
//!
//! Resolves which storage server should serve an operation. Each query
//! leases a tracker connection, sends one frame, and decodes the
//! storage-server reply. Results are never cached; the tracker stays free
//! to rebalance between calls.

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;

use crate::error::{FdfsError, Result};
use crate::pool::ConnectionPool;
use crate::protocol::{
    delete_file_request, group_query_request, read_exact_payload, Command, FrameHeader,
    StorageServer,
};

/// Client for the tracker resolution protocol
pub struct TrackerClient {
    pool: Arc<ConnectionPool>,
}

impl TrackerClient {
    /// Create a tracker client over an existing tracker pool
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Ask for any storage server to store a new file
    ///
    /// The group in the reply is tracker-chosen and authoritative for the
    /// upload that follows.
    pub fn query_store_without_group(&self) -> Result<StorageServer> {
        self.query(Command::TrackerQueryStoreWithoutGroup, &[])
    }

    /// Ask for a storage server within a caller-chosen group
    pub fn query_store_with_group(&self, group_name: &str) -> Result<StorageServer> {
        self.query(
            Command::TrackerQueryStoreWithGroup,
            &group_query_request(group_name),
        )
    }

    /// Ask which storage server holds an existing file
    pub fn query_fetch(&self, group_name: &str, remote_filename: &str) -> Result<StorageServer> {
        // Fetch/update queries share the delete request layout:
        // group (16) + remote filename.
        self.query(
            Command::TrackerQueryFetch,
            &delete_file_request(group_name, remote_filename),
        )
    }

    /// Ask which storage server may modify an existing file
    pub fn query_update(&self, group_name: &str, remote_filename: &str) -> Result<StorageServer> {
        self.query(
            Command::TrackerQueryUpdate,
            &delete_file_request(group_name, remote_filename),
        )
    }

    fn query(&self, command: Command, body: &[u8]) -> Result<StorageServer> {
        let mut conn = self.pool.get()?;
        let result = Self::exchange(conn.stream(), command, body);
        if let Err(e) = &result {
            // A nonzero-status reply leaves the connection in a clean
            // frame boundary; anything else leaves it in an unknown state.
            if !matches!(e, FdfsError::Protocol { .. }) {
                conn.discard();
            }
            tracing::debug!(command = ?command, error = %e, "tracker query failed");
        }
        result
    }

    fn exchange(stream: &mut TcpStream, command: Command, body: &[u8]) -> Result<StorageServer> {
        FrameHeader::new(command, body.len() as u64).write_to(stream)?;
        stream.write_all(body)?;

        let header = FrameHeader::read_from(stream)?;
        header.ensure_ok()?;

        let payload = read_exact_payload(stream, header.payload_len)?;
        let server = StorageServer::decode(&payload)?;
        tracing::trace!(
            group = %server.group_name,
            addr = %server.ip_addr,
            port = server.port,
            "tracker resolved storage server"
        );
        Ok(server)
    }
}
