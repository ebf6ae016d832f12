//! Pooled connection guard
//!
//! A leased connection is exclusively owned by its caller until the guard
//! drops. Drop decides return-vs-close based on the pool's current state,
//! which makes the release happen exactly once on every exit path,
//! including early returns through `?`.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use crate::pool::ConnectionPool;

/// A connection leased from a [`ConnectionPool`]
pub struct PooledConn {
    stream: Option<TcpStream>,
    pool: Arc<ConnectionPool>,
    reusable: bool,
}

impl PooledConn {
    pub(crate) fn new(stream: TcpStream, pool: Arc<ConnectionPool>) -> Self {
        Self {
            stream: Some(stream),
            pool,
            reusable: true,
        }
    }

    /// Access the underlying stream
    pub fn stream(&mut self) -> &mut TcpStream {
        self.stream
            .as_mut()
            .expect("stream present until guard drops")
    }

    /// Mark the connection as unfit for reuse
    ///
    /// After an I/O error mid-exchange the connection's protocol state is
    /// unknown, so drop must close it instead of pooling it.
    pub fn discard(&mut self) {
        self.reusable = false;
    }
}

impl Read for PooledConn {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream().read(buf)
    }
}

impl Write for PooledConn {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream().flush()
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if self.reusable {
                self.pool.release(stream);
            } else {
                self.pool.close_conn(stream);
            }
        }
    }
}
