//! Bounded connection pool for one logical endpoint
//!
//! Invariant: leased + idle ≤ `max_conns`. The idle set is a lock-free
//! bounded queue and the live count an atomic, so `get` either succeeds
//! immediately (idle reuse or fresh dial) or fails `PoolExhausted` — it
//! never blocks waiting for another caller's release.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::queue::ArrayQueue;
use rand::seq::SliceRandom;

use crate::error::{FdfsError, Result};
use crate::pool::PooledConn;
use crate::protocol::{Command, FrameHeader};

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Bounded pool of health-checked TCP connections to one endpoint
pub struct ConnectionPool {
    hosts: Vec<String>,
    port: u16,
    max_conns: usize,
    connect_timeout: Duration,

    /// Idle connections ready for lease
    idle: ArrayQueue<TcpStream>,

    /// Live connections: leased + idle
    live: AtomicUsize,

    closed: AtomicBool,
}

impl ConnectionPool {
    /// Create a pool with the default connect timeout, pre-dialing
    /// `min_conns` connections
    pub fn new(
        hosts: Vec<String>,
        port: u16,
        min_conns: usize,
        max_conns: usize,
    ) -> Result<Arc<Self>> {
        Self::with_timeout(hosts, port, min_conns, max_conns, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a pool with an explicit connect timeout
    ///
    /// Any pre-warm dial failure closes everything dialed so far and fails
    /// construction.
    pub fn with_timeout(
        hosts: Vec<String>,
        port: u16,
        min_conns: usize,
        max_conns: usize,
        connect_timeout: Duration,
    ) -> Result<Arc<Self>> {
        if max_conns == 0 {
            return Err(FdfsError::Config("max_conns must be positive".to_string()));
        }
        if min_conns > max_conns {
            return Err(FdfsError::Config(format!(
                "min_conns {min_conns} exceeds max_conns {max_conns}"
            )));
        }
        if hosts.is_empty() {
            return Err(FdfsError::Config("empty host set".to_string()));
        }

        let pool = Self {
            hosts,
            port,
            max_conns,
            connect_timeout,
            idle: ArrayQueue::new(max_conns),
            live: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        };

        for _ in 0..min_conns {
            // Dropping the pool closes every stream dialed so far.
            let stream = pool.dial()?;
            pool.live.fetch_add(1, Ordering::AcqRel);
            let _ = pool.idle.push(stream);
        }

        tracing::debug!(
            port = pool.port,
            min_conns,
            max_conns,
            "connection pool created"
        );
        Ok(Arc::new(pool))
    }

    /// Lease a connection
    ///
    /// Idle connections are liveness-probed before reuse; a stale one is
    /// discarded and the next candidate tried, so a single dead socket never
    /// fails the caller while capacity remains. With no idle connection and
    /// room under `max_conns`, a fresh connection is dialed and leased
    /// directly. At capacity this fails `PoolExhausted` immediately.
    pub fn get(self: &Arc<Self>) -> Result<PooledConn> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FdfsError::PoolClosed);
        }

        loop {
            match self.idle.pop() {
                Some(mut stream) => {
                    if Self::probe(&mut stream).is_ok() {
                        return Ok(PooledConn::new(stream, Arc::clone(self)));
                    }
                    tracing::debug!(port = self.port, "discarding stale pooled connection");
                    self.live.fetch_sub(1, Ordering::AcqRel);
                }
                None => {
                    self.reserve_slot()?;
                    match self.dial() {
                        Ok(stream) => return Ok(PooledConn::new(stream, Arc::clone(self))),
                        Err(e) => {
                            self.live.fetch_sub(1, Ordering::AcqRel);
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Reserve a live-connection slot, or fail `PoolExhausted`
    fn reserve_slot(&self) -> Result<()> {
        let mut live = self.live.load(Ordering::Acquire);
        loop {
            if live >= self.max_conns {
                return Err(FdfsError::PoolExhausted {
                    max: self.max_conns,
                });
            }
            match self.live.compare_exchange(
                live,
                live + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(current) => live = current,
            }
        }
    }

    /// Return a leased connection to the idle set, or close it if the pool
    /// is closed or full. Never errors.
    pub(crate) fn release(&self, stream: TcpStream) {
        if self.closed.load(Ordering::Acquire) {
            self.close_conn(stream);
            return;
        }
        if let Err(stream) = self.idle.push(stream) {
            self.close_conn(stream);
        }
    }

    /// Close a connection and give up its live slot
    pub(crate) fn close_conn(&self, stream: TcpStream) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        drop(stream);
    }

    /// Close the pool: subsequent `get` fails `PoolClosed`; idle connections
    /// are drained and closed; still-leased connections close individually
    /// on release.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        while let Some(stream) = self.idle.pop() {
            self.close_conn(stream);
        }
        tracing::debug!(port = self.port, "connection pool shut down");
    }

    /// Number of idle connections
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Number of live connections (leased + idle)
    pub fn live_len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Dial a random host from the host set
    fn dial(&self) -> Result<TcpStream> {
        let host = self
            .hosts
            .choose(&mut rand::thread_rng())
            .expect("host set validated non-empty");
        let addr = format!("{}:{}", host, self.port);

        let sock_addr = addr
            .to_socket_addrs()
            .map_err(|e| FdfsError::Dial {
                addr: addr.clone(),
                source: e,
            })?
            .next()
            .ok_or_else(|| FdfsError::Dial {
                addr: addr.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "hostname resolved to no addresses",
                ),
            })?;

        let stream = TcpStream::connect_timeout(&sock_addr, self.connect_timeout).map_err(
            |e| FdfsError::Dial {
                addr: addr.clone(),
                source: e,
            },
        )?;
        stream.set_nodelay(true).map_err(FdfsError::Io)?;
        tracing::trace!(%addr, "dialed connection");
        Ok(stream)
    }

    /// Liveness probe: send ACTIVE_TEST and require a response echo with
    /// status 0
    fn probe(stream: &mut TcpStream) -> Result<()> {
        FrameHeader::new(Command::ActiveTest, 0).write_to(stream)?;
        let reply = FrameHeader::read_from(stream)?;
        if reply.command != Command::Response.as_i8() || reply.status != 0 {
            return Err(FdfsError::Protocol {
                status: reply.status,
            });
        }
        Ok(())
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        // ArrayQueue drops remaining streams, closing the sockets.
        self.closed.store(true, Ordering::Release);
    }
}
