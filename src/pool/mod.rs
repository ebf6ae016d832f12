//! Connection Pool Module
//!
//! Pooled TCP connections to trackers and storage servers.
//!
//! ## Architecture
//! - [`ConnectionPool`]: bounded pool for one logical endpoint; lock-free
//!   idle queue plus a live-connection counter, so `get`/release never block
//!   waiting on another caller.
//! - [`PooledConn`]: lease guard; drop returns the connection to the pool or
//!   closes it, exactly once on every exit path.
//! - [`PoolRegistry`]: process-wide endpoint-key → pool map; one pool is
//!   constructed per key even under concurrent first access.

mod conn;
mod pool;
mod registry;

pub use conn::PooledConn;
pub use pool::ConnectionPool;
pub use registry::PoolRegistry;
