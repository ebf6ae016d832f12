//! Pool registry
//!
//! Process-wide map from endpoint key to its connection pool. Storage pools
//! are built on demand the first time an endpoint is resolved; the map is
//! mutated only then and read-mostly afterwards.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::pool::ConnectionPool;

static GLOBAL: OnceLock<PoolRegistry> = OnceLock::new();

/// Registry of connection pools keyed by endpoint
#[derive(Default)]
pub struct PoolRegistry {
    pools: Mutex<HashMap<String, Arc<ConnectionPool>>>,
}

impl PoolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry instance
    pub fn global() -> &'static PoolRegistry {
        GLOBAL.get_or_init(PoolRegistry::new)
    }

    /// Return the pool for `key`, constructing it on first access
    ///
    /// Construction happens under the map lock, so exactly one pool is
    /// built per key even under concurrent first access. The lock is held
    /// across the pre-warm dials; this serializes only the one-time
    /// construction per distinct endpoint, never steady-state `get` calls,
    /// which go through each pool's own synchronization. A construction
    /// failure propagates to the caller and is not cached.
    pub fn get_or_create(
        &self,
        key: &str,
        hosts: Vec<String>,
        port: u16,
        min_conns: usize,
        max_conns: usize,
        connect_timeout: Duration,
    ) -> Result<Arc<ConnectionPool>> {
        let mut pools = self.pools.lock();
        if let Some(pool) = pools.get(key) {
            return Ok(Arc::clone(pool));
        }

        tracing::debug!(key, "constructing connection pool");
        let pool =
            ConnectionPool::with_timeout(hosts, port, min_conns, max_conns, connect_timeout)?;
        pools.insert(key.to_string(), Arc::clone(&pool));
        Ok(pool)
    }

    /// Number of registered pools
    pub fn len(&self) -> usize {
        self.pools.lock().len()
    }

    /// Whether the registry holds no pools
    pub fn is_empty(&self) -> bool {
        self.pools.lock().is_empty()
    }

    /// Close every registered pool and clear the registry
    pub fn shutdown_all(&self) {
        let pools = std::mem::take(&mut *self.pools.lock());
        for (key, pool) in pools {
            tracing::debug!(key, "shutting down pool");
            pool.shutdown();
        }
    }
}
