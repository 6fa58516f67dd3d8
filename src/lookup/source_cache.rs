//! Shared cache of established source clients
//!
//! One client handle is established per configured feed and reused across
//! all lookups in a run to avoid repeated handshake cost. The cache is the
//! one piece of cross-request shared mutable state; it is internally locked
//! so callers need no synchronization of their own.

use super::source_client::{HttpSourceClient, SourceClient};
use crate::domain::PackageSource;
use crate::error::LookupError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Creates a client for a feed on first use
pub trait SourceClientFactory: Send + Sync {
    /// Build a client for the given feed
    fn create(&self, source: &PackageSource) -> Result<Arc<dyn SourceClient>, LookupError>;
}

/// Factory producing HTTP clients that share one reqwest connection pool
pub struct HttpSourceClientFactory {
    client: reqwest::Client,
}

impl HttpSourceClientFactory {
    /// Create the factory and its shared HTTP client
    pub fn new() -> Result<Self, LookupError> {
        Ok(Self {
            client: HttpSourceClient::build_http_client()?,
        })
    }
}

impl SourceClientFactory for HttpSourceClientFactory {
    fn create(&self, source: &PackageSource) -> Result<Arc<dyn SourceClient>, LookupError> {
        Ok(Arc::new(HttpSourceClient::new(
            self.client.clone(),
            source.clone(),
        )))
    }
}

/// Concurrent map from feed to established client handle
pub struct SourceClientCache {
    factory: Box<dyn SourceClientFactory>,
    clients: RwLock<HashMap<PackageSource, Arc<dyn SourceClient>>>,
}

impl SourceClientCache {
    /// Create an empty cache over the given factory
    pub fn new(factory: Box<dyn SourceClientFactory>) -> Self {
        Self {
            factory,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Get the client for a feed, creating and caching it on first use
    pub fn get(&self, source: &PackageSource) -> Result<Arc<dyn SourceClient>, LookupError> {
        {
            let clients = self
                .clients
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(client) = clients.get(source) {
                return Ok(Arc::clone(client));
            }
        }

        let mut clients = self
            .clients
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another task may have created it between the locks
        if let Some(client) = clients.get(source) {
            return Ok(Arc::clone(client));
        }

        let client = self.factory.create(source)?;
        clients.insert(source.clone(), Arc::clone(&client));
        Ok(client)
    }

    /// Number of feeds with an established client
    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no client has been established yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
