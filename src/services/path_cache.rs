//! Resolved route path cache
//!
//! Paths are resolved lazily on first need and reused for the process
//! lifetime; there is no invalidation. The cache is injected into services
//! so tests can use isolated instances. Concurrent first-time resolutions of
//! the same route are not coalesced — both callers hit the providers and the
//! later insert wins with an equivalent path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::types::RoutePath;

/// Process-lifetime cache of resolved paths, keyed by route
#[derive(Clone, Default)]
pub struct RoutePathCache {
    paths: Arc<RwLock<HashMap<Uuid, Arc<RoutePath>>>>,
}

impl RoutePathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, route_id: &Uuid) -> Option<Arc<RoutePath>> {
        self.paths.read().get(route_id).cloned()
    }

    /// Insert a freshly resolved path and return the cached handle
    pub fn insert(&self, path: RoutePath) -> Arc<RoutePath> {
        let route_id = path.route_id;
        let path = Arc::new(path);
        self.paths.write().insert(route_id, path.clone());
        path
    }

    pub fn len(&self) -> usize {
        self.paths.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }
}
