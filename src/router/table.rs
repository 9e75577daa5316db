use crate::adapter::Adapter;
use crate::error::RouteError;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type Routes = HashMap<String, Adapter>;

/// A registered path and the adapter serving it.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub adapter: Adapter,
}

/// Concurrent map from request path to [`Adapter`].
///
/// Lookups load the current snapshot without locking. Writers clone the map,
/// apply their change and publish the new snapshot; a mutex keeps writers
/// from losing each other's updates. A lookup therefore sees a route either
/// fully registered or not at all.
pub struct RouteTable {
    routes: ArcSwap<Routes>,
    write_lock: Mutex<()>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: ArcSwap::from_pointee(Routes::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Register `adapter` under `path`.
    ///
    /// # Errors
    ///
    /// [`RouteError::DuplicateRoute`] if the path is already taken. The table
    /// is left unchanged in that case.
    pub fn register(&self, path: &str, adapter: Adapter) -> Result<(), RouteError> {
        let path = normalize_path(path);
        let _guard = self.write_lock.lock();
        let current = self.routes.load();
        if current.contains_key(&path) {
            return Err(RouteError::DuplicateRoute { path });
        }
        let mut next = Routes::clone(&current);
        next.insert(path.clone(), adapter);
        self.routes.store(Arc::new(next));
        debug!(path = %path, "route registered");
        Ok(())
    }

    /// Register several routes at once. Either all of them are published or,
    /// on the first duplicate, none.
    pub fn register_all(&self, routes: Vec<Route>) -> Result<(), RouteError> {
        let _guard = self.write_lock.lock();
        let current = self.routes.load();
        let mut next = Routes::clone(&current);
        let mut added = Vec::with_capacity(routes.len());
        for route in routes {
            let path = normalize_path(&route.path);
            if next.contains_key(&path) {
                return Err(RouteError::DuplicateRoute { path });
            }
            next.insert(path.clone(), route.adapter);
            added.push(path);
        }
        self.routes.store(Arc::new(next));
        for path in added {
            debug!(path = %path, "route registered");
        }
        Ok(())
    }

    /// Adapter registered for `path`, if any.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<Adapter> {
        let routes = self.routes.load();
        if path.starts_with('/') && !path.starts_with("//") {
            return routes.get(path).cloned();
        }
        routes.get(&normalize_path(path)).cloned()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Remove the route at `path`. Returns whether a route was removed;
    /// removing an unknown path is a no-op.
    pub fn unregister(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let _guard = self.write_lock.lock();
        let current = self.routes.load();
        if !current.contains_key(&path) {
            return false;
        }
        let mut next = Routes::clone(&current);
        next.remove(&path);
        self.routes.store(Arc::new(next));
        debug!(path = %path, "route unregistered");
        true
    }

    /// Remove every route.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        let removed = self.routes.swap(Arc::new(Routes::new())).len();
        debug!(removed, "route table cleared");
    }

    /// Registered paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.routes.load().keys().cloned().collect();
        paths.sort();
        paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.load().is_empty()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("paths", &self.paths())
            .finish()
    }
}

/// Canonical form of a route path: exactly one leading `/`.
///
/// `"Add"`, `"/Add"` and `"//Add"` all map to `"/Add"`. The rest of the path is
/// kept as is, so matching stays case-sensitive.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Route path for method `name` under `prefix`.
///
/// A trailing `/` on the prefix is ignored; an empty prefix mounts the method
/// at the root.
#[must_use]
pub fn route_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        normalize_path(name)
    } else {
        normalize_path(&format!("{prefix}/{name}"))
    }
}
