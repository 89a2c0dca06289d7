//! Route discovery.
//!
//! Routes are found by rendering the tree: every `Route` a render walks
//! through registers itself, but a route only renders its children when it is
//! selected. Discovery therefore renders the tree once with nothing selected,
//! then once more for every route that render added, and so on until a render
//! adds nothing new. Pending probes sit in an explicit work queue that is
//! bounded by [`BuildOptions::max_discovery_probes`].

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::{debug, info};

use crate::assets::NullAssets;
use crate::env::{DocumentScope, PageScope, RenderContext, RenderEnv};
use crate::error::BuildError;
use crate::node::Node;
use crate::options::BuildOptions;
use crate::paths::RoutePath;

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTE COLLECTION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub path: RoutePath,
    pub title: String,
    pub container_id: String,
}

/// Discovered routes in registration order. Route identity is
/// [`RoutePath::comparable_eq`]; the first registration of a path wins.
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<RouteDefinition>,
    top_container_id: String,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if an equal route is already present.
    pub fn add(&mut self, route: RouteDefinition) -> bool {
        if self.has(&route.path) {
            return false;
        }
        self.routes.push(route);
        true
    }

    pub fn get(&self, path: &RoutePath) -> Option<&RouteDefinition> {
        self.routes.iter().find(|r| r.path.comparable_eq(path))
    }

    pub fn has(&self, path: &RoutePath) -> bool {
        self.get(path).is_some()
    }

    pub fn all(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Container of the first outermost router seen.
    pub fn top_container_id(&self) -> &str {
        &self.top_container_id
    }

    /// The first router container registered wins.
    pub fn add_router_container(&mut self, container_id: &str) {
        if self.top_container_id.is_empty() {
            self.top_container_id = container_id.to_string();
        }
    }

    /// Container a route swaps into; the top container when unknown.
    pub fn container_id_for(&self, path: &RoutePath) -> String {
        self.get(path)
            .map(|r| r.container_id.clone())
            .unwrap_or_else(|| self.top_container_id.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRARS
// ═══════════════════════════════════════════════════════════════════════════════

/// Route registration surface handed to the tree.
pub trait RouteRegistrar {
    fn register_route(&self, path: &RoutePath, title: &str, container_id: &str);
    fn container_id_for_route(&self, path: &RoutePath) -> String;
    fn add_router_container(&self, container_id: &str);
}

/// Registrar used while probing: grows the collection and remembers which
/// routes the current probe added.
#[derive(Debug, Default)]
pub struct ProbeRegistrar {
    collection: RefCell<RouteCollection>,
    added: RefCell<Vec<RoutePath>>,
}

impl ProbeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes added since the last call.
    pub fn take_added(&self) -> Vec<RoutePath> {
        std::mem::take(&mut *self.added.borrow_mut())
    }

    pub fn into_collection(self) -> RouteCollection {
        self.collection.into_inner()
    }
}

impl RouteRegistrar for ProbeRegistrar {
    fn register_route(&self, path: &RoutePath, title: &str, container_id: &str) {
        let added = self.collection.borrow_mut().add(RouteDefinition {
            path: path.clone(),
            title: title.to_string(),
            container_id: container_id.to_string(),
        });
        if added {
            debug!(route = %path, container = container_id, "route registered");
            self.added.borrow_mut().push(path.clone());
        }
    }

    fn container_id_for_route(&self, path: &RoutePath) -> String {
        self.collection.borrow().container_id_for(path)
    }

    fn add_router_container(&self, container_id: &str) {
        self.collection.borrow_mut().add_router_container(container_id);
    }
}

/// Registrar used by the final build renders. The route set is fixed.
#[derive(Debug, Clone, Copy)]
pub struct FrozenRoutes<'a>(pub &'a RouteCollection);

impl RouteRegistrar for FrozenRoutes<'_> {
    fn register_route(&self, _path: &RoutePath, _title: &str, _container_id: &str) {}

    fn container_id_for_route(&self, path: &RoutePath) -> String {
        self.0.container_id_for(path)
    }

    fn add_router_container(&self, _container_id: &str) {}
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Enumerate every route reachable in `root`.
pub async fn collect_routes(
    root: &Node,
    options: &BuildOptions,
) -> Result<RouteCollection, BuildError> {
    if root.is_empty() {
        return Err(BuildError::MissingRoot);
    }

    info!("collecting routes");

    let registrar = ProbeRegistrar::new();
    let assets = NullAssets;
    let mut queue = VecDeque::from([RoutePath::root()]);
    let mut probes = 0usize;

    while let Some(selected) = queue.pop_front() {
        if probes >= options.max_discovery_probes {
            return Err(BuildError::DiscoveryLimit {
                limit: options.max_discovery_probes,
            });
        }
        probes += 1;
        debug!(selected = %selected, probe = probes, "probing routes");

        let document = DocumentScope::new();
        let page = PageScope::new();
        let cx = RenderContext::new(
            RenderEnv::probe(&selected),
            options,
            &registrar,
            &assets,
            None,
            &document,
            &page,
        );
        cx.render(root).await?;

        queue.extend(registrar.take_added());
    }

    let collection = registrar.into_collection();
    info!(routes = collection.len(), probes, "route discovery settled");
    Ok(collection)
}
