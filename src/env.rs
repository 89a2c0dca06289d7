//! Render environment and context.
//!
//! [`RenderEnv`] is the immutable record of ambient values a subtree is
//! rendered under (selected route, current route, enclosing router, open
//! conditional, open form). Entering a scope produces an extended copy; the
//! parent's record is never touched.
//!
//! [`RenderContext`] pairs an environment with the collaborators of the current
//! render: route registration, asset registration, the build session (absent
//! while discovering routes), the per-document loop-name counter and the
//! per-page resource and metadata collectors.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::actions::FormScope;
use crate::assets::AssetRegistry;
use crate::discovery::RouteRegistrar;
use crate::error::RenderError;
use crate::fragments::FragmentHandle;
use crate::islands::IslandRecord;
use crate::node::Node;
use crate::options::BuildOptions;
use crate::pages::RequiredResource;
use crate::paths::{segments_match, RoutePath};
use crate::render::render_node;
use crate::session::BuildSession;

lazy_static! {
    static ref NON_LETTERS: Regex = Regex::new(r"[^a-zA-Z]").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDER ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct RenderEnv {
    /// True for the final page renders, false while probing for routes.
    pub build_phase: bool,
    /// Route segments still to be matched below this point.
    pub selected_route: Vec<String>,
    /// Route segments matched above this point.
    pub current_route: RoutePath,
    /// Title of the page being built.
    pub route_title: String,
    /// Id of the nearest enclosing router container.
    pub router_container: Option<String>,
    pub(crate) conditional: Option<ElseSlot>,
    pub(crate) form: Option<FormScope>,
    pub(crate) head: Option<HeadEntries>,
}

impl RenderEnv {
    pub fn probe(selected: &RoutePath) -> Self {
        Self {
            build_phase: false,
            selected_route: selected.segments().to_vec(),
            ..Self::default()
        }
    }

    pub fn page(route: &RoutePath, title: &str) -> Self {
        Self {
            build_phase: true,
            selected_route: route.segments().to_vec(),
            route_title: title.to_string(),
            ..Self::default()
        }
    }

    /// Whether a route path matches the next selected segments.
    pub fn selects(&self, path: &str) -> bool {
        let path = RoutePath::parse(path);
        !path.is_empty()
            && self.selected_route.len() >= path.len()
            && path
                .segments()
                .iter()
                .zip(&self.selected_route)
                .all(|(a, b)| segments_match(a, b))
    }

    /// Descend into a matched route: extend the current route by `path` and
    /// consume as many selected segments.
    pub fn enter_route(&self, path: &str) -> Self {
        let consumed = RoutePath::parse(path).len();
        Self {
            current_route: self.current_route.join(path),
            selected_route: self
                .selected_route
                .iter()
                .skip(consumed)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    pub fn in_router(&self, container_id: &str) -> Self {
        Self {
            router_container: Some(container_id.to_string()),
            ..self.clone()
        }
    }

    /// Environment for a separately compiled document: the enclosing page's
    /// open conditional and head do not reach into it.
    pub(crate) fn detached(&self) -> Self {
        Self {
            conditional: None,
            head: None,
            ..self.clone()
        }
    }

    /// Environment for an else branch.
    pub(crate) fn outside_conditional(&self) -> Self {
        Self {
            conditional: None,
            ..self.clone()
        }
    }

    pub(crate) fn in_conditional(&self, slot: ElseSlot) -> Self {
        Self {
            conditional: Some(slot),
            ..self.clone()
        }
    }

    pub(crate) fn in_form(&self, form: FormScope) -> Self {
        Self {
            form: Some(form),
            ..self.clone()
        }
    }

    pub(crate) fn in_html(&self, head: HeadEntries) -> Self {
        Self {
            head: Some(head),
            ..self.clone()
        }
    }
}

/// Where an `Else` marker deposits its branch for the enclosing `If`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ElseSlot(Rc<RefCell<Option<Node>>>);

impl ElseSlot {
    pub(crate) fn fill(&self, branch: Node) -> Result<(), RenderError> {
        let mut slot = self.0.borrow_mut();
        if slot.is_some() {
            return Err(RenderError::misuse(
                "Else",
                "a conditional accepts a single else branch",
            ));
        }
        *slot = Some(branch);
        Ok(())
    }

    pub(crate) fn take(&self) -> Option<Node> {
        self.0.borrow_mut().take()
    }
}

/// Elements collected from the body for the document head.
#[derive(Debug, Clone, Default)]
pub(crate) struct HeadEntries(Rc<RefCell<Vec<Node>>>);

impl HeadEntries {
    pub(crate) fn push(&self, entry: Node) {
        self.0.borrow_mut().push(entry);
    }

    pub(crate) fn take(&self) -> Vec<Node> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCOPES
// ═══════════════════════════════════════════════════════════════════════════════

/// State of one compiled document (a page or a fragment body). Loop names
/// and form ids depend only on the document's own content.
#[derive(Debug)]
pub struct DocumentScope {
    next_loop: Cell<u64>,
    next_form: Cell<u64>,
    form_prefix: String,
}

impl DocumentScope {
    pub fn new() -> Self {
        Self {
            next_loop: Cell::new(0),
            next_form: Cell::new(0),
            form_prefix: "form".to_string(),
        }
    }

    /// Scope for the body of a fragment serving `resource`. Its form ids are
    /// prefixed so they cannot clash with the host page's.
    pub fn fragment(resource: &str) -> Self {
        Self {
            form_prefix: format!("form_{}", resource_key(resource)),
            ..Self::new()
        }
    }
}

impl Default for DocumentScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Collected while rendering one page.
#[derive(Debug, Default)]
pub struct PageScope {
    resources: RefCell<Vec<RequiredResource>>,
    metadata: RefCell<Map<String, Value>>,
}

impl PageScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_parts(self) -> (Vec<RequiredResource>, Map<String, Value>) {
        (self.resources.into_inner(), self.metadata.into_inner())
    }
}

/// Template variable a page exposes a required resource under: letters only,
/// first one upper-cased.
pub fn resource_key(resource: &str) -> String {
    let letters = NON_LETTERS.replace_all(resource, "");
    let mut chars = letters.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDER CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

pub struct RenderContext<'s> {
    env: RenderEnv,
    options: &'s BuildOptions,
    routes: &'s dyn RouteRegistrar,
    assets: &'s dyn AssetRegistry,
    session: Option<&'s BuildSession>,
    document: &'s DocumentScope,
    page: &'s PageScope,
}

impl<'s> RenderContext<'s> {
    pub fn new(
        env: RenderEnv,
        options: &'s BuildOptions,
        routes: &'s dyn RouteRegistrar,
        assets: &'s dyn AssetRegistry,
        session: Option<&'s BuildSession>,
        document: &'s DocumentScope,
        page: &'s PageScope,
    ) -> Self {
        Self {
            env,
            options,
            routes,
            assets,
            session,
            document,
            page,
        }
    }

    pub fn env(&self) -> &RenderEnv {
        &self.env
    }

    pub fn options(&self) -> &BuildOptions {
        self.options
    }

    pub fn routes(&self) -> &dyn RouteRegistrar {
        self.routes
    }

    pub fn assets(&self) -> &dyn AssetRegistry {
        self.assets
    }

    pub fn session(&self) -> Option<&BuildSession> {
        self.session
    }

    /// Same collaborators, different environment.
    pub fn scoped(&self, env: RenderEnv) -> RenderContext<'s> {
        RenderContext { env, ..*self }
    }

    /// Same collaborators, fresh document (loop names restart).
    pub fn with_document<'x>(&'x self, document: &'x DocumentScope) -> RenderContext<'x> {
        RenderContext {
            env: self.env.clone(),
            options: self.options,
            routes: self.routes,
            assets: self.assets,
            session: self.session,
            document,
            page: self.page,
        }
    }

    pub async fn render(&self, node: &Node) -> Result<String, RenderError> {
        render_node(node, self).await
    }

    /// Element and index variable names for a new loop. Never repeats within
    /// the current document.
    pub fn next_loop_names(&self) -> (String, String) {
        let n = self.document.next_loop.get();
        self.document.next_loop.set(n + 1);
        let elem = format!("$_i{}", n);
        let key = format!("{}_key", elem);
        (elem, key)
    }

    /// Id for a new form. Numbering restarts in every document.
    pub fn next_form_id(&self) -> String {
        let n = self.document.next_form.get() + 1;
        self.document.next_form.set(n);
        format!("{}_{}", self.document.form_prefix, n)
    }

    /// Register a compiled fragment with the build session. While probing for
    /// routes there is no session and the fragment is discarded.
    pub fn register_fragment(&self, logical_name: &str, compiled: &str) -> FragmentHandle {
        match self.session {
            Some(session) => session.register_fragment(logical_name, compiled),
            None => FragmentHandle::discarded(),
        }
    }

    pub fn finalize_island(&self, island: IslandRecord) {
        if let Some(session) = self.session {
            session.finalize_island(island);
        }
    }

    /// Record that the page needs `resource` and return its template key.
    pub fn require_resource(&self, resource: &str) -> String {
        let key = resource_key(resource);
        let mut resources = self.page.resources.borrow_mut();
        if !resources.iter().any(|r| r.res == resource) {
            resources.push(RequiredResource {
                key: key.clone(),
                res: resource.to_string(),
            });
        }
        key
    }

    pub fn add_metadata(&self, key: &str, value: Value) {
        self.page.metadata.borrow_mut().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_key() {
        assert_eq!(resource_key("user"), "User");
        assert_eq!(resource_key("user-profile_2"), "Userprofile");
        assert_eq!(resource_key("123"), "");
    }

    #[test]
    fn test_enter_route_consumes_selection() {
        let env = RenderEnv::probe(&RoutePath::parse("products/1"));
        assert!(env.selects("products"));
        assert!(!env.selects("about"));

        let inner = env.enter_route("products");
        assert_eq!(inner.current_route.to_string(), "products");
        assert_eq!(inner.selected_route, vec!["1".to_string()]);
        assert!(inner.selects(":id"));
        assert_eq!(env.current_route.to_string(), "", "parent env untouched");
    }

    #[test]
    fn test_form_ids_are_numbered_per_document() {
        let options = BuildOptions::default();
        let routes = crate::discovery::ProbeRegistrar::new();
        let assets = crate::assets::NullAssets;
        let page = PageScope::new();
        let host = DocumentScope::new();
        let cx = RenderContext::new(
            RenderEnv::page(&RoutePath::root(), ""),
            &options,
            &routes,
            &assets,
            None,
            &host,
            &page,
        );
        assert_eq!(cx.next_form_id(), "form_1");
        assert_eq!(cx.next_form_id(), "form_2");

        let body = DocumentScope::fragment("shopping-cart");
        let fragment_cx = cx.with_document(&body);
        assert_eq!(fragment_cx.next_form_id(), "form_Shoppingcart_1");
        assert_eq!(cx.next_form_id(), "form_3");
    }

    #[test]
    fn test_empty_selection_selects_nothing() {
        let env = RenderEnv::probe(&RoutePath::root());
        assert!(!env.selects("home"));
        assert!(!env.selects(":id"));
    }
}
