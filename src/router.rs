//! Routing constructs: [`Switch`], [`Route`], [`Link`] and [`Redirect`].
//!
//! Routes register themselves whenever a render walks through them, selected
//! or not, which is what route discovery relies on.

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::component::Component;
use crate::env::RenderContext;
use crate::error::RenderError;
use crate::expr::DataPath;
use crate::node::{el, AttributeValue, ElementNode, Node};
use crate::paths::RoutePath;

const SWITCH_CLASS: &str = "__route-switch";

// ═══════════════════════════════════════════════════════════════════════════════
// SWITCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Container routes swap their content into.
#[derive(Debug, Clone)]
pub struct Switch {
    id: String,
    element: ElementNode,
}

impl Switch {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            element: el("div"),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.element = self.element.attr(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.element = self.element.child(child);
        self
    }
}

impl From<Switch> for Node {
    fn from(switch: Switch) -> Self {
        Node::component(switch)
    }
}

#[async_trait(?Send)]
impl Component for Switch {
    fn name(&self) -> &str {
        "Switch"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        cx.routes().add_router_container(&self.id);

        let class = match self
            .element
            .get_attr("class")
            .and_then(AttributeValue::to_attribute_text)
        {
            Some(class) if !class.is_empty() => format!("{} {}", class, SWITCH_CLASS),
            _ => SWITCH_CLASS.to_string(),
        };
        let container = self
            .element
            .clone()
            .attr("id", self.id.as_str())
            .attr("class", class);

        let inner = cx.scoped(cx.env().in_router(&self.id));
        Ok(Node::Raw(inner.render(&container.into()).await?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
enum RouteBody {
    Static(Vec<Node>),
    /// Content of a page whose data is fetched per request.
    Dynamic {
        resource: String,
        render: Rc<dyn Fn(DataPath) -> Node>,
    },
}

#[derive(Clone)]
pub struct Route {
    path: String,
    title: String,
    body: RouteBody,
}

impl Route {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            title: String::new(),
            body: RouteBody::Static(Vec::new()),
        }
    }

    /// A route whose page needs `resource` at request time. `render` gets the
    /// page-level path the resource is exposed under.
    pub fn dynamic<F, N>(path: &str, resource: &str, render: F) -> Self
    where
        F: Fn(DataPath) -> N + 'static,
        N: Into<Node>,
    {
        Self {
            path: path.to_string(),
            title: String::new(),
            body: RouteBody::Dynamic {
                resource: resource.to_string(),
                render: Rc::new(move |data| render(data).into()),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Ignored on dynamic routes, whose content comes from the callback.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        if let RouteBody::Static(children) = &mut self.body {
            children.push(child.into());
        }
        self
    }
}

impl From<Route> for Node {
    fn from(route: Route) -> Self {
        Node::component(route)
    }
}

#[async_trait(?Send)]
impl Component for Route {
    fn name(&self) -> &str {
        "Route"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let container = match &cx.env().router_container {
            Some(container) => container.clone(),
            None => {
                return Err(RenderError::misuse(
                    "Route",
                    "route used outside of any switch",
                ))
            }
        };

        let full_path = cx.env().current_route.join(&self.path);
        cx.routes().register_route(&full_path, &self.title, &container);

        if !cx.env().selects(&self.path) {
            return Ok(Node::Empty);
        }

        let inner = cx.scoped(cx.env().enter_route(&self.path));
        let content = match &self.body {
            RouteBody::Static(children) => Node::Fragment(children.clone()),
            RouteBody::Dynamic { resource, render } => {
                let key = inner.require_resource(resource);
                render(DataPath::root(format!(".{}", key)))
            }
        };
        Ok(Node::Raw(inner.render(&content).await?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LINK
// ═══════════════════════════════════════════════════════════════════════════════

/// Anchor that swaps the linked page into the right router container
/// instead of reloading.
#[derive(Debug, Clone)]
pub struct Link {
    href: String,
    locale: Option<String>,
    element: ElementNode,
}

impl Link {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            locale: None,
            element: el("a"),
        }
    }

    /// Request the linked page in another language.
    pub fn locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.element = self.element.attr(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.element = self.element.child(child);
        self
    }
}

impl From<Link> for Node {
    fn from(link: Link) -> Self {
        Node::component(link)
    }
}

/// Route whose container the link targets: the longest prefix of `href`
/// whose parent is the current route or lies below it. Falls back to the
/// current route.
pub(crate) fn link_target(href: &RoutePath, current: &RoutePath) -> RoutePath {
    let segments = href.segments();
    for depth in (0..segments.len()).rev() {
        let base = RoutePath::from_segments(&segments[..depth]);
        if base.is_descendant_or_self(current) {
            return RoutePath::from_segments(&segments[..=depth]);
        }
    }
    current.clone()
}

#[async_trait(?Send)]
impl Component for Link {
    fn name(&self) -> &str {
        "Link"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let target = link_target(&RoutePath::parse(&self.href), &cx.env().current_route);
        let container = cx.routes().container_id_for_route(&target);
        let headers = self
            .locale
            .as_ref()
            .map(|locale| json!({ "Accept-Language": locale }).to_string());

        Ok(self
            .element
            .clone()
            .attr("href", self.href.as_str())
            .attr("hx-headers", headers)
            .attr("hx-boost", "true")
            .attr("hx-target", format!("#{}", container))
            .attr("hx-swap", "outerHTML")
            .into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REDIRECT
// ═══════════════════════════════════════════════════════════════════════════════

/// Marks the current page as a redirect to `href`. Renders nothing.
#[derive(Debug, Clone)]
pub struct Redirect {
    href: String,
}

impl Redirect {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
        }
    }
}

impl From<Redirect> for Node {
    fn from(redirect: Redirect) -> Self {
        Node::component(redirect)
    }
}

#[async_trait(?Send)]
impl Component for Redirect {
    fn name(&self) -> &str {
        "Redirect"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        cx.add_metadata("redirectUrl", Value::String(self.href.clone()));
        cx.add_metadata("shouldRedirect", Value::Bool(true));
        Ok(Node::Empty)
    }
}
