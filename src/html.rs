//! Page shell.
//!
//! [`Html`] writes the document around a page: a head that loads htmx, which
//! drives every fragment placeholder, and a body with the morph extension
//! enabled for `morph:outerHTML` swaps. [`Meta`] tags may sit anywhere in the
//! body; they are moved into the head.

use async_trait::async_trait;

use crate::component::Component;
use crate::env::{HeadEntries, RenderContext};
use crate::error::RenderError;
use crate::node::{el, AttributeValue, ElementNode, Node};

pub const HTMX_SCRIPT_URL: &str = "https://unpkg.com/htmx.org@1.9.6";
const HTMX_SCRIPT_INTEGRITY: &str =
    "sha384-FhXw7b6AlE/jyjlZH5iHa/tTe9EpJ1Y55RjcgPbjeWMskSxZt1v9qkxLJWNJaGni";

// ═══════════════════════════════════════════════════════════════════════════════
// HEAD
// ═══════════════════════════════════════════════════════════════════════════════

/// `<head>` with the htmx script first.
#[derive(Debug, Clone, Default)]
pub struct Head {
    children: Vec<Node>,
}

impl Head {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

impl From<Head> for Node {
    fn from(head: Head) -> Self {
        Node::component(head)
    }
}

#[async_trait(?Send)]
impl Component for Head {
    fn name(&self) -> &str {
        "Head"
    }

    async fn render(&self, _cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        Ok(el("head")
            .child(
                el("script")
                    .attr("src", HTMX_SCRIPT_URL)
                    .attr("integrity", HTMX_SCRIPT_INTEGRITY)
                    .attr("crossorigin", "anonymous"),
            )
            .children(self.children.iter().cloned())
            .into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTML
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Html {
    head: Vec<Node>,
    children: Vec<Node>,
    morph: bool,
}

impl Html {
    pub fn new() -> Self {
        Self {
            head: Vec::new(),
            children: Vec::new(),
            morph: true,
        }
    }

    /// Extra head content, written after the htmx script as is.
    pub fn head(mut self, node: impl Into<Node>) -> Self {
        self.head.push(node.into());
        self
    }

    /// Leave the morph extension off.
    pub fn no_morph(mut self) -> Self {
        self.morph = false;
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

impl Default for Html {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Html> for Node {
    fn from(html: Html) -> Self {
        Node::component(html)
    }
}

#[async_trait(?Send)]
impl Component for Html {
    fn name(&self) -> &str {
        "Html"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let entries = HeadEntries::default();
        let body_cx = cx.scoped(cx.env().in_html(entries.clone()));
        let body: Node = el("body")
            .attr("hx-ext", if self.morph { "morph" } else { "" })
            .children(self.children.iter().cloned())
            .into();
        // Body first: its Meta tags must be known before the head is written.
        let body = body_cx.render(&body).await?;

        let head = self
            .head
            .iter()
            .cloned()
            .chain(entries.take())
            .fold(Head::new(), |head, entry| head.child(entry));
        let head = cx.render(&Node::from(head)).await?;

        Ok(Node::Raw(format!("<html>{}{}</html>", head, body)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// META
// ═══════════════════════════════════════════════════════════════════════════════

/// A `<meta>` tag for the head of the enclosing [`Html`].
#[derive(Debug, Clone)]
pub struct Meta {
    element: ElementNode,
}

impl Meta {
    pub fn new() -> Self {
        Self {
            element: el("meta"),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.element = self.element.attr(name, value);
        self
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Meta> for Node {
    fn from(meta: Meta) -> Self {
        Node::component(meta)
    }
}

#[async_trait(?Send)]
impl Component for Meta {
    fn name(&self) -> &str {
        "Meta"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        match &cx.env().head {
            Some(head) => {
                head.push(self.element.clone().into());
                Ok(Node::Empty)
            }
            None => Err(RenderError::misuse(
                "Meta",
                "meta tags need an enclosing Html",
            )),
        }
    }
}
