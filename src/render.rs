//! Tree renderer: markup tree to output text.
//!
//! Rendering is depth first. The children of an element or fragment are
//! resolved together and joined in their original order.

use std::collections::HashSet;

use futures::future::{try_join_all, FutureExt, LocalBoxFuture};
use lazy_static::lazy_static;

use crate::env::RenderContext;
use crate::error::RenderError;
use crate::node::{Attribute, ElementNode, Node};

const NBSP: char = '\u{a0}';

lazy_static! {
    static ref VOID_ELEMENTS: HashSet<&'static str> = [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect();
}

pub fn render_node<'a>(
    node: &'a Node,
    cx: &'a RenderContext<'a>,
) -> LocalBoxFuture<'a, Result<String, RenderError>> {
    async move {
        match node {
            Node::Empty => Ok(String::new()),
            Node::Text(text) => Ok(escape_text(text)),
            Node::Raw(raw) => Ok(raw.clone()),
            Node::Fragment(children) => render_children(children, cx).await,
            Node::Element(el) => render_element(el, cx).await,
            Node::Component(component) => {
                let name = component.name();
                let output = component
                    .render(cx)
                    .await
                    .map_err(|e| e.within(name))?;
                render_node(&output, cx).await.map_err(|e| e.within(name))
            }
        }
    }
    .boxed_local()
}

pub async fn render_children(
    children: &[Node],
    cx: &RenderContext<'_>,
) -> Result<String, RenderError> {
    let parts = try_join_all(children.iter().map(|child| render_node(child, cx))).await?;
    Ok(parts.concat())
}

async fn render_element(el: &ElementNode, cx: &RenderContext<'_>) -> Result<String, RenderError> {
    let content = render_children(&el.children, cx).await?;
    let attributes = render_attributes(&el.attributes);
    let attr_str = if attributes.is_empty() {
        String::new()
    } else {
        format!(" {}", attributes)
    };

    if content.is_empty() && VOID_ELEMENTS.contains(el.tag.to_lowercase().as_str()) {
        Ok(format!("<{}{} />", el.tag, attr_str))
    } else {
        Ok(format!("<{}{}>{}</{}>", el.tag, attr_str, content, el.tag))
    }
}

/// `true` renders as a bare flag; `false`, null and empty values are dropped.
pub fn render_attributes(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .filter_map(|attr| {
            attr.value.to_attribute_text().map(|value| {
                if value.is_empty() {
                    attr.name.clone()
                } else {
                    format!("{}=\"{}\"", attr.name, escape_attribute(&value))
                }
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace(NBSP, "&nbsp;")
}

pub fn escape_attribute(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace(NBSP, "&nbsp;")
}
