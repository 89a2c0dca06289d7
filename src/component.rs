//! Components: subtrees computed at render time.
//!
//! A component sees the current [`RenderContext`] and returns the markup it
//! stands for. Built-in constructs (routing, conditionals, loops, fragments)
//! are components too; user code usually goes through [`component`], which
//! wraps a plain closure over the render environment.

use async_trait::async_trait;

use crate::env::{RenderContext, RenderEnv};
use crate::error::RenderError;
use crate::node::Node;

#[async_trait(?Send)]
pub trait Component {
    /// Name used in error reports.
    fn name(&self) -> &str;

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError>;
}

pub struct FnComponent<F> {
    name: String,
    render: F,
}

#[async_trait(?Send)]
impl<F> Component for FnComponent<F>
where
    F: Fn(&RenderEnv) -> Result<Node, RenderError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        (self.render)(cx.env())
    }
}

/// Wrap a closure as a named component.
pub fn component<F>(name: &str, render: F) -> Node
where
    F: Fn(&RenderEnv) -> Result<Node, RenderError> + 'static,
{
    Node::component(FnComponent {
        name: name.to_string(),
        render,
    })
}
