//! Conditional compilation.
//!
//! An [`If`] compiles to an `if` block. The else branch is given either inline
//! with [`If::otherwise`] or by an [`Else`] marker placed inside the then
//! branch, which hands its content to the nearest enclosing `If`.

use async_trait::async_trait;

use crate::codegen::if_block;
use crate::component::Component;
use crate::env::{ElseSlot, RenderContext};
use crate::error::RenderError;
use crate::expr::Expr;
use crate::node::Node;

#[derive(Debug, Clone)]
pub struct If {
    condition: Expr,
    negate: bool,
    then: Vec<Node>,
    otherwise: Option<Box<Node>>,
}

impl If {
    pub fn new(condition: impl Into<Expr>) -> Self {
        Self {
            condition: condition.into(),
            negate: false,
            then: Vec::new(),
            otherwise: None,
        }
    }

    /// Emit `if not <condition>`.
    pub fn negate(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn then(mut self, node: impl Into<Node>) -> Self {
        self.then.push(node.into());
        self
    }

    pub fn otherwise(mut self, node: impl Into<Node>) -> Self {
        self.otherwise = Some(Box::new(node.into()));
        self
    }
}

impl From<If> for Node {
    fn from(cond: If) -> Self {
        Node::component(cond)
    }
}

#[async_trait(?Send)]
impl Component for If {
    fn name(&self) -> &str {
        "If"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        if let Some(reason) = self.condition.invalid() {
            return Err(RenderError::misuse("If", reason));
        }

        let slot = ElseSlot::default();
        let inner = cx.scoped(cx.env().in_conditional(slot.clone()));
        let then = inner.render(&Node::Fragment(self.then.clone())).await?;

        let branch = match (&self.otherwise, slot.take()) {
            (Some(_), Some(_)) => {
                return Err(RenderError::misuse(
                    "Else",
                    "the conditional already has an inline else branch",
                ))
            }
            (Some(inline), None) => Some(inline.as_ref().clone()),
            (None, marker) => marker,
        };

        let otherwise = match branch {
            Some(node) => {
                let branch_cx = cx.scoped(cx.env().outside_conditional());
                Some(branch_cx.render(&node).await?)
            }
            None => None,
        };

        let condition = if self.negate {
            self.condition.operand()
        } else {
            self.condition.to_template()
        };

        Ok(Node::Raw(if_block(
            &condition,
            self.negate,
            &then,
            otherwise.as_deref(),
        )))
    }
}

/// Else branch for the enclosing [`If`].
#[derive(Debug, Clone)]
pub struct Else {
    branch: Node,
}

impl Else {
    pub fn new(branch: impl Into<Node>) -> Self {
        Self {
            branch: branch.into(),
        }
    }
}

impl From<Else> for Node {
    fn from(marker: Else) -> Self {
        Node::component(marker)
    }
}

#[async_trait(?Send)]
impl Component for Else {
    fn name(&self) -> &str {
        "Else"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        match &cx.env().conditional {
            Some(slot) => {
                slot.fill(self.branch.clone())?;
                Ok(Node::Empty)
            }
            None => Err(RenderError::misuse(
                "Else",
                "else marker used outside of any conditional",
            )),
        }
    }
}
