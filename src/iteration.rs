//! Loop compilation.

use std::rc::Rc;

use async_trait::async_trait;

use crate::codegen::range_block;
use crate::component::Component;
use crate::env::RenderContext;
use crate::error::RenderError;
use crate::expr::DataPath;
use crate::node::Node;

type ItemRender = Rc<dyn Fn(DataPath, DataPath) -> Node>;

/// Compiles a per-element render callback into a `range` block over `data`.
/// Every compiled loop gets fresh element and index variables, so nested or
/// sibling loops never shadow each other.
#[derive(Clone)]
pub struct ForEach {
    data: DataPath,
    render: ItemRender,
}

impl ForEach {
    pub fn new<F, N>(data: DataPath, render: F) -> Self
    where
        F: Fn(DataPath, DataPath) -> N + 'static,
        N: Into<Node>,
    {
        Self {
            data,
            render: Rc::new(move |item, index| render(item, index).into()),
        }
    }
}

impl From<ForEach> for Node {
    fn from(each: ForEach) -> Self {
        Node::component(each)
    }
}

#[async_trait(?Send)]
impl Component for ForEach {
    fn name(&self) -> &str {
        "ForEach"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let (elem_var, key_var) = cx.next_loop_names();
        let body = (self.render)(DataPath::root(elem_var.as_str()), DataPath::root(key_var.as_str()));
        let compiled = cx.render(&body).await?;

        Ok(Node::Raw(range_block(
            &key_var,
            &elem_var,
            self.data.varname(),
            &compiled,
        )))
    }
}
