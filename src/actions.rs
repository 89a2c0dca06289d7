//! Form actions.
//!
//! An [`Action`] names a server-side handler. Its forms post to
//! `/__actions/<name>` and never swap the response in place; islands related
//! to the action are refreshed instead, which the client helper requests
//! through the `hx-headers` it builds at submit time.

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::component::Component;
use crate::conditional::If;
use crate::env::RenderContext;
use crate::error::RenderError;
use crate::expr::{Condition, DataPath};
use crate::islands::Island;
use crate::node::{el, AttributeValue, ElementNode, Node};

const ACTIONS_PREFIX: &str = "/__actions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn attribute(self) -> &'static str {
        match self {
            HttpMethod::Get => "hx-get",
            HttpMethod::Post => "hx-post",
            HttpMethod::Put => "hx-put",
            HttpMethod::Patch => "hx-patch",
            HttpMethod::Delete => "hx-delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ActionDef {
    method: HttpMethod,
    name: String,
    islands: Vec<String>,
}

/// The open form a subtree renders inside.
#[derive(Debug, Clone)]
pub(crate) struct FormScope {
    action: Rc<ActionDef>,
    form_id: String,
    islands: Vec<String>,
    items: Vec<AttributeValue>,
}

/// A server action. Clones share identity: a [`Submit`] only fits forms of
/// the action it was created from.
#[derive(Debug, Clone)]
pub struct Action {
    def: Rc<ActionDef>,
}

impl Action {
    pub fn new(method: HttpMethod, name: &str) -> Self {
        Self {
            def: Rc::new(ActionDef {
                method,
                name: name.to_string(),
                islands: Vec::new(),
            }),
        }
    }

    /// Refresh `island` whenever this action is performed.
    pub fn related(mut self, island: &Island) -> Self {
        Rc::make_mut(&mut self.def)
            .islands
            .push(island.id().to_string());
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.def.method
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn form(&self) -> Form {
        Form {
            action: self.def.clone(),
            element: el("form"),
            extra: ActionExtras::default(),
        }
    }

    pub fn submit(&self) -> Submit {
        Submit {
            action: self.def.clone(),
            element: el("button"),
        }
    }

    /// A single button posting the action, wrapped in its own form.
    pub fn quick_button(&self) -> QuickButton {
        QuickButton {
            action: self.def.clone(),
            form: el("form"),
            button: el("button"),
            extra: ActionExtras::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ActionExtras {
    data: Vec<(String, AttributeValue)>,
    islands: Vec<String>,
    items: Vec<AttributeValue>,
}

impl ActionExtras {
    fn island_ids(&self, action: &ActionDef) -> Vec<String> {
        let mut ids = action.islands.clone();
        for id in &self.islands {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    fn hidden_inputs(&self) -> Vec<Node> {
        self.data
            .iter()
            .map(|(name, value)| hidden_input(name, value))
            .collect()
    }
}

fn action_attributes(
    button: ElementNode,
    action: &ActionDef,
    form_id: &str,
    current_route: &str,
    islands: &[String],
    items: &[AttributeValue],
) -> ElementNode {
    let mut button = button
        .attr("hx-include", format!("#{}", form_id))
        .attr(
            action.method.attribute(),
            format!("{}/{}", ACTIONS_PREFIX, action.name),
        )
        .attr("hx-swap", "none");

    if !islands.is_empty() {
        button = button.attr(
            "hx-headers",
            format!(
                "javascript: ...{}",
                form_headers_call(current_route, islands, items)
            ),
        );
    }
    button
}

/// Call into the client helper that assembles the island refresh headers.
fn form_headers_call(current_route: &str, islands: &[String], items: &[AttributeValue]) -> String {
    let islands: Vec<Value> = islands.iter().cloned().map(Value::String).collect();
    let items: Vec<Value> = items
        .iter()
        .filter_map(AttributeValue::to_attribute_text)
        .map(Value::String)
        .collect();
    format!(
        "__hardwire.formHeaders({}, {}, {})",
        Value::String(current_route.to_string()),
        Value::Array(islands),
        Value::Array(items)
    )
}

fn hidden_checkbox(name: &str, checked: bool) -> Node {
    el("input")
        .attr("style", "display: none;")
        .attr("type", "checkbox")
        .attr("name", name)
        .attr("checked", if checked { Some("true") } else { None })
        .into()
}

fn hidden_input(name: &str, value: &AttributeValue) -> Node {
    match value {
        AttributeValue::Null => Node::Empty,
        AttributeValue::Bool(checked) => hidden_checkbox(name, *checked),
        AttributeValue::Path(path) => dynamic_hidden_input(name, path),
        other => el("input")
            .attr("type", "hidden")
            .attr("name", name)
            .attr("value", other.clone())
            .into(),
    }
}

/// The value's type is only known per request: booleans become checkboxes,
/// everything else a hidden text input.
fn dynamic_hidden_input(name: &str, path: &DataPath) -> Node {
    let checkbox = If::new(Condition::eq(path, true))
        .then(hidden_checkbox(name, true))
        .otherwise(hidden_checkbox(name, false));

    If::new(Condition::typeof_is(path, "bool"))
        .then(checkbox)
        .otherwise(
            el("input")
                .attr("type", "hidden")
                .attr("name", name)
                .attr("value", path),
        )
        .into()
}

// ═══════════════════════════════════════════════════════════════════════════════
// FORM
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Form {
    action: Rc<ActionDef>,
    element: ElementNode,
    extra: ActionExtras,
}

impl Form {
    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.element = self.element.attr(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.element = self.element.child(child);
        self
    }

    /// Submit `value` under `name` with the form.
    pub fn data(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.extra.data.push((name.to_string(), value.into()));
        self
    }

    /// Refresh `island` as well, on top of the action's own islands.
    pub fn island(mut self, island: &Island) -> Self {
        self.extra.islands.push(island.id().to_string());
        self
    }

    /// Only refresh these keys of a related list island.
    pub fn item(mut self, key: impl Into<AttributeValue>) -> Self {
        self.extra.items.push(key.into());
        self
    }
}

impl From<Form> for Node {
    fn from(form: Form) -> Self {
        Node::component(form)
    }
}

#[async_trait(?Send)]
impl Component for Form {
    fn name(&self) -> &str {
        "Form"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        if cx.env().form.is_some() {
            return Err(RenderError::misuse(
                "Form",
                "form actions cannot be nested",
            ));
        }

        let form_id = cx.next_form_id();
        let scope = FormScope {
            action: self.action.clone(),
            form_id: form_id.clone(),
            islands: self.extra.island_ids(&self.action),
            items: self.extra.items.clone(),
        };

        let mut children = self.extra.hidden_inputs();
        children.extend(self.element.children.iter().cloned());
        let form = ElementNode {
            children,
            ..self.element.clone()
        }
        .attr("id", form_id);

        let inner = cx.scoped(cx.env().in_form(scope));
        Ok(Node::Raw(inner.render(&form.into()).await?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUBMIT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Submit {
    action: Rc<ActionDef>,
    element: ElementNode,
}

impl Submit {
    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.element = self.element.attr(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.element = self.element.child(child);
        self
    }
}

impl From<Submit> for Node {
    fn from(submit: Submit) -> Self {
        Node::component(submit)
    }
}

#[async_trait(?Send)]
impl Component for Submit {
    fn name(&self) -> &str {
        "Submit"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let form = match &cx.env().form {
            Some(form) => form,
            None => {
                return Err(RenderError::misuse(
                    "Submit",
                    "submit button used outside of any form",
                ))
            }
        };
        if !Rc::ptr_eq(&form.action, &self.action) {
            return Err(RenderError::misuse(
                "Submit",
                "the submit button must be a child of its own action's form",
            ));
        }

        Ok(action_attributes(
            self.element.clone(),
            &self.action,
            &form.form_id,
            &cx.env().current_route.to_string(),
            &form.islands,
            &form.items,
        )
        .into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUICK BUTTON
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct QuickButton {
    action: Rc<ActionDef>,
    form: ElementNode,
    button: ElementNode,
    extra: ActionExtras,
}

impl QuickButton {
    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.button = self.button.attr(name, value);
        self
    }

    /// Attribute of the wrapping form.
    pub fn form_attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.form = self.form.attr(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.button = self.button.child(child);
        self
    }

    pub fn data(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.extra.data.push((name.to_string(), value.into()));
        self
    }

    pub fn island(mut self, island: &Island) -> Self {
        self.extra.islands.push(island.id().to_string());
        self
    }

    pub fn item(mut self, key: impl Into<AttributeValue>) -> Self {
        self.extra.items.push(key.into());
        self
    }
}

impl From<QuickButton> for Node {
    fn from(button: QuickButton) -> Self {
        Node::component(button)
    }
}

#[async_trait(?Send)]
impl Component for QuickButton {
    fn name(&self) -> &str {
        "QuickButton"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        if cx.env().form.is_some() {
            return Err(RenderError::misuse(
                "QuickButton",
                "form actions cannot be nested",
            ));
        }

        let form_id = cx.next_form_id();
        let button = action_attributes(
            self.button.clone(),
            &self.action,
            &form_id,
            &cx.env().current_route.to_string(),
            &self.extra.island_ids(&self.action),
            &self.extra.items,
        );

        Ok(self
            .form
            .clone()
            .attr("id", form_id)
            .children(self.extra.hidden_inputs())
            .child(button)
            .into())
    }
}
