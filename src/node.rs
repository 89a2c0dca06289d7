use std::fmt;
use std::rc::Rc;

use crate::component::Component;
use crate::expr::DataPath;

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
pub enum Node {
    Element(ElementNode),
    /// Escaped on output.
    Text(String),
    /// Emitted verbatim: compiled template source or trusted markup.
    Raw(String),
    Fragment(Vec<Node>),
    Component(Rc<dyn Component>),
    #[default]
    Empty,
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn raw(value: impl Into<String>) -> Self {
        Node::Raw(value.into())
    }

    pub fn fragment<I, N>(children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Node::Fragment(children.into_iter().map(Into::into).collect())
    }

    pub fn component(component: impl Component + 'static) -> Self {
        Node::Component(Rc::new(component))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Node::Empty => true,
            Node::Fragment(children) => children.iter().all(Node::is_empty),
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(el) => fmt::Debug::fmt(el, f),
            Node::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Node::Raw(r) => f.debug_tuple("Raw").field(r).finish(),
            Node::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            Node::Component(c) => f.debug_tuple("Component").field(&c.name()).finish(),
            Node::Empty => f.write_str("Empty"),
        }
    }
}

impl From<ElementNode> for Node {
    fn from(el: ElementNode) -> Self {
        Node::Element(el)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<DataPath> for Node {
    fn from(p: DataPath) -> Self {
        Node::Raw(p.render())
    }
}

impl From<&DataPath> for Node {
    fn from(p: &DataPath) -> Self {
        Node::Raw(p.render())
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::Fragment(children)
    }
}

impl<N: Into<Node>> From<Option<N>> for Node {
    fn from(node: Option<N>) -> Self {
        node.map(Into::into).unwrap_or(Node::Empty)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

/// Start building an element.
pub fn el(tag: &str) -> ElementNode {
    ElementNode {
        tag: tag.to_string(),
        attributes: Vec::new(),
        children: Vec::new(),
    }
}

impl ElementNode {
    /// Set an attribute, replacing an earlier value under the same name.
    pub fn attr(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
        self
    }

    pub fn attrs<I, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (String, V)>,
        V: Into<AttributeValue>,
    {
        for (name, value) in attributes {
            self = self.attr(&name, value);
        }
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Str(String),
    Int(i64),
    Float(f64),
    Path(DataPath),
}

impl AttributeValue {
    /// Value text before escaping, or `None` when the attribute is omitted.
    /// `Some("")` marks a bare flag attribute.
    pub fn to_attribute_text(&self) -> Option<String> {
        match self {
            AttributeValue::Null | AttributeValue::Bool(false) => None,
            AttributeValue::Str(s) if s.is_empty() => None,
            AttributeValue::Bool(true) => Some(String::new()),
            AttributeValue::Str(s) => Some(s.clone()),
            AttributeValue::Int(n) => Some(n.to_string()),
            AttributeValue::Float(n) => Some(n.to_string()),
            AttributeValue::Path(p) => Some(p.render()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Str(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Str(s)
    }
}

impl From<&String> for AttributeValue {
    fn from(s: &String) -> Self {
        AttributeValue::Str(s.clone())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Int(n)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        AttributeValue::Int(n.into())
    }
}

impl From<usize> for AttributeValue {
    fn from(n: usize) -> Self {
        i64::try_from(n)
            .map(AttributeValue::Int)
            .unwrap_or(AttributeValue::Float(n as f64))
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Float(n)
    }
}

impl From<DataPath> for AttributeValue {
    fn from(p: DataPath) -> Self {
        AttributeValue::Path(p)
    }
}

impl From<&DataPath> for AttributeValue {
    fn from(p: &DataPath) -> Self {
        AttributeValue::Path(p.clone())
    }
}

impl<V: Into<AttributeValue>> From<Option<V>> for AttributeValue {
    fn from(v: Option<V>) -> Self {
        v.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}
