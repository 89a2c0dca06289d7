//! Symbolic data access and condition building.
//!
//! A [`DataPath`] stands in for a value of the per-request data that only the
//! downstream template engine will see. Rendering one in output position emits
//! an interpolation; using one inside a [`Condition`] or a loop header emits its
//! bare name.

use std::fmt;

use crate::codegen::{self, quote};
use crate::iteration::ForEach;
use crate::node::Node;

// ═══════════════════════════════════════════════════════════════════════════════
// DATA PATHS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    name: String,
}

impl DataPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The data root of a dynamic fragment.
    pub fn fragment_root() -> Self {
        Self::root(codegen::FRAGMENT_ROOT)
    }

    pub fn field(&self, name: &str) -> DataPath {
        DataPath {
            name: format!("{}.{}", self.name, name),
        }
    }

    /// Element `index` of a sequence.
    pub fn at(&self, index: usize) -> DataPath {
        DataPath {
            name: format!("(index {} {})", self.name, index),
        }
    }

    /// Length of a sequence.
    pub fn length(&self) -> DataPath {
        DataPath {
            name: format!("len {}", self.name),
        }
    }

    pub fn varname(&self) -> &str {
        &self.name
    }

    /// Interpolation marker for output position.
    pub fn render(&self) -> String {
        codegen::interpolation(&self.name)
    }

    /// Compile a loop over this sequence. `render` receives the element and the
    /// index proxies.
    pub fn for_each<F, N>(&self, render: F) -> Node
    where
        F: Fn(DataPath, DataPath) -> N + 'static,
        N: Into<Node>,
    {
        ForEach::new(self.clone(), render).into()
    }

    fn operand(&self) -> String {
        if self.name.contains(' ') && !self.name.starts_with('(') {
            format!("({})", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    pub fn to_template(&self) -> String {
        match self {
            Literal::Str(s) => quote(s),
            Literal::Int(n) => n.to_string(),
            Literal::Float(n) => n.to_string(),
            Literal::Bool(b) => b.to_string(),
        }
    }

    /// Why the literal cannot be written into a template, if it cannot.
    fn invalid(&self) -> Option<String> {
        match self {
            Literal::Float(n) if !n.is_finite() => {
                Some(format!("`{}` has no template literal form", n))
            }
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(DataPath),
    Literal(Literal),
    Condition(Condition),
}

impl Expr {
    /// Template text for a standalone position (an `if` header).
    pub fn to_template(&self) -> String {
        match self {
            Expr::Path(p) => p.varname().to_string(),
            Expr::Literal(l) => l.to_template(),
            Expr::Condition(c) => c.text.clone(),
        }
    }

    /// Template text for an argument position; multi-word pipelines get
    /// parenthesized so they stay a single argument.
    pub(crate) fn operand(&self) -> String {
        match self {
            Expr::Path(p) => p.operand(),
            Expr::Literal(l) => l.to_template(),
            Expr::Condition(c) if c.negated => format!("({})", c.text),
            Expr::Condition(c) => c.text.clone(),
        }
    }

    /// Why the expression cannot be compiled, if it cannot. Conditions keep
    /// the first problem found among their parts.
    pub(crate) fn invalid(&self) -> Option<String> {
        match self {
            Expr::Path(_) => None,
            Expr::Literal(l) => l.invalid(),
            Expr::Condition(c) => c.invalid.clone(),
        }
    }

    fn collect_paths(&self, out: &mut Vec<DataPath>) {
        match self {
            Expr::Path(p) => out.push(p.clone()),
            Expr::Literal(_) => {}
            Expr::Condition(c) => out.extend(c.operands.iter().cloned()),
        }
    }
}

impl From<DataPath> for Expr {
    fn from(p: DataPath) -> Self {
        Expr::Path(p)
    }
}

impl From<&DataPath> for Expr {
    fn from(p: &DataPath) -> Self {
        Expr::Path(p.clone())
    }
}

impl From<Condition> for Expr {
    fn from(c: Condition) -> Self {
        Expr::Condition(c)
    }
}

impl From<Literal> for Expr {
    fn from(l: Literal) -> Self {
        Expr::Literal(l)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(Literal::Str(s.to_string()))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(Literal::Str(s))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Literal(Literal::Int(n))
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Literal(Literal::Int(n.into()))
    }
}

impl From<u32> for Expr {
    fn from(n: u32) -> Self {
        Expr::Literal(Literal::Int(n.into()))
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Literal(Literal::Float(n))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONDITIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// A compiled boolean expression. Built bottom-up; every combinator wraps the
/// already compiled text of its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    text: String,
    operands: Vec<DataPath>,
    negated: bool,
    invalid: Option<String>,
}

impl Condition {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Data paths referenced anywhere inside this condition.
    pub fn operands(&self) -> &[DataPath] {
        &self.operands
    }

    /// `not <x>`
    pub fn not(x: impl Into<Expr>) -> Condition {
        let x = x.into();
        let mut operands = Vec::new();
        x.collect_paths(&mut operands);
        Condition {
            text: format!("not {}", x.operand()),
            operands,
            negated: true,
            invalid: x.invalid(),
        }
    }

    /// `(and a (and b ...))`. An empty list is `true`.
    pub fn and<I, E>(items: I) -> Condition
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self::fold("and", items, true)
    }

    /// `(or a (or b ...))`. An empty list is `false`.
    pub fn or<I, E>(items: I) -> Condition
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self::fold("or", items, false)
    }

    pub fn eq(a: impl Into<Expr>, b: impl Into<Expr>) -> Condition {
        Self::compare("eq", a.into(), b.into())
    }

    pub fn ne(a: impl Into<Expr>, b: impl Into<Expr>) -> Condition {
        Self::compare("ne", a.into(), b.into())
    }

    pub fn lt(a: impl Into<Expr>, b: impl Into<Expr>) -> Condition {
        Self::compare("lt", a.into(), b.into())
    }

    pub fn le(a: impl Into<Expr>, b: impl Into<Expr>) -> Condition {
        Self::compare("le", a.into(), b.into())
    }

    pub fn gt(a: impl Into<Expr>, b: impl Into<Expr>) -> Condition {
        Self::compare("gt", a.into(), b.into())
    }

    pub fn ge(a: impl Into<Expr>, b: impl Into<Expr>) -> Condition {
        Self::compare("ge", a.into(), b.into())
    }

    /// Runtime type check against a type name of the template engine's host
    /// language: `(eq "<type>" (printf "%T" <x>))`.
    pub fn typeof_is(x: impl Into<Expr>, type_name: &str) -> Condition {
        let x = x.into();
        let mut operands = Vec::new();
        x.collect_paths(&mut operands);
        Condition {
            text: format!(
                "(eq {} (printf {} {}))",
                quote(type_name),
                quote("%T"),
                x.operand()
            ),
            operands,
            negated: false,
            invalid: x.invalid(),
        }
    }

    fn compare(op: &str, a: Expr, b: Expr) -> Condition {
        let mut operands = Vec::new();
        a.collect_paths(&mut operands);
        b.collect_paths(&mut operands);
        Condition {
            text: format!("({} {} {})", op, a.operand(), b.operand()),
            operands,
            negated: false,
            invalid: a.invalid().or_else(|| b.invalid()),
        }
    }

    fn fold<I, E>(op: &str, items: I, empty: bool) -> Condition
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        let items: Vec<Expr> = items.into_iter().map(Into::into).collect();
        let mut operands = Vec::new();
        for item in &items {
            item.collect_paths(&mut operands);
        }
        let invalid = items.iter().find_map(Expr::invalid);

        let Some((last, rest)) = items.split_last() else {
            return Condition {
                text: empty.to_string(),
                operands,
                negated: false,
                invalid,
            };
        };

        if rest.is_empty() {
            let negated = matches!(last, Expr::Condition(c) if c.negated);
            return Condition {
                text: last.to_template(),
                operands,
                negated,
                invalid,
            };
        }

        let mut text = last.operand();
        for item in rest.iter().rev() {
            text = format!("({} {} {})", op, item.operand(), text);
        }

        Condition {
            text,
            operands,
            negated: false,
            invalid,
        }
    }
}
