//! Dynamic fragments.
//!
//! A dynamic fragment is a piece of a page that the downstream server renders
//! per request. Its body is compiled once into template source, stored under a
//! content hash, and the page gets a placeholder that fetches
//! `/<dynamic-prefix>/<hash>` when it loads or comes into view.

use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::codegen::bind_fragment_root;
use crate::component::Component;
use crate::env::{DocumentScope, RenderContext};
use crate::error::RenderError;
use crate::expr::DataPath;
use crate::islands::{IslandKind, IslandRecord};
use crate::iteration::ForEach;
use crate::node::{el, AttributeValue, Node};
use crate::options::BuildOptions;

const HASH_LEN: usize = 16;

/// Hex digest of `"<name>_<contents>"`, shortened to a file-name friendly id.
pub fn content_hash(name: &str, contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b"_");
    hasher.update(contents.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_LEN].to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledFragment {
    pub resource_name: String,
    pub content_hash: String,
    pub compiled_template_text: String,
}

impl CompiledFragment {
    pub fn metadata(&self) -> FragmentMetadata {
        FragmentMetadata {
            resource_name: self.resource_name.clone(),
            hash: self.content_hash.clone(),
        }
    }
}

/// Sidecar record the downstream server loads next to each template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentMetadata {
    pub resource_name: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentHandle {
    pub id: String,
    pub url: String,
}

impl FragmentHandle {
    /// Handle returned while probing routes, when nothing is stored.
    pub fn discarded() -> Self {
        Self::default()
    }
}

/// Content-addressed store of compiled fragments for one build.
#[derive(Debug, Default)]
pub struct FragmentRegistry {
    fragments: Vec<CompiledFragment>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        logical_name: &str,
        compiled: &str,
        options: &BuildOptions,
    ) -> FragmentHandle {
        let hash = content_hash(logical_name, compiled);
        if !self.fragments.iter().any(|f| f.content_hash == hash) {
            debug!(resource = logical_name, hash = %hash, "fragment registered");
            self.fragments.push(CompiledFragment {
                resource_name: logical_name.to_string(),
                content_hash: hash.clone(),
                compiled_template_text: compiled.to_string(),
            });
        }
        FragmentHandle {
            url: options.fragment_url(&hash),
            id: hash,
        }
    }

    pub fn get(&self, hash: &str) -> Option<&CompiledFragment> {
        self.fragments.iter().find(|f| f.content_hash == hash)
    }

    pub fn all(&self) -> &[CompiledFragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn into_fragments(self) -> Vec<CompiledFragment> {
        self.fragments
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLACEHOLDER SETTINGS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trigger {
    Load,
    #[default]
    Revealed,
    Intersect,
}

impl Trigger {
    fn attribute(self) -> &'static str {
        match self {
            Trigger::Load => "load delay:20ms",
            Trigger::Revealed => "revealed delay:20ms",
            Trigger::Intersect => "intersect delay:20ms",
        }
    }
}

/// How the placeholder fetches and swaps in the rendered fragment.
#[derive(Debug, Clone, Default)]
pub struct LoadSettings {
    pub trigger: Trigger,
    pub morph: bool,
    /// Swap delay, e.g. `"100ms"`.
    pub swap: Option<String>,
    /// Settle delay, e.g. `"1s"`.
    pub settle: Option<String>,
    /// Overrides the request's accepted language.
    pub locale: Option<String>,
}

impl LoadSettings {
    fn swap_attribute(&self) -> String {
        let mut swap = if self.morph {
            "morph:outerHTML".to_string()
        } else {
            "outerHTML".to_string()
        };
        if let Some(delay) = &self.swap {
            swap.push_str(" swap:");
            swap.push_str(delay);
        }
        if let Some(delay) = &self.settle {
            swap.push_str(" settle:");
            swap.push_str(delay);
        }
        swap
    }
}

/// Compile `template` as its own document and register it.
async fn compile_fragment(
    cx: &RenderContext<'_>,
    require: &str,
    template: Node,
) -> Result<FragmentHandle, RenderError> {
    let document = DocumentScope::fragment(require);
    let doc_cx = cx.with_document(&document);
    let inner = doc_cx.scoped(doc_cx.env().detached());
    let compiled = inner.render(&template).await?;
    Ok(cx.register_fragment(require, &compiled))
}

fn placeholder(
    cx: &RenderContext<'_>,
    handle: &FragmentHandle,
    settings: &LoadSettings,
    fallback: &Node,
) -> Node {
    let mut headers = Map::new();
    headers.insert(
        cx.options().fragment_request_header.clone(),
        Value::String(format!("/{}", cx.env().current_route)),
    );
    if let Some(locale) = &settings.locale {
        headers.insert(
            "Accept-Language".to_string(),
            Value::String(locale.clone()),
        );
    }

    el("div")
        .attr("hx-trigger", settings.trigger.attribute())
        .attr("hx-get", handle.url.as_str())
        .attr("hx-swap", settings.swap_attribute())
        .attr("hx-headers", Value::Object(headers).to_string())
        .child(fallback.clone())
        .into()
}

fn join_classes(base: &str, extra: Option<&AttributeValue>) -> AttributeValue {
    match extra.and_then(AttributeValue::to_attribute_text) {
        Some(extra) if !extra.trim().is_empty() => {
            AttributeValue::Str(format!("{} {}", base, extra.trim()))
        }
        _ => AttributeValue::Str(base.to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DYNAMIC FRAGMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A region rendered per request from the resource `require`.
#[derive(Clone)]
pub struct DynamicFragment {
    require: String,
    render: Rc<dyn Fn(DataPath) -> Node>,
    class: Option<String>,
    fallback: Node,
    settings: LoadSettings,
    pub(crate) island: Option<String>,
}

impl DynamicFragment {
    pub fn new<F, N>(require: &str, render: F) -> Self
    where
        F: Fn(DataPath) -> N + 'static,
        N: Into<Node>,
    {
        Self {
            require: require.to_string(),
            render: Rc::new(move |data| render(data).into()),
            class: None,
            fallback: Node::Empty,
            settings: LoadSettings::default(),
            island: None,
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    /// Shown until the fragment arrives.
    pub fn fallback(mut self, fallback: impl Into<Node>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn settings(mut self, settings: LoadSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl From<DynamicFragment> for Node {
    fn from(fragment: DynamicFragment) -> Self {
        Node::component(fragment)
    }
}

#[async_trait(?Send)]
impl Component for DynamicFragment {
    fn name(&self) -> &str {
        "DynamicFragment"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let template = el("dynamic-fragment")
            .attr("class", self.class.clone())
            .child(Node::raw(bind_fragment_root()))
            .child((self.render)(DataPath::fragment_root()));

        let handle = compile_fragment(cx, &self.require, template.into()).await?;

        if let Some(island) = &self.island {
            cx.finalize_island(IslandRecord {
                id: island.clone(),
                fragment_id: handle.id.clone(),
                kind: IslandKind::Single,
                resource_name: self.require.clone(),
            });
        }

        Ok(placeholder(cx, &handle, &self.settings, &self.fallback))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DYNAMIC LIST
// ═══════════════════════════════════════════════════════════════════════════════

type ItemRender = Rc<dyn Fn(DataPath, DataPath) -> Node>;
type KeyGetter = Rc<dyn Fn(&DataPath, &DataPath) -> AttributeValue>;
type WrapperRender = Rc<dyn Fn(Node, DataPath) -> Node>;

/// A per-request list: the fragment resource is a sequence and every element
/// is rendered in a keyed wrapper.
#[derive(Clone)]
pub struct DynamicList {
    require: String,
    render: ItemRender,
    key: Option<KeyGetter>,
    wrapper: Option<WrapperRender>,
    id: Option<String>,
    class: Option<AttributeValue>,
    item_class: Option<AttributeValue>,
    fallback: Node,
    settings: LoadSettings,
    pub(crate) island: Option<String>,
}

impl DynamicList {
    pub fn new<F, N>(require: &str, render: F) -> Self
    where
        F: Fn(DataPath, DataPath) -> N + 'static,
        N: Into<Node>,
    {
        Self {
            require: require.to_string(),
            render: Rc::new(move |item, index| render(item, index).into()),
            key: None,
            wrapper: None,
            id: None,
            class: None,
            item_class: None,
            fallback: Node::Empty,
            settings: LoadSettings::default(),
            island: None,
        }
    }

    /// Key each item by something other than its index.
    pub fn key<F, V>(mut self, key: F) -> Self
    where
        F: Fn(&DataPath, &DataPath) -> V + 'static,
        V: Into<AttributeValue>,
    {
        self.key = Some(Rc::new(move |item, index| key(item, index).into()));
        self
    }

    /// Wrap the compiled items; the callback also gets the whole list.
    pub fn wrapper<F, N>(mut self, wrapper: F) -> Self
    where
        F: Fn(Node, DataPath) -> N + 'static,
        N: Into<Node>,
    {
        self.wrapper = Some(Rc::new(move |items, list| wrapper(items, list).into()));
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: impl Into<AttributeValue>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn item_class(mut self, class: impl Into<AttributeValue>) -> Self {
        self.item_class = Some(class.into());
        self
    }

    pub fn fallback(mut self, fallback: impl Into<Node>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn settings(mut self, settings: LoadSettings) -> Self {
        self.settings = settings;
        self
    }

    fn items(&self, list: &DataPath) -> Node {
        let render = self.render.clone();
        let key = self.key.clone();
        let item_class = join_classes("dynamic-list-element", self.item_class.as_ref());

        ForEach::new(list.clone(), move |item, index| {
            let item_key = match &key {
                Some(key) => key(&item, &index),
                None => AttributeValue::Path(index.clone()),
            };
            el("div")
                .attr("data-item-key", item_key)
                .attr("class", item_class.clone())
                .child(render(item, index))
        })
        .into()
    }
}

impl From<DynamicList> for Node {
    fn from(list: DynamicList) -> Self {
        Node::component(list)
    }
}

#[async_trait(?Send)]
impl Component for DynamicList {
    fn name(&self) -> &str {
        "DynamicList"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let list = DataPath::fragment_root();
        let items = self.items(&list);
        let body = match &self.wrapper {
            Some(wrapper) => wrapper(items, list),
            None => items,
        };

        let template = el("dynamic-fragment")
            .attr("id", self.id.clone())
            .attr("class", join_classes("dynamic-list", self.class.as_ref()))
            .child(Node::raw(bind_fragment_root()))
            .child(body);

        let handle = compile_fragment(cx, &self.require, template.into()).await?;

        if let Some(island) = &self.island {
            cx.finalize_island(IslandRecord {
                id: island.clone(),
                fragment_id: handle.id.clone(),
                kind: IslandKind::List,
                resource_name: self.require.clone(),
            });
        }

        Ok(placeholder(cx, &handle, &self.settings, &self.fallback))
    }
}
