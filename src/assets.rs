//! Static asset registration.
//!
//! Bundling and minification happen elsewhere; constructs here receive
//! finished CSS/JS text and either inline it or hand it to an
//! [`AssetRegistry`], which decides where it is served from.

use std::cell::RefCell;
use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::Component;
use crate::env::RenderContext;
use crate::error::RenderError;
use crate::fragments::content_hash;
use crate::node::{el, Node};
use crate::options::BuildOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
        }
    }
}

pub trait AssetRegistry {
    /// Store `content` and return the URL it will be served from.
    fn register(
        &self,
        content: &str,
        logical_name: &str,
        kind: AssetKind,
    ) -> Result<String, RenderError>;

    fn lookup(&self, logical_name: &str) -> Option<String>;
}

/// Registry used while probing routes; nothing is kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAssets;

impl AssetRegistry for NullAssets {
    fn register(&self, _: &str, _: &str, _: AssetKind) -> Result<String, RenderError> {
        Ok(String::new())
    }

    fn lookup(&self, _: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub name: String,
    pub kind: AssetKind,
    pub contents: String,
    /// Path relative to the static directory.
    pub out_file: String,
    pub url: String,
}

/// In-memory registry. Files are content addressed, so registering the same
/// content under the same name twice yields one file.
#[derive(Debug)]
pub struct AssetStore {
    static_url: String,
    asset_prefix: String,
    files: RefCell<Vec<Asset>>,
}

impl AssetStore {
    pub fn new(options: &BuildOptions) -> Self {
        Self {
            static_url: options.static_url.clone(),
            asset_prefix: options.asset_prefix.trim_matches('/').to_string(),
            files: RefCell::new(Vec::new()),
        }
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.files.borrow().clone()
    }

    pub fn into_assets(self) -> Vec<Asset> {
        self.files.into_inner()
    }
}

impl AssetRegistry for AssetStore {
    fn register(
        &self,
        content: &str,
        logical_name: &str,
        kind: AssetKind,
    ) -> Result<String, RenderError> {
        if logical_name.is_empty() {
            return Err(RenderError::Asset {
                name: logical_name.to_string(),
                reason: "assets need a logical name".to_string(),
            });
        }

        let hash = content_hash(logical_name, content);
        let out_file = format!(
            "/{}/{}/{}.{}",
            self.asset_prefix,
            kind.extension(),
            hash,
            kind.extension()
        );
        let url = join_url(&self.static_url, &out_file);

        let mut files = self.files.borrow_mut();
        if !files.iter().any(|f| f.out_file == out_file) {
            debug!(name = logical_name, url = %url, "asset registered");
            files.push(Asset {
                name: logical_name.to_string(),
                kind,
                contents: content.to_string(),
                out_file,
                url: url.clone(),
            });
        }
        Ok(url)
    }

    fn lookup(&self, logical_name: &str) -> Option<String> {
        self.files
            .borrow()
            .iter()
            .find(|f| f.name == logical_name)
            .map(|f| f.url.clone())
    }
}

/// Records which assets of a shared store one build registered or linked,
/// so a store reused across builds only reports the current build's files.
pub(crate) struct UsedAssets<'a> {
    store: &'a AssetStore,
    urls: RefCell<BTreeSet<String>>,
}

impl<'a> UsedAssets<'a> {
    pub(crate) fn new(store: &'a AssetStore) -> Self {
        Self {
            store,
            urls: RefCell::new(BTreeSet::new()),
        }
    }

    /// Used assets, in the store's registration order.
    pub(crate) fn into_assets(self) -> Vec<Asset> {
        let urls = self.urls.into_inner();
        self.store
            .assets()
            .into_iter()
            .filter(|asset| urls.contains(&asset.url))
            .collect()
    }
}

impl AssetRegistry for UsedAssets<'_> {
    fn register(
        &self,
        content: &str,
        logical_name: &str,
        kind: AssetKind,
    ) -> Result<String, RenderError> {
        let url = self.store.register(content, logical_name, kind)?;
        self.urls.borrow_mut().insert(url.clone());
        Ok(url)
    }

    fn lookup(&self, logical_name: &str) -> Option<String> {
        let url = self.store.lookup(logical_name)?;
        self.urls.borrow_mut().insert(url.clone());
        Some(url)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET CONSTRUCTS
// ═══════════════════════════════════════════════════════════════════════════════

/// A stylesheet, linked through the asset registry or inlined.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    name: String,
    contents: String,
    inline: bool,
}

impl Stylesheet {
    pub fn new(name: &str, contents: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            contents: contents.into(),
            inline: false,
        }
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }
}

impl From<Stylesheet> for Node {
    fn from(style: Stylesheet) -> Self {
        Node::component(style)
    }
}

#[async_trait(?Send)]
impl Component for Stylesheet {
    fn name(&self) -> &str {
        "Stylesheet"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let contents = format!("/* {} */\n{}", self.name, self.contents);
        if self.inline {
            return Ok(el("style").child(Node::raw(contents)).into());
        }

        let href = cx.assets().register(&contents, &self.name, AssetKind::Css)?;
        Ok(el("link")
            .attr("rel", "stylesheet")
            .attr("href", href)
            .attr("type", "text/css")
            .attr("media", "screen")
            .into())
    }
}

#[derive(Debug, Clone)]
enum ScriptSource {
    Contents(String),
    /// An asset some other construct registers.
    Registered,
}

/// A script, linked through the asset registry or inlined.
#[derive(Debug, Clone)]
pub struct Script {
    name: String,
    source: ScriptSource,
    inline: bool,
    module: bool,
}

impl Script {
    pub fn new(name: &str, contents: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            source: ScriptSource::Contents(contents.into()),
            inline: false,
            module: false,
        }
    }

    /// Link an asset registered under `name` by another construct.
    pub fn reference(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: ScriptSource::Registered,
            inline: false,
            module: false,
        }
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn module(mut self) -> Self {
        self.module = true;
        self
    }
}

impl From<Script> for Node {
    fn from(script: Script) -> Self {
        Node::component(script)
    }
}

#[async_trait(?Send)]
impl Component for Script {
    fn name(&self) -> &str {
        "Script"
    }

    async fn render(&self, cx: &RenderContext<'_>) -> Result<Node, RenderError> {
        let script_type = if self.module {
            "module"
        } else {
            "text/javascript"
        };

        let src = match &self.source {
            ScriptSource::Contents(contents) if self.inline => {
                return Ok(el("script")
                    .attr("type", script_type)
                    .child(Node::raw(contents.clone()))
                    .into());
            }
            ScriptSource::Contents(contents) => {
                cx.assets().register(contents, &self.name, AssetKind::Js)?
            }
            ScriptSource::Registered => match cx.assets().lookup(&self.name) {
                Some(url) => url,
                None if !cx.env().build_phase => return Ok(Node::Empty),
                None => {
                    return Err(RenderError::Asset {
                        name: self.name.clone(),
                        reason: "no asset registered under this name".to_string(),
                    })
                }
            },
        };

        Ok(el("script")
            .attr("type", script_type)
            .attr("src", src)
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_dedupes_identical_content() {
        let store = AssetStore::new(&BuildOptions::default().with_static_url("/static"));
        let a = store.register("body{}", "main.css", AssetKind::Css).unwrap();
        let b = store.register("body{}", "main.css", AssetKind::Css).unwrap();
        let c = store.register("p{}", "main.css", AssetKind::Css).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("/static/assets/css/"));
        assert!(a.ends_with(".css"));
        assert_eq!(store.assets().len(), 2);
        assert_eq!(store.lookup("main.css"), Some(a));
        assert_eq!(store.lookup("other.css"), None);
    }

    #[test]
    fn test_used_assets_reports_only_touched_files() {
        let store = AssetStore::new(&BuildOptions::default());
        store.register("a{}", "old", AssetKind::Css).unwrap();
        let vendor = store.register("v()", "vendor", AssetKind::Js).unwrap();

        let used = UsedAssets::new(&store);
        used.register("b{}", "new", AssetKind::Css).unwrap();
        assert_eq!(used.lookup("vendor"), Some(vendor));
        assert_eq!(used.lookup("missing"), None);

        let names: Vec<String> = used.into_assets().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["vendor", "new"]);
        assert_eq!(store.assets().len(), 3);
    }

    #[test]
    fn test_store_rejects_unnamed_assets() {
        let store = AssetStore::new(&BuildOptions::default());
        assert!(matches!(
            store.register("x", "", AssetKind::Js),
            Err(RenderError::Asset { .. })
        ));
    }
}
