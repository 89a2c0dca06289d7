//! Final build pass.
//!
//! Every discovered route is rendered once more, this time with the build
//! flag set and a [`BuildSession`] that keeps compiled fragments and island
//! records. The result is a [`BuildOutput`], which can be written out through
//! any [`ArtifactSink`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::assets::{Asset, AssetStore, UsedAssets};
use crate::discovery::{collect_routes, FrozenRoutes};
use crate::env::{DocumentScope, PageScope, RenderContext, RenderEnv};
use crate::error::BuildError;
use crate::fragments::CompiledFragment;
use crate::islands::IslandRecord;
use crate::node::Node;
use crate::options::BuildOptions;
use crate::session::BuildSession;

// ═══════════════════════════════════════════════════════════════════════════════
// PAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// A resource a page needs at request time, and the template variable it is
/// exposed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredResource {
    pub key: String,
    pub res: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub route: String,
    pub html: String,
    pub required_resources: Vec<RequiredResource>,
    pub metadata: Map<String, Value>,
}

impl Page {
    pub fn is_dynamic(&self) -> bool {
        !self.required_resources.is_empty()
    }

    pub fn meta(&self) -> PageMetadata {
        PageMetadata {
            is_dynamic: self.is_dynamic(),
            resources: self
                .is_dynamic()
                .then(|| self.required_resources.clone()),
            metadata: self.metadata.clone(),
        }
    }
}

/// Sidecar record the downstream server reads next to each page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub is_dynamic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<RequiredResource>>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Destination of build artifacts. Paths are relative and `/`-separated.
pub trait ArtifactSink {
    /// Pages, fragment templates and their metadata.
    fn write_output(&mut self, path: &str, contents: &str) -> Result<(), BuildError>;

    /// Files served from the static URL.
    fn write_static(&mut self, path: &str, contents: &str) -> Result<(), BuildError>;
}

/// Keeps artifacts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub output: BTreeMap<String, String>,
    pub static_files: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for MemorySink {
    fn write_output(&mut self, path: &str, contents: &str) -> Result<(), BuildError> {
        self.output.insert(path.to_string(), contents.to_string());
        Ok(())
    }

    fn write_static(&mut self, path: &str, contents: &str) -> Result<(), BuildError> {
        self.static_files
            .insert(path.to_string(), contents.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub pages: Vec<Page>,
    pub fragments: Vec<CompiledFragment>,
    pub islands: Vec<IslandRecord>,
    pub assets: Vec<Asset>,
    dynamic_prefix: String,
}

impl BuildOutput {
    pub fn page(&self, route: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.route == route)
    }

    pub fn fragment(&self, hash: &str) -> Option<&CompiledFragment> {
        self.fragments.iter().find(|f| f.content_hash == hash)
    }

    /// Write every artifact to `sink`.
    pub fn emit(&self, sink: &mut dyn ArtifactSink) -> Result<(), BuildError> {
        for page in &self.pages {
            sink.write_output(&format!("{}.html", page.route), &page.html)?;
            write_json(sink, &format!("{}.meta.json", page.route), &page.meta())?;
        }

        let prefix = self.dynamic_prefix.trim_matches('/');
        for fragment in &self.fragments {
            let base = format!("{}/{}", prefix, fragment.content_hash);
            sink.write_output(
                &format!("{}.template.html", base),
                &fragment.compiled_template_text,
            )?;
            write_json(sink, &format!("{}.meta.json", base), &fragment.metadata())?;
        }

        for island in &self.islands {
            write_json(sink, &format!("__islands/{}.meta.json", island.id), island)?;
        }

        for asset in &self.assets {
            sink.write_static(asset.out_file.trim_start_matches('/'), &asset.contents)?;
        }

        Ok(())
    }
}

fn write_json<T: Serialize>(
    sink: &mut dyn ArtifactSink,
    path: &str,
    value: &T,
) -> Result<(), BuildError> {
    let json = serde_json::to_string(value).map_err(|e| BuildError::Sink {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    sink.write_output(path, &json)
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILD
// ═══════════════════════════════════════════════════════════════════════════════

/// Discover every route of `root` and build one page per route.
///
/// Assets are registered into `assets`; only the ones this build registered or
/// linked are part of the output. A render failure aborts the whole build.
pub async fn build_pages(
    root: &Node,
    options: &BuildOptions,
    assets: &AssetStore,
) -> Result<BuildOutput, BuildError> {
    options.validate()?;

    let routes = collect_routes(root, options).await?;
    let registrar = FrozenRoutes(&routes);
    let session = BuildSession::new(options);
    let used_assets = UsedAssets::new(assets);

    info!(routes = routes.len(), "building pages");

    let mut pages = Vec::with_capacity(routes.len());
    for route in routes.all() {
        debug!(route = %route.path, "building page");

        let document = DocumentScope::new();
        let page_scope = PageScope::new();
        let cx = RenderContext::new(
            RenderEnv::page(&route.path, &route.title),
            options,
            &registrar,
            &used_assets,
            Some(&session),
            &document,
            &page_scope,
        );
        let html = cx.render(root).await?;

        let (required_resources, metadata) = page_scope.into_parts();
        pages.push(Page {
            route: route.path.to_string(),
            html,
            required_resources,
            metadata,
        });
    }

    let (fragments, islands) = session.into_parts();
    info!(
        pages = pages.len(),
        fragments = fragments.len(),
        islands = islands.len(),
        "build finished"
    );

    Ok(BuildOutput {
        pages,
        fragments,
        islands,
        assets: used_assets.into_assets(),
        dynamic_prefix: options.dynamic_prefix.clone(),
    })
}
