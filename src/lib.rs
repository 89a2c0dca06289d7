//! # Page Compiler
//!
//! Compiles a tree of declarative page components into:
//!
//! 1. One static HTML document per reachable route, and
//! 2. Go-template fragments for content the downstream server renders per
//!    request, each stored under a content hash.
//!
//! ## Pipeline
//!
//! 1. **Route discovery** ([`collect_routes`]): the tree is rendered with
//!    varying route selections until a render registers no new route.
//! 2. **Build** ([`build_pages`]): every discovered route is rendered once
//!    more with the build flag set. Dynamic fragments met on the way are
//!    compiled into template source and registered with the build session.
//!    Pages are usually wrapped in [`Html`], which loads htmx and enables the
//!    morph swap the fragment placeholders rely on.
//! 3. **Emit** ([`BuildOutput::emit`]): pages, fragment templates, metadata
//!    sidecars and assets go to an [`ArtifactSink`].
//!
//! ## Template invariants
//!
//! - Data is only referenced symbolically through [`DataPath`]; the compiler
//!   never sees request data.
//! - Every compiled loop binds fresh variable names (`$_i<n>`, `$_i<n>_key`)
//!   that are unique within their document.
//! - String literals inside template actions use the `@#34T;` quote token so
//!   they survive HTML escaping; the downstream loader turns it back into `"`.

mod actions;
mod assets;
mod codegen;
mod component;
mod conditional;
mod discovery;
mod env;
mod error;
mod expr;
mod fragments;
mod html;
mod islands;
mod iteration;
mod node;
mod options;
mod pages;
mod paths;
mod render;
mod router;
mod session;

#[cfg(test)]
mod build_tests;
#[cfg(test)]
mod safety_tests;

pub use actions::{Action, Form, HttpMethod, QuickButton, Submit};
pub use assets::{Asset, AssetKind, AssetRegistry, AssetStore, NullAssets, Script, Stylesheet};
pub use codegen::{FRAGMENT_ROOT, TEMPL_QUOTE};
pub use component::{component, Component, FnComponent};
pub use conditional::{Else, If};
pub use discovery::{collect_routes, RouteCollection, RouteDefinition, RouteRegistrar};
pub use env::{resource_key, RenderContext, RenderEnv};
pub use error::{BuildError, RenderError};
pub use expr::{Condition, DataPath, Expr, Literal};
pub use fragments::{
    content_hash, CompiledFragment, DynamicFragment, DynamicList, FragmentHandle,
    FragmentMetadata, FragmentRegistry, LoadSettings, Trigger,
};
pub use html::{Head, Html, Meta, HTMX_SCRIPT_URL};
pub use islands::{Island, IslandKind, IslandRecord, IslandRegistry};
pub use iteration::ForEach;
pub use node::{el, Attribute, AttributeValue, ElementNode, Node};
pub use options::BuildOptions;
pub use pages::{
    build_pages, ArtifactSink, BuildOutput, MemorySink, Page, PageMetadata, RequiredResource,
};
pub use paths::{comparable_equal, is_descendant_or_self, RoutePath};
pub use router::{Link, Redirect, Route, Switch};
pub use session::BuildSession;
