//! Islands: named dynamic regions that can be re-fetched on their own, for
//! example after a form action changed the data behind them.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::expr::DataPath;
use crate::fragments::{DynamicFragment, DynamicList, LoadSettings};
use crate::node::{el, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IslandKind {
    Single,
    List,
}

/// What the build records about a rendered island.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandRecord {
    pub id: String,
    pub fragment_id: String,
    #[serde(rename = "type")]
    pub kind: IslandKind,
    pub resource_name: String,
}

#[derive(Debug, Default)]
pub struct IslandRegistry {
    islands: Vec<IslandRecord>,
}

impl IslandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fragment an island compiled to. The first record of an id
    /// is kept.
    pub fn finalize(&mut self, island: IslandRecord) {
        match self.islands.iter().find(|i| i.id == island.id) {
            Some(existing) if existing.fragment_id != island.fragment_id => {
                warn!(
                    island = %island.id,
                    kept = %existing.fragment_id,
                    ignored = %island.fragment_id,
                    "island compiled to different fragments on different pages"
                );
            }
            Some(_) => {}
            None => self.islands.push(island),
        }
    }

    pub fn fragment_id(&self, island_id: &str) -> Option<&str> {
        let found = self
            .islands
            .iter()
            .find(|i| i.id == island_id)
            .map(|i| i.fragment_id.as_str());
        if found.is_none() {
            warn!(island = island_id, "island has not been rendered yet");
        }
        found
    }

    pub fn all(&self) -> &[IslandRecord] {
        &self.islands
    }

    pub fn into_islands(self) -> Vec<IslandRecord> {
        self.islands
    }
}

type SingleRender = Rc<dyn Fn(DataPath) -> Node>;
type ListRender = Rc<dyn Fn(DataPath, DataPath) -> Node>;

#[derive(Clone)]
enum IslandBody {
    Single(SingleRender),
    List(ListRender),
}

/// Definition of an island. Cheap to clone; place it in the tree with
/// [`Island::node`] and refer to it from form actions by value.
#[derive(Clone)]
pub struct Island {
    id: String,
    resource: String,
    body: IslandBody,
    settings: LoadSettings,
}

impl Island {
    pub fn single<F, N>(id: &str, resource: &str, render: F) -> Self
    where
        F: Fn(DataPath) -> N + 'static,
        N: Into<Node>,
    {
        Self {
            id: id.to_string(),
            resource: resource.to_string(),
            body: IslandBody::Single(Rc::new(move |data| render(data).into())),
            settings: LoadSettings::default(),
        }
    }

    pub fn list<F, N>(id: &str, resource: &str, render: F) -> Self
    where
        F: Fn(DataPath, DataPath) -> N + 'static,
        N: Into<Node>,
    {
        Self {
            id: id.to_string(),
            resource: resource.to_string(),
            body: IslandBody::List(Rc::new(move |item, index| render(item, index).into())),
            settings: LoadSettings::default(),
        }
    }

    pub fn settings(mut self, settings: LoadSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn kind(&self) -> IslandKind {
        match self.body {
            IslandBody::Single(_) => IslandKind::Single,
            IslandBody::List(_) => IslandKind::List,
        }
    }

    pub fn node(&self) -> Node {
        match &self.body {
            IslandBody::Single(render) => {
                let render = render.clone();
                let mut fragment = DynamicFragment::new(&self.resource, move |data| render(data))
                    .settings(self.settings.clone());
                fragment.island = Some(self.id.clone());
                el("div").attr("id", self.id.as_str()).child(fragment).into()
            }
            IslandBody::List(render) => {
                let render = render.clone();
                let mut list =
                    DynamicList::new(&self.resource, move |item, index| render(item, index))
                        .id(&self.id)
                        .class(format!("island_{}", self.id))
                        .settings(self.settings.clone());
                list.island = Some(self.id.clone());
                list.into()
            }
        }
    }
}

impl From<&Island> for Node {
    fn from(island: &Island) -> Self {
        island.node()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, fragment_id: &str) -> IslandRecord {
        IslandRecord {
            id: id.to_string(),
            fragment_id: fragment_id.to_string(),
            kind: IslandKind::Single,
            resource_name: "cart".to_string(),
        }
    }

    #[test]
    fn test_first_record_wins() {
        let mut registry = IslandRegistry::new();
        registry.finalize(record("cart", "aaa"));
        registry.finalize(record("cart", "bbb"));
        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.fragment_id("cart"), Some("aaa"));
        assert_eq!(registry.fragment_id("missing"), None);
    }

    #[test]
    fn test_record_serializes_type_field() {
        let json = serde_json::to_value(record("cart", "aaa")).unwrap();
        assert_eq!(json["type"], "single");
        assert_eq!(json["fragmentId"], "aaa");
    }
}
