use std::cell::RefCell;

use crate::fragments::{CompiledFragment, FragmentHandle, FragmentRegistry};
use crate::islands::{IslandRecord, IslandRegistry};
use crate::options::BuildOptions;

/// Artifacts shared by every page render of one build.
#[derive(Debug)]
pub struct BuildSession {
    options: BuildOptions,
    fragments: RefCell<FragmentRegistry>,
    islands: RefCell<IslandRegistry>,
}

impl BuildSession {
    pub fn new(options: &BuildOptions) -> Self {
        Self {
            options: options.clone(),
            fragments: RefCell::new(FragmentRegistry::new()),
            islands: RefCell::new(IslandRegistry::new()),
        }
    }

    pub fn register_fragment(&self, logical_name: &str, compiled: &str) -> FragmentHandle {
        self.fragments
            .borrow_mut()
            .register(logical_name, compiled, &self.options)
    }

    pub fn finalize_island(&self, island: IslandRecord) {
        self.islands.borrow_mut().finalize(island);
    }

    pub fn island_fragment_id(&self, island_id: &str) -> Option<String> {
        self.islands
            .borrow()
            .fragment_id(island_id)
            .map(str::to_string)
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.borrow().len()
    }

    pub fn into_parts(self) -> (Vec<CompiledFragment>, Vec<IslandRecord>) {
        (
            self.fragments.into_inner().into_fragments(),
            self.islands.into_inner().into_islands(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::IslandKind;

    #[test]
    fn test_island_fragment_id_is_known_after_render() {
        let session = BuildSession::new(&BuildOptions::default());
        assert_eq!(session.island_fragment_id("cart"), None);

        let handle = session.register_fragment("cart", "<dynamic-fragment></dynamic-fragment>");
        session.register_fragment("cart", "<dynamic-fragment></dynamic-fragment>");
        assert_eq!(session.fragment_count(), 1);

        session.finalize_island(IslandRecord {
            id: "cart".to_string(),
            fragment_id: handle.id.clone(),
            kind: IslandKind::Single,
            resource_name: "cart".to_string(),
        });
        assert_eq!(session.island_fragment_id("cart"), Some(handle.id));
        assert_eq!(session.island_fragment_id("wishlist"), None);
    }

    #[test]
    fn test_sessions_do_not_share_registries() {
        let first = BuildSession::new(&BuildOptions::default());
        first.register_fragment("user", "a");
        let second = BuildSession::new(&BuildOptions::default());

        assert_eq!(first.fragment_count(), 1);
        assert_eq!(second.fragment_count(), 0);
    }
}
