use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Options of one build invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// URL prefix static assets are served under.
    pub static_url: String,
    /// First path segment of fragment retrieval endpoints (`/<prefix>/<hash>`).
    pub dynamic_prefix: String,
    /// Directory under `static_url` assets are written to.
    pub asset_prefix: String,
    /// Upper bound on discovery renders before giving up.
    pub max_discovery_probes: usize,
    /// Request header a fragment placeholder sends with the current route.
    pub fragment_request_header: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            static_url: "/".to_string(),
            dynamic_prefix: "__dyn".to_string(),
            asset_prefix: "assets".to_string(),
            max_discovery_probes: 10_000,
            fragment_request_header: "X-Fragment-Route".to_string(),
        }
    }
}

impl BuildOptions {
    pub fn with_static_url(mut self, static_url: &str) -> Self {
        self.static_url = static_url.to_string();
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, BuildError> {
        let options: BuildOptions =
            toml::from_str(source).map_err(|e| BuildError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.max_discovery_probes == 0 {
            return Err(BuildError::Config(
                "maxDiscoveryProbes must be at least 1".to_string(),
            ));
        }
        let prefix = self.dynamic_prefix.trim_matches('/');
        if prefix.is_empty() || prefix.contains('/') {
            return Err(BuildError::Config(format!(
                "dynamicPrefix must be a single path segment, got `{}`",
                self.dynamic_prefix
            )));
        }
        Ok(())
    }

    /// `/<dynamic-prefix>/<hash>`
    pub fn fragment_url(&self, hash: &str) -> String {
        format!("/{}/{}", self.dynamic_prefix.trim_matches('/'), hash)
    }
}
