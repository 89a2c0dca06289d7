use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// RENDER ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure raised while rendering a tree. Aborts the enclosing build.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A construct used where it is not allowed (an `Else` outside any `If`,
    /// a `Route` outside any `Switch`, a submit button outside its form).
    #[error("{construct} misused: {reason}")]
    Misuse { construct: String, reason: String },

    #[error("in component `{component}`: {source}")]
    InComponent {
        component: String,
        #[source]
        source: Box<RenderError>,
    },

    #[error("asset `{name}` could not be registered: {reason}")]
    Asset { name: String, reason: String },

    /// Raised by user components.
    #[error("{0}")]
    Component(String),
}

impl RenderError {
    pub fn misuse(construct: &str, reason: impl Into<String>) -> Self {
        RenderError::Misuse {
            construct: construct.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach the nearest enclosing component. Errors that already carry a
    /// component name are returned unchanged.
    pub fn within(self, component: &str) -> Self {
        match self {
            RenderError::InComponent { .. } => self,
            other => RenderError::InComponent {
                component: component.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the component the error was raised in, if known.
    pub fn component(&self) -> Option<&str> {
        match self {
            RenderError::InComponent { component, .. } => Some(component),
            _ => None,
        }
    }

    /// The error without its component attribution.
    pub fn root_cause(&self) -> &RenderError {
        match self {
            RenderError::InComponent { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILD ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("root component is missing or renders nothing")]
    MissingRoot,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("route discovery did not settle after {limit} probes")]
    DiscoveryLimit { limit: usize },

    #[error("invalid build options: {0}")]
    Config(String),

    #[error("failed to write artifact `{path}`: {reason}")]
    Sink { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_attaches_once() {
        let err = RenderError::misuse("Else", "outside of If")
            .within("Inner")
            .within("Outer");
        assert_eq!(err.component(), Some("Inner"));
        assert!(matches!(err.root_cause(), RenderError::Misuse { .. }));
        assert_eq!(
            err.to_string(),
            "in component `Inner`: Else misused: outside of If"
        );
    }
}
