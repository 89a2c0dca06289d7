//! Structural misuse and failure propagation.
//!
//! Misplaced constructs must fail the build at the point of misuse, and the
//! error must name the nearest enclosing component.

#[cfg(test)]
mod tests {
    use crate::actions::{Action, HttpMethod};
    use crate::assets::{AssetStore, Script};
    use crate::component::component;
    use crate::conditional::{Else, If};
    use crate::error::{BuildError, RenderError};
    use crate::expr::{Condition, DataPath};
    use crate::node::{el, Node};
    use crate::options::BuildOptions;
    use crate::pages::{build_pages, BuildOutput};
    use crate::router::{Route, Switch};

    async fn try_build(root: Node) -> Result<BuildOutput, BuildError> {
        let options = BuildOptions::default();
        let assets = AssetStore::new(&options);
        build_pages(&root, &options, &assets).await
    }

    fn page(content: impl Into<Node>) -> Node {
        Switch::new("root")
            .child(Route::new("page").child(content))
            .into()
    }

    fn render_error(result: Result<BuildOutput, BuildError>) -> RenderError {
        match result {
            Err(BuildError::Render(err)) => err,
            Err(other) => panic!("expected a render error, got {}", other),
            Ok(_) => panic!("expected the build to fail"),
        }
    }

    fn assert_misuse(err: &RenderError, expected: &str) {
        match err.root_cause() {
            RenderError::Misuse { construct, .. } => assert_eq!(construct, expected),
            other => panic!("expected misuse of {}, got {}", expected, other),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CONDITIONALS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_else_outside_if() {
        let err = render_error(try_build(page(Else::new("orphan"))).await);
        assert_misuse(&err, "Else");
        assert_eq!(err.component(), Some("Else"));
    }

    #[tokio::test]
    async fn test_else_marker_next_to_inline_else() {
        let cond = If::new(DataPath::root(".Ok"))
            .then(Else::new("marker"))
            .otherwise("inline");
        let err = render_error(try_build(page(cond)).await);
        assert_misuse(&err, "Else");
        assert_eq!(err.component(), Some("If"));
    }

    #[tokio::test]
    async fn test_two_else_markers() {
        let cond = If::new(DataPath::root(".Ok"))
            .then(Else::new("one"))
            .then(Else::new("two"));
        let err = render_error(try_build(page(cond)).await);
        assert_misuse(&err, "Else");
    }

    #[tokio::test]
    async fn test_else_marker_in_inline_else_branch() {
        let inner = If::new(DataPath::root(".B"))
            .then("b")
            .otherwise(Else::new("x"));
        let cond = If::new(DataPath::root(".A")).then(inner);
        let err = render_error(try_build(page(cond)).await);
        assert_misuse(&err, "Else");
        assert_eq!(err.component(), Some("Else"));
    }

    #[tokio::test]
    async fn test_else_marker_inside_else_marker() {
        let inner = If::new(DataPath::root(".B"))
            .then("b")
            .then(Else::new(Else::new("x")));
        let cond = If::new(DataPath::root(".A")).then(inner);
        let err = render_error(try_build(page(cond)).await);
        assert_misuse(&err, "Else");
    }

    #[tokio::test]
    async fn test_else_does_not_reach_into_fragment() {
        let fragment = crate::fragments::DynamicFragment::new("User", |_user: DataPath| {
            Else::new("inside fragment")
        });
        let cond = If::new(DataPath::root(".Ok")).then(fragment);
        let err = render_error(try_build(page(cond)).await);
        assert_misuse(&err, "Else");
    }

    #[tokio::test]
    async fn test_condition_with_nan_fails_the_build() {
        let cond = If::new(Condition::gt(DataPath::root(".Score"), f64::NAN)).then("high");
        let err = render_error(try_build(page(cond)).await);
        assert_misuse(&err, "If");
        assert_eq!(err.component(), Some("If"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ROUTING
    // ═══════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_route_outside_switch() {
        let root: Node = el("main").child(Route::new("lost")).into();
        let err = render_error(try_build(root).await);
        assert_misuse(&err, "Route");
    }

    #[tokio::test]
    async fn test_missing_root() {
        assert!(matches!(
            try_build(Node::Empty).await,
            Err(BuildError::MissingRoot)
        ));
        assert!(matches!(
            try_build(Node::Fragment(vec![Node::Empty])).await,
            Err(BuildError::MissingRoot)
        ));
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_rendering() {
        let options = BuildOptions {
            dynamic_prefix: String::new(),
            ..BuildOptions::default()
        };
        let assets = AssetStore::new(&options);
        let result = build_pages(&page("x"), &options, &assets).await;
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // FORMS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_submit_outside_form() {
        let action = Action::new(HttpMethod::Post, "save");
        let err = render_error(try_build(page(action.submit())).await);
        assert_misuse(&err, "Submit");
    }

    #[tokio::test]
    async fn test_submit_inside_another_actions_form() {
        let save = Action::new(HttpMethod::Post, "save");
        let delete = Action::new(HttpMethod::Delete, "delete");
        let err = render_error(try_build(page(save.form().child(delete.submit()))).await);
        assert_misuse(&err, "Submit");
    }

    #[tokio::test]
    async fn test_nested_forms() {
        let outer = Action::new(HttpMethod::Post, "outer");
        let inner = Action::new(HttpMethod::Post, "inner");
        let err = render_error(try_build(page(outer.form().child(inner.form()))).await);
        assert_misuse(&err, "Form");
    }

    #[tokio::test]
    async fn test_quick_button_inside_form() {
        let save = Action::new(HttpMethod::Post, "save");
        let like = Action::new(HttpMethod::Post, "like");
        let err = render_error(try_build(page(save.form().child(like.quick_button()))).await);
        assert_misuse(&err, "QuickButton");
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // COMPONENT FAILURES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_component_error_names_nearest_component() {
        let broken = component("Broken", |_| Err(RenderError::Component("boom".to_string())));
        let outer = component("Outer", move |_| Ok(el("section").child(broken.clone()).into()));

        let err = render_error(try_build(page(outer)).await);
        assert_eq!(err.component(), Some("Broken"));
        assert!(matches!(err.root_cause(), RenderError::Component(msg) if msg == "boom"));
        assert_eq!(err.to_string(), "in component `Broken`: boom");
    }

    #[tokio::test]
    async fn test_missing_script_fails_the_build() {
        let err = render_error(try_build(page(Script::reference("vendor"))).await);
        assert_eq!(err.component(), Some("Script"));
        assert!(matches!(err.root_cause(), RenderError::Asset { name, .. } if name == "vendor"));
    }
}
