//! End-to-end build tests: discovery, page rendering, fragment compilation
//! and artifact emission.

#[cfg(test)]
mod tests {
    use crate::actions::{Action, HttpMethod};
    use crate::assets::{AssetStore, Stylesheet};
    use crate::conditional::If;
    use crate::expr::{Condition, DataPath};
    use crate::fragments::{DynamicFragment, DynamicList, LoadSettings, Trigger};
    use crate::islands::{Island, IslandKind};
    use crate::node::{el, Node};
    use crate::options::BuildOptions;
    use crate::pages::{build_pages, BuildOutput, MemorySink, RequiredResource};
    use crate::router::{Link, Redirect, Route, Switch};

    async fn build(root: Node) -> BuildOutput {
        let options = BuildOptions::default();
        let assets = AssetStore::new(&options);
        build_pages(&root, &options, &assets).await.unwrap()
    }

    fn routes(output: &BuildOutput) -> Vec<&str> {
        output.pages.iter().map(|p| p.route.as_str()).collect()
    }

    fn product_site() -> Node {
        let products = (1..=3).fold(Route::new("products").title("Products"), |route, n| {
            route.child(
                Route::new(&n.to_string())
                    .title(&format!("Product {}", n))
                    .child(el("h2").child(format!("Product #{}", n))),
            )
        });

        el("html")
            .child(el("head").child(Stylesheet::new("site", "body{margin:0}")))
            .child(
                el("body").child(
                    Switch::new("root")
                        .attr("class", "main")
                        .child(
                            Route::new("home")
                                .title("Home")
                                .child(el("h1").child("Home"))
                                .child(Link::new("/about").child("About us")),
                        )
                        .child(Route::new("about").title("About").child(el("h1").child("About")))
                        .child(products),
                ),
            )
            .into()
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // STATIC PAGES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_static_site_builds_one_page_per_route() {
        let output = build(product_site()).await;

        assert_eq!(
            routes(&output),
            vec!["home", "about", "products", "products/1", "products/2", "products/3"]
        );
        assert!(output.fragments.is_empty());
        assert!(output.islands.is_empty());
        assert!(output.pages.iter().all(|p| !p.is_dynamic()));
    }

    #[tokio::test]
    async fn test_page_renders_only_selected_route() {
        let output = build(product_site()).await;

        let page = output.page("products/2").unwrap();
        assert!(page.html.contains("<h2>Product #2</h2>"));
        assert!(!page.html.contains("Product #1"));
        assert!(!page.html.contains("<h1>Home</h1>"));
        assert!(page
            .html
            .contains(r#"<div class="main __route-switch" id="root">"#));

        let products = output.page("products").unwrap();
        assert!(!products.html.contains("<h2>"));
    }

    #[tokio::test]
    async fn test_link_targets_router_container() {
        let output = build(product_site()).await;
        let home = output.page("home").unwrap();
        assert!(home.html.contains(
            r##"<a href="/about" hx-boost="true" hx-target="#root" hx-swap="outerHTML">About us</a>"##
        ));
    }

    #[tokio::test]
    async fn test_shared_stylesheet_is_registered_once() {
        let output = build(product_site()).await;

        assert_eq!(output.assets.len(), 1);
        let url = &output.assets[0].url;
        assert!(url.starts_with("/assets/css/"));
        for page in &output.pages {
            assert!(page.html.contains(&format!(r#"href="{}""#, url)), "{}", page.route);
        }
    }

    #[tokio::test]
    async fn test_reused_asset_store_reports_each_builds_assets() {
        let options = BuildOptions::default();
        let assets = AssetStore::new(&options);
        let styled = |name: &str| -> Node {
            Switch::new("root")
                .child(Route::new("home").child(Stylesheet::new(name, "p{}")))
                .into()
        };
        let plain: Node = Switch::new("root").child(Route::new("home").child("home")).into();

        let first = build_pages(&styled("a"), &options, &assets).await.unwrap();
        let second = build_pages(&plain, &options, &assets).await.unwrap();
        let third = build_pages(&styled("a"), &options, &assets).await.unwrap();

        assert_eq!(first.assets.len(), 1);
        assert!(second.assets.is_empty());
        assert_eq!(third.assets, first.assets, "already stored, still used");
        assert_eq!(assets.assets().len(), 1);
    }

    #[tokio::test]
    async fn test_redirect_is_recorded_in_metadata() {
        let root: Node = Switch::new("root")
            .child(Route::new("old").child(Redirect::new("/new")))
            .child(Route::new("new").child("new page"))
            .into();
        let output = build(root).await;

        let old = output.page("old").unwrap();
        assert_eq!(old.metadata["redirectUrl"], "/new");
        assert_eq!(old.metadata["shouldRedirect"], true);
        assert!(output.page("new").unwrap().metadata.is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_route_requires_resource() {
        let root: Node = Switch::new("root")
            .child(Route::dynamic("account", "user-account", |account: DataPath| {
                el("h1").child(account.field("name"))
            }))
            .into();
        let output = build(root).await;

        let page = output.page("account").unwrap();
        assert!(page.is_dynamic());
        assert_eq!(
            page.required_resources,
            vec![RequiredResource {
                key: "Useraccount".to_string(),
                res: "user-account".to_string(),
            }]
        );
        assert!(page.html.contains("<h1>{{.Useraccount.name}}</h1>"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DYNAMIC FRAGMENTS
    // ═══════════════════════════════════════════════════════════════════════════════

    fn user_card() -> DynamicFragment {
        DynamicFragment::new("User", |user: DataPath| {
            Node::fragment([
                Node::from(el("h1").child(user.field("name"))),
                If::new(Condition::and([user.field("premium"), user.field("active")]))
                    .then(el("ul").child(user.field("premiumLinks").for_each(|link, _| {
                        el("li").child(
                            el("a")
                                .attr("href", link.field("url"))
                                .child(link.field("title")),
                        )
                    })))
                    .into(),
            ])
        })
        .fallback(el("p").child("Loading <user>"))
    }

    #[tokio::test]
    async fn test_dynamic_fragment_compiles_to_template() {
        let root: Node = Switch::new("root")
            .child(Route::new("profile").child(user_card()))
            .into();
        let output = build(root).await;

        assert_eq!(output.fragments.len(), 1);
        let fragment = &output.fragments[0];
        assert_eq!(fragment.resource_name, "User");

        let text = &fragment.compiled_template_text;
        assert!(text.starts_with("<dynamic-fragment>{{$frag_root := .}}<h1>{{$frag_root.name}}</h1>"));
        assert_eq!(text.matches("{{if ").count(), 1);
        assert!(text.contains("{{if (and $frag_root.premium $frag_root.active)}}"));
        assert_eq!(text.matches("{{range ").count(), 1);
        assert!(text.contains("{{range $_i0_key, $_i0 := $frag_root.premiumLinks}}"));
        assert!(text.contains(r#"<a href="{{$_i0.url}}">{{$_i0.title}}</a>"#));
        for escaped in ["&#123;", "&#125;", "&quot;", "&#34;", "&lt;", "&gt;"] {
            assert!(!text.contains(escaped), "escaped delimiter {}", escaped);
        }
    }

    #[tokio::test]
    async fn test_dynamic_fragment_placeholder() {
        let root: Node = Switch::new("root")
            .child(Route::new("profile").child(user_card()))
            .into();
        let output = build(root).await;

        let hash = &output.fragments[0].content_hash;
        let html = &output.page("profile").unwrap().html;
        assert!(html.contains(&format!(
            r#"<div hx-trigger="revealed delay:20ms" hx-get="/__dyn/{}" hx-swap="outerHTML" hx-headers="{{&quot;X-Fragment-Route&quot;:&quot;/profile&quot;}}"><p>Loading &lt;user&gt;</p></div>"#,
            hash
        )));
        assert!(!html.contains("$frag_root"), "fragment body stays out of the page");
    }

    #[tokio::test]
    async fn test_identical_fragments_are_stored_once() {
        let root: Node = Switch::new("root")
            .child(Route::new("a").child(user_card()))
            .child(Route::new("b").child(user_card()).child(user_card()))
            .into();
        let output = build(root).await;

        assert_eq!(output.fragments.len(), 1);
    }

    #[tokio::test]
    async fn test_page_loops_do_not_leak_into_fragment_names() {
        let items = DataPath::root(".Items");
        let root: Node = Switch::new("root")
            .child(
                Route::new("a")
                    .child(items.for_each(|item, _| item))
                    .child(user_card()),
            )
            .child(Route::new("b").child(user_card()))
            .into();
        let output = build(root).await;

        assert_eq!(output.fragments.len(), 1);
        assert!(output.fragments[0]
            .compiled_template_text
            .contains("$_i0 := $frag_root.premiumLinks"));
    }

    #[tokio::test]
    async fn test_dynamic_list_with_settings() {
        let list = DynamicList::new("Todos", |todo: DataPath, _| el("span").child(todo.field("title")))
            .key(|todo, _| todo.field("id"))
            .class("todos")
            .item_class("todo")
            .settings(LoadSettings {
                trigger: Trigger::Load,
                morph: true,
                settle: Some("1s".to_string()),
                locale: Some("de".to_string()),
                ..LoadSettings::default()
            });
        let root: Node = Switch::new("root").child(Route::new("todos").child(list)).into();
        let output = build(root).await;

        let text = &output.fragments[0].compiled_template_text;
        assert_eq!(
            text,
            "<dynamic-fragment class=\"dynamic-list todos\">{{$frag_root := .}}\
             {{range $_i0_key, $_i0 := $frag_root}}\n\
             <div data-item-key=\"{{$_i0.id}}\" class=\"dynamic-list-element todo\"><span>{{$_i0.title}}</span></div>\n\
             {{end}}</dynamic-fragment>"
        );

        let html = &output.page("todos").unwrap().html;
        assert!(html.contains(r#"hx-trigger="load delay:20ms""#));
        assert!(html.contains(r#"hx-swap="morph:outerHTML settle:1s""#));
        assert!(html.contains("&quot;Accept-Language&quot;:&quot;de&quot;"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ISLANDS AND ACTIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_island_and_form_action() {
        let cart = Island::single("cart", "cart", |cart: DataPath| {
            el("span").child(cart.field("total"))
        });
        let add = Action::new(HttpMethod::Post, "add-to-cart").related(&cart);

        let root: Node = Switch::new("root")
            .child(
                Route::new("shop")
                    .child(&cart)
                    .child(
                        add.form()
                            .data("ProductID", 42)
                            .data("Gift", true)
                            .child(el("input").attr("name", "Quantity"))
                            .child(add.submit().child("Add")),
                    ),
            )
            .into();
        let output = build(root).await;

        assert_eq!(output.islands.len(), 1);
        let island = &output.islands[0];
        assert_eq!(island.id, "cart");
        assert_eq!(island.kind, IslandKind::Single);
        assert_eq!(island.fragment_id, output.fragments[0].content_hash);

        let html = &output.page("shop").unwrap().html;
        assert!(html.contains(r#"<div id="cart"><div hx-trigger="#));
        assert!(html.contains(concat!(
            r#"<form id="form_1">"#,
            r#"<input type="hidden" name="ProductID" value="42" />"#,
            r#"<input style="display: none;" type="checkbox" name="Gift" checked="true" />"#,
            r#"<input name="Quantity" />"#,
            r##"<button hx-include="#form_1" hx-post="/__actions/add-to-cart" hx-swap="none" "##,
            r#"hx-headers="javascript: ...__hardwire.formHeaders(&quot;shop&quot;, [&quot;cart&quot;], [])">"#,
            r#"Add</button></form>"#
        )));
    }

    #[tokio::test]
    async fn test_island_forms_do_not_depend_on_host_page() {
        let like = Action::new(HttpMethod::Post, "like");
        let cart = Island::single("cart", "cart", move |cart: DataPath| {
            el("div")
                .child(cart.field("total"))
                .child(like.quick_button().child("Like"))
        });
        let subscribe = Action::new(HttpMethod::Post, "subscribe");

        let root: Node = Switch::new("root")
            .child(
                Route::new("a")
                    .child(subscribe.quick_button().child("Subscribe"))
                    .child(&cart),
            )
            .child(Route::new("b").child(&cart))
            .into();
        let output = build(root).await;

        assert_eq!(output.fragments.len(), 1, "same island body on both pages");
        let fragment = &output.fragments[0];
        assert!(fragment
            .compiled_template_text
            .contains(r##"<form id="form_Cart_1"><button hx-include="#form_Cart_1""##));
        assert_eq!(output.islands[0].fragment_id, fragment.content_hash);

        let page_a = &output.page("a").unwrap().html;
        assert!(page_a.contains(r#"<form id="form_1">"#));
        assert!(!page_a.contains("form_2"));
    }

    #[tokio::test]
    async fn test_dynamic_hidden_input_checks_type() {
        let toggle = Action::new(HttpMethod::Patch, "toggle");
        let root: Node = Switch::new("root")
            .child(Route::dynamic("settings", "settings", move |settings: DataPath| {
                toggle
                    .quick_button()
                    .data("Enabled", settings.field("enabled"))
                    .child("Toggle")
            }))
            .into();
        let output = build(root).await;

        let html = &output.page("settings").unwrap().html;
        assert!(html.contains(
            "{{if (eq @#34T;bool@#34T; (printf @#34T;%T@#34T; .Settings.enabled))}}"
        ));
        assert!(html.contains("{{if (eq .Settings.enabled true)}}"));
        assert!(html.contains(r#"<input type="hidden" name="Enabled" value="{{.Settings.enabled}}" />"#));
        assert!(html.contains(r#"hx-patch="/__actions/toggle""#));
        assert!(!html.contains("hx-headers"), "no related islands");
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // EMIT
    // ═══════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_emit_writes_every_artifact() {
        let cart = Island::list("cart-items", "cart", |item: DataPath, _| item.field("name"));
        let root: Node = el("main")
            .child(Stylesheet::new("site", "main{}"))
            .child(
                Switch::new("root")
                    .child(Route::new("home").child("home"))
                    .child(Route::new("cart").child(&cart)),
            )
            .into();
        let output = build(root).await;

        let mut sink = MemorySink::new();
        output.emit(&mut sink).unwrap();

        let hash = &output.fragments[0].content_hash;
        let keys: Vec<&str> = sink.output.keys().map(String::as_str).collect();
        let mut expected = vec![
            "home.html".to_string(),
            "home.meta.json".to_string(),
            "cart.html".to_string(),
            "cart.meta.json".to_string(),
            format!("__dyn/{}.template.html", hash),
            format!("__dyn/{}.meta.json", hash),
            "__islands/cart-items.meta.json".to_string(),
        ];
        expected.sort();
        assert_eq!(keys, expected);

        let meta: serde_json::Value =
            serde_json::from_str(&sink.output[&format!("__dyn/{}.meta.json", hash)]).unwrap();
        assert_eq!(meta["resourceName"], "cart");
        assert_eq!(meta["hash"], hash.as_str());

        let island: serde_json::Value =
            serde_json::from_str(&sink.output["__islands/cart-items.meta.json"]).unwrap();
        assert_eq!(island["type"], "list");
        assert_eq!(island["fragmentId"], hash.as_str());

        let page: serde_json::Value = serde_json::from_str(&sink.output["home.meta.json"]).unwrap();
        assert_eq!(page, serde_json::json!({ "isDynamic": false }));

        assert_eq!(sink.static_files.len(), 1);
        let (path, contents) = sink.static_files.iter().next().unwrap();
        assert!(path.starts_with("assets/css/"));
        assert_eq!(contents, "/* site */\nmain{}");
    }
}
