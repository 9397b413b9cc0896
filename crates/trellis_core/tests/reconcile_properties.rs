use serde_json::json;
use trellis_core::model::attributes::Attributes;
use trellis_core::{
    AdminConfig, Document, DocumentKind, LayoutRegistry, MenuItemRegistry, Node, NodeKind,
    NodePatch, NodePath, NoDefaults, OrderedItem, OrderingReconciler, PathError, PathTree,
    ReconcileError, Submission,
};

fn path(value: &str) -> NodePath {
    NodePath::parse(value).expect("valid path")
}

fn keep(name: &str, from: &str) -> OrderedItem {
    OrderedItem::new(name, Some(path(from)))
}

fn attrs(value: serde_json::Value) -> Attributes {
    serde_json::from_value(value).expect("attribute object")
}

fn particle(subtype: &str, title: &str, attributes: serde_json::Value) -> Node {
    Node::new(NodeKind::Particle, title)
        .with_subtype(subtype)
        .with_attributes(attrs(attributes))
}

fn sample_layout() -> Document {
    let header = Node::new(NodeKind::Section, "Header").with_child(
        0,
        "grid-1",
        Node::new(NodeKind::Grid, "Grid")
            .with_child(0, "logo", particle("logo", "Logo", json!({"enabled": 1})))
            .with_child(1, "menu", particle("menu", "Menu", json!({"enabled": 1, "depth": 2}))),
    );
    let root = Node::new(NodeKind::Root, "Default")
        .with_child(0, "header", header)
        .with_child(0, "hero", particle("banner", "Hero", json!({"height": 300})))
        .with_child(0, "footer", Node::new(NodeKind::Section, "Footer"));
    let mut document = Document::from_tree(PathTree::with_root(DocumentKind::Layout, root));
    document.title = Some("Default".to_string());
    document
}

fn sorted_payloads(document: &Document) -> Vec<String> {
    let mut payloads: Vec<String> = document
        .tree
        .flatten()
        .into_iter()
        .map(|(_, node)| serde_json::to_string(&node.payload()).expect("encode payload"))
        .collect();
    payloads.sort();
    payloads
}

#[test]
fn permutation_preserves_every_payload() {
    let previous = sample_layout();
    let registry = LayoutRegistry::new(NoDefaults);

    // Hero moves into the header grid; logo and menu swap columns.
    let submission = Submission::new()
        .with_column(
            NodePath::root(),
            0,
            vec![keep("footer", "footer"), keep("header", "header")],
        )
        .with_column(path("header"), 0, vec![keep("grid-1", "header/grid-1")])
        .with_column(path("header/grid-1"), 0, vec![keep("menu", "header/grid-1/menu")])
        .with_column(
            path("header/grid-1"),
            1,
            vec![keep("logo", "header/grid-1/logo"), keep("hero", "hero")],
        );

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("permutation reconciles");

    assert_eq!(sorted_payloads(&next), sorted_payloads(&previous));
    assert!(next.tree.resolve(&path("hero")).is_none());
    assert_eq!(
        next.tree.resolve(&path("header/grid-1/hero")).map(|node| node.title.as_str()),
        Some("Hero")
    );
}

#[test]
fn snapshot_submission_is_a_no_op() {
    let previous = sample_layout();
    let config = AdminConfig::default().with_defaults("menu", attrs(json!({"depth": 1})));
    let registry = LayoutRegistry::new(config);

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &Submission::snapshot(&previous))
        .expect("snapshot reconciles");

    assert_eq!(next, previous);
}

#[test]
fn new_item_gets_exactly_the_configured_defaults() {
    let previous = sample_layout();
    let config = AdminConfig::default()
        .with_defaults("banner", attrs(json!({"enabled": 1, "height": 200})));
    let registry = LayoutRegistry::new(config);

    let mut submission = Submission::snapshot(&previous);
    submission
        .ordering
        .get_mut(&NodePath::root())
        .and_then(|columns| columns.get_mut(&0))
        .expect("root column")
        .push(OrderedItem::new("promo", None));
    let submission = submission.with_item(
        path("promo"),
        NodePatch::new().kind(NodeKind::Particle).subtype(Some("banner")),
    );

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("new item reconciles");

    let promo = next.tree.resolve(&path("promo")).expect("promo placed");
    assert_eq!(promo.attributes, attrs(json!({"enabled": 1, "height": 200})));
    assert_eq!(promo.subtype.as_deref(), Some("banner"));
    assert_eq!(promo.title, "Banner");
}

#[test]
fn submitted_beats_existing_beats_default() {
    let root = Node::new(NodeKind::Root, "Main").with_child(
        0,
        "home",
        Node::new(NodeKind::Item, "Home").with_attributes(attrs(json!({"a": 1}))),
    );
    let previous = Document::from_tree(PathTree::with_root(DocumentKind::Menu, root));
    let config = AdminConfig::default().with_defaults("item", attrs(json!({"a": 0, "b": 2})));
    let registry = MenuItemRegistry::new(config);

    let submission = Submission::new()
        .with_column(NodePath::root(), 0, vec![keep("home", "home")])
        .with_item(path("home"), NodePatch::new().attribute("a", json!(9)));

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("override reconciles");

    let home = next.tree.resolve(&path("home")).expect("home placed");
    assert_eq!(home.attributes, attrs(json!({"a": 9, "b": 2})));
}

#[test]
fn omitted_item_is_deleted() {
    let previous = sample_layout();
    let registry = LayoutRegistry::new(NoDefaults);
    let mut submission = Submission::snapshot(&previous);
    submission
        .ordering
        .insert(NodePath::root(), [(0, vec![keep("header", "header"), keep("hero", "hero")])].into());

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("deletion reconciles");

    assert!(next.tree.resolve(&path("footer")).is_none());
    assert!(next.tree.resolve(&path("hero")).is_some());
    assert!(next.tree.resolve(&path("header/grid-1/menu")).is_some());
}

#[test]
fn column_grouping_survives_flatten_and_rebuild() {
    let root = Node::new(NodeKind::Root, "Main").with_child(
        0,
        "shop",
        Node::new(NodeKind::Item, "Shop")
            .with_child(0, "a", Node::new(NodeKind::Item, "A"))
            .with_child(0, "b", Node::new(NodeKind::Item, "B"))
            .with_child(1, "c", Node::new(NodeKind::Item, "C")),
    );
    let previous = Document::from_tree(PathTree::with_root(DocumentKind::Menu, root));
    let registry = MenuItemRegistry::new(NoDefaults);

    let submission = Submission::from_values(
        json!({
            "": {"0": [{"name": "shop", "provenancePath": "shop"}]},
            "shop": {
                "0": [
                    {"name": "a", "provenancePath": "shop/a"},
                    {"name": "b", "provenancePath": "shop/b"}
                ],
                "1": [{"name": "c", "provenancePath": "shop/c"}]
            }
        }),
        json!({}),
        None,
    )
    .expect("well-formed submission");

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("grouping reconciles");

    let shop = next.tree.resolve(&path("shop")).expect("shop placed");
    let columns: Vec<(usize, Vec<&str>)> = shop
        .children
        .iter()
        .map(|(column, children)| {
            (*column, children.iter().map(|child| child.name.as_str()).collect())
        })
        .collect();
    assert_eq!(columns, vec![(0, vec!["a", "b"]), (1, vec!["c"])]);
    assert_eq!(next.tree.column_of(&path("shop/c")), Some(1));
    assert_eq!(next, previous);
}

#[test]
fn moving_hero_into_root_column_one_keeps_it_intact() {
    let root = Node::new(NodeKind::Root, "Default").with_child(
        0,
        "hero",
        Node::new(NodeKind::Particle, "Hero").with_subtype("banner"),
    );
    let previous = Document::from_tree(PathTree::with_root(DocumentKind::Layout, root));
    let registry = LayoutRegistry::new(NoDefaults);

    let submission = Submission::from_json(
        r#"{"": {"1": [{"name": "hero", "provenancePath": "hero"}]}}"#,
        "{}",
        None,
    )
    .expect("well-formed submission");

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("move reconciles");

    let original = previous.tree.resolve(&path("hero")).expect("original hero");
    assert_eq!(next.tree.resolve(&path("hero")), Some(original));
    assert_eq!(next.tree.resolve_in_column(&path("hero"), 1), Some(original));
    assert_eq!(next.tree.resolve_in_column(&path("hero"), 0), None);
    assert_eq!(next.tree.column_of(&path("hero")), Some(1));
}

#[test]
fn duplicate_provenance_is_rejected_without_touching_previous() {
    let previous = sample_layout();
    let before = previous.clone();
    let registry = LayoutRegistry::new(NoDefaults);
    let submission = Submission::new().with_column(
        NodePath::root(),
        0,
        vec![keep("hero", "hero"), keep("hero-copy", "hero")],
    );

    let err = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect_err("duplicate provenance must fail");

    assert!(matches!(err, ReconcileError::DuplicateProvenance(p) if p == path("hero")));
    assert_eq!(previous, before);
}

#[test]
fn payload_for_unplaced_path_is_rejected() {
    let previous = sample_layout();
    let registry = LayoutRegistry::new(NoDefaults);
    let submission = Submission::snapshot(&previous)
        .with_item(path("nowhere"), NodePatch::new().title("Lost"));

    let err = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect_err("unplaced payload must fail");

    assert!(matches!(err, ReconcileError::UnplacedPayload(p) if p == path("nowhere")));
}

#[test]
fn layout_rejects_new_item_without_type() {
    let previous = sample_layout();
    let registry = LayoutRegistry::new(NoDefaults);
    let submission = Submission::new().with_column(
        NodePath::root(),
        0,
        vec![OrderedItem::new("mystery", None)],
    );

    let err = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect_err("typeless new layout node must fail");

    assert!(matches!(err, ReconcileError::Node { path: p, .. } if p == path("mystery")));
}

#[test]
fn settings_are_replaced_not_merged() {
    let mut previous = sample_layout();
    previous.settings = attrs(json!({"theme": "dark", "width": 1200}));
    let registry = LayoutRegistry::new(NoDefaults);
    let submission = Submission::snapshot(&previous).with_settings(attrs(json!({"width": 960})));

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("settings reconcile");

    assert_eq!(next.settings, attrs(json!({"width": 960})));
    assert_eq!(next.title.as_deref(), Some("Default"));
}

#[test]
fn menu_registry_cannot_reconcile_a_layout() {
    let previous = sample_layout();
    let registry = MenuItemRegistry::new(NoDefaults);

    let err = OrderingReconciler::new(&registry)
        .reconcile(&previous, &Submission::snapshot(&previous))
        .expect_err("flavor mismatch must fail");

    assert!(matches!(
        err,
        ReconcileError::FlavorMismatch {
            expected: DocumentKind::Menu,
            actual: DocumentKind::Layout
        }
    ));
}

#[test]
fn padded_names_and_item_keys_are_rejected_before_reconciling() {
    let padded_name = Submission::from_json(
        r#"{"": {"0": [{"name": " hero", "provenancePath": "hero"}]}}"#,
        "{}",
        None,
    )
    .expect_err("padded child name must fail");
    assert!(matches!(
        padded_name,
        ReconcileError::InvalidPath(PathError::InvalidSegment(name)) if name == " hero"
    ));

    let padded_key = Submission::from_json(
        r#"{"": {"0": [{"name": "hero", "provenancePath": "hero"}]}}"#,
        r#"{" hero": {"title": "Hero"}}"#,
        None,
    )
    .expect_err("padded item key must fail");
    assert!(matches!(
        padded_key,
        ReconcileError::InvalidPath(PathError::InvalidSegment(_))
    ));
}

#[test]
fn block_options_follow_the_item_through_a_move() {
    let root = Node::new(NodeKind::Root, "Default")
        .with_child(
            0,
            "hero",
            particle("banner", "Hero", json!({})).with_block(attrs(json!({"size": 50}))),
        )
        .with_child(0, "main", Node::new(NodeKind::Section, "Main"));
    let previous = Document::from_tree(PathTree::with_root(DocumentKind::Layout, root));
    let registry = LayoutRegistry::new(NoDefaults);

    let submission = Submission::new()
        .with_column(NodePath::root(), 0, vec![keep("main", "main")])
        .with_column(path("main"), 0, vec![keep("hero", "hero")]);

    let next = OrderingReconciler::new(&registry)
        .reconcile(&previous, &submission)
        .expect("move reconciles");

    let hero = next.tree.resolve(&path("main/hero")).expect("hero moved");
    assert_eq!(hero.block, Some(attrs(json!({"size": 50}))));
}
