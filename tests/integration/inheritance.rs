use serde_json::json;
use tempfile::TempDir;
use templar_cli::core::TemplarError;
use templar_cli::resolver::InspectionState;
use templar_cli::session::Session;
use templar_cli::source::LocalRepositoryResolver;
use templar_cli::template::{TemplateId, WorkingCopyOptions, copy_template};
use templar_cli::test_utils::{TemplateFixture, init_test_logging};

fn base_ids(session: &templar_cli::session::Session) -> Vec<String> {
    session.bases().map(|b| b.id().to_string()).collect()
}

#[test]
fn test_chain_merges_in_resolution_order() {
    init_test_logging(None);
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("core", json!({"core_key": 3, "shared": "core"})).unwrap();
    fixture
        .template("lib", json!({"lib_key": 2, "shared": "lib", "_bases": ["core"]}))
        .unwrap();
    fixture
        .template("app", json!({"project_slug": "demo", "app_key": 1, "_bases": ["lib"]}))
        .unwrap();
    let original = fixture.definition_text("app").unwrap();

    let mut session = fixture.session("app").unwrap();
    assert!(session.prepare().unwrap());

    assert_eq!(base_ids(&session), ["core", "lib"]);
    assert_eq!(
        session.root().fields().public_keys(),
        ["core_key", "lib_key", "shared", "project_slug", "app_key"]
    );
    // lib overrides core before app inherits from lib
    assert_eq!(session.root().fields().get("shared"), Some(&json!("lib")));

    // merged definitions live in the working copy only
    let working_copy = session.working_copy_dir().unwrap().to_path_buf();
    assert_eq!(session.root().directory(), working_copy);
    assert_eq!(working_copy.file_name().unwrap(), "app");
    let written = TemplateFixture::definitions_at(&working_copy).unwrap();
    assert_eq!(&written, session.root().fields());
    assert_eq!(fixture.definition_text("app").unwrap(), original);
}

#[test]
fn test_private_work_dir_is_merged_in_place() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("core", json!({"license": "MIT"})).unwrap();
    fixture.template("app", json!({"name": "x", "_bases": ["core"]})).unwrap();
    fixture.file("app", "README.md", "readme").unwrap();
    let original = fixture.definition_text("app").unwrap();

    let scratch = TempDir::new().unwrap();
    let work_dir = scratch.path().join("app");
    copy_template(&fixture.path("app"), &work_dir, &WorkingCopyOptions::default()).unwrap();

    let mut session = Session::with_work_dir(
        &work_dir,
        Box::new(LocalRepositoryResolver::new()),
        fixture.session_options(),
    )
    .unwrap();
    assert!(session.prepare().unwrap());

    assert!(session.working_copy_dir().is_none());
    assert_eq!(session.root().directory(), work_dir);
    let written = TemplateFixture::definitions_at(&work_dir).unwrap();
    assert_eq!(written.public_keys(), ["license", "name"]);
    assert_eq!(&written, session.root().fields());
    assert!(work_dir.join("README.md").is_file());
    assert_eq!(fixture.definition_text("app").unwrap(), original);
}

#[test]
fn test_multiple_bases_keep_declaration_order() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("first", json!({"f1": 1, "f2": 2})).unwrap();
    fixture.template("second", json!({"s1": 1})).unwrap();
    fixture.template("app", json!({"name": "x", "_bases": ["first", "second"]})).unwrap();

    let mut session = fixture.session("app").unwrap();
    session.prepare().unwrap();

    assert_eq!(base_ids(&session), ["first", "second"]);
    assert_eq!(session.root().fields().public_keys(), ["f1", "f2", "s1", "name"]);
}

#[test]
fn test_child_values_and_positions_win() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("core", json!({"license": "MIT", "year": "2024"})).unwrap();
    fixture.template("app", json!({"name": "x", "license": "GPL", "_bases": ["core"]})).unwrap();

    let mut session = fixture.session("app").unwrap();
    session.prepare().unwrap();

    let fields = session.root().fields();
    assert_eq!(fields.public_keys(), ["name", "license", "year"]);
    assert_eq!(fields.get("license"), Some(&json!("GPL")));
    assert_eq!(fields.get("year"), Some(&json!("2024")));
}

#[test]
fn test_prompts_and_copy_without_render_are_combined() {
    let fixture = TemplateFixture::new().unwrap();
    fixture
        .template(
            "core",
            json!({
                "name": "core",
                "license": "MIT",
                "_copy_without_render": ["*.png", "static/*"],
                "__prompts__": {"name": "Core name", "license": "License?"}
            }),
        )
        .unwrap();
    fixture
        .template(
            "app",
            json!({
                "name": "app",
                "_copy_without_render": ["*.png"],
                "__prompts__": {"name": "Name?"},
                "_bases": ["core"]
            }),
        )
        .unwrap();

    let mut session = fixture.session("app").unwrap();
    session.prepare().unwrap();

    let fields = session.root().fields();
    assert_eq!(fields.copy_without_render().unwrap(), ["*.png", "static/*"]);
    let prompts = fields.prompts().unwrap().unwrap();
    assert_eq!(prompts.get("name"), Some(&json!("Name?")));
    assert_eq!(prompts.get("license"), Some(&json!("License?")));
}

#[test]
fn test_indirect_cycle_is_rejected() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("a", json!({"x": 1, "_bases": ["b"]})).unwrap();
    fixture.template("b", json!({"y": 1, "_bases": ["a"]})).unwrap();
    let original = fixture.definition_text("a").unwrap();

    let mut session = fixture.session("a").unwrap();
    let err = session.prepare().unwrap_err();

    match err.downcast_ref::<TemplarError>() {
        Some(TemplarError::CircularInheritance {
            chain,
        }) => assert_eq!(chain, "a → b → a"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fixture.definition_text("a").unwrap(), original);
    assert_eq!(session.resolver().state(), InspectionState::Inspecting);
    assert!(session.prepare().is_err());
}

#[test]
fn test_shared_ancestor_is_rejected() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("core", json!({"c": 1})).unwrap();
    fixture.template("left", json!({"l": 1, "_bases": ["core"]})).unwrap();
    fixture.template("right", json!({"r": 1, "_bases": ["core"]})).unwrap();
    fixture.template("app", json!({"a": 1, "_bases": ["left", "right"]})).unwrap();

    let err = fixture.session("app").unwrap().prepare().unwrap_err();
    assert_eq!(err.to_string(), "Circular inheritance detected: app → right → core");
}

#[test]
fn test_template_without_bases_is_left_alone() {
    let fixture = TemplateFixture::new().unwrap();
    let dir = fixture.template("plain", json!({"name": "x"})).unwrap();

    let mut session = fixture.session("plain").unwrap();
    assert!(!session.prepare().unwrap());

    assert!(session.working_copy_dir().is_none());
    assert_eq!(session.root().directory(), dir);
    assert_eq!(session.bases().count(), 0);
    assert!(!session.root().fields().contains_key("__prompts__"));
}

#[test]
fn test_prepare_twice_resolves_once() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("core", json!({"c": 1})).unwrap();
    fixture.template("app", json!({"a": 1, "_bases": ["core"]})).unwrap();

    let mut session = fixture.session("app").unwrap();
    assert!(session.prepare().unwrap());
    let first_copy = session.working_copy_dir().unwrap().to_path_buf();
    let fields = session.root().fields().clone();

    assert!(session.prepare().unwrap());
    assert_eq!(session.working_copy_dir().unwrap(), first_copy);
    assert_eq!(session.root().fields(), &fields);
}

#[test]
fn test_missing_base_is_reported() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("app", json!({"a": 1, "_bases": ["nowhere"]})).unwrap();

    let err = fixture.session("app").unwrap().prepare().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TemplarError>(),
        Some(TemplarError::TemplateNotFound { .. })
    ));
}

#[test]
fn test_graph_reflects_hierarchy() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("core", json!({"c": 1})).unwrap();
    fixture.template("lib", json!({"l": 1, "_bases": ["core"]})).unwrap();
    fixture.template("app", json!({"a": 1, "_bases": ["lib"]})).unwrap();

    let mut session = fixture.session("app").unwrap();
    session.prepare().unwrap();

    let graph = session.resolver().graph();
    assert_eq!(graph.direct_bases(&TemplateId::from("app")), [TemplateId::from("lib")]);
    assert_eq!(graph.transitive_bases(&TemplateId::from("app")).len(), 2);
    assert_eq!(graph.to_tree_string(&TemplateId::from("app")), "app\n└── lib\n    └── core\n");
}
