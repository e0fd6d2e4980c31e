use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use templar_cli::fields::FieldValues;
use templar_cli::installer::ExpansionStage;
use templar_cli::pipeline::{GenerationOptions, GenerationPipeline, GenerationRequest};
use templar_cli::replay::{load_replay, replay_path};
use templar_cli::session::Session;
use templar_cli::template::TemplateId;
use templar_cli::test_utils::{RecordingPipeline, TemplateFixture, init_test_logging};

/// `app` extends `core`; both write a README, only `core` writes a LICENSE.
fn hierarchy() -> TemplateFixture {
    let fixture = TemplateFixture::new().unwrap();
    fixture
        .template(
            "core",
            json!({
                "project_slug": "core-project",
                "license": "MIT",
                "_extensions": ["jinja2_time.TimeExtension"]
            }),
        )
        .unwrap();
    fixture.file("core", "README.md", "core readme").unwrap();
    fixture.file("core", "LICENSE", "MIT license").unwrap();
    fixture.file("core", "templates/base.html", "{% block body %}{% endblock %}").unwrap();

    fixture
        .template(
            "app",
            json!({
                "project_slug": "demo",
                "name": "App",
                "_bases": ["core"]
            }),
        )
        .unwrap();
    fixture.file("app", "README.md", "app readme").unwrap();
    fixture
}

fn generate_root(
    pipeline: &RecordingPipeline,
    session: &mut Session,
    template_dir: &Path,
    output_dir: &Path,
    options: GenerationOptions,
) -> PathBuf {
    let request = GenerationRequest {
        template_dir: template_dir.to_path_buf(),
        prefilled: FieldValues::new(),
        output_dir: output_dir.to_path_buf(),
        options,
    };
    pipeline.generate(&request, session).unwrap()
}

#[test]
fn test_bases_are_generated_before_the_root() {
    init_test_logging(None);
    let fixture = hierarchy();
    let output = TempDir::new().unwrap();
    let pipeline = RecordingPipeline::new();
    let mut session = fixture.session("app").unwrap();

    let project = generate_root(
        &pipeline,
        &mut session,
        &fixture.path("app"),
        output.path(),
        GenerationOptions::default(),
    );

    assert_eq!(project, output.path().join("demo"));
    assert_eq!(pipeline.requested_templates(), [fixture.path("app"), fixture.path("core")]);
    // the base finishes first, into the root's project directory
    assert_eq!(pipeline.generated(), [project.clone(), project.clone()]);

    // root files overwrite base files, base-only files survive
    assert_eq!(fs::read_to_string(project.join("README.md")).unwrap(), "app readme");
    assert_eq!(fs::read_to_string(project.join("LICENSE")).unwrap(), "MIT license");

    assert_eq!(session.expansion().stage(), ExpansionStage::Installed);
    assert_eq!(session.expansion().current(), &TemplateId::from("app"));
    // root pre_generate plus the nested one of the base
    assert_eq!(session.expansion().install_calls(), 2);
}

#[test]
fn test_base_request_carries_public_answers() {
    let fixture = hierarchy();
    let output = TempDir::new().unwrap();
    let pipeline = RecordingPipeline::new();
    let mut session = fixture.session("app").unwrap();

    generate_root(
        &pipeline,
        &mut session,
        &fixture.path("app"),
        output.path(),
        GenerationOptions::default(),
    );

    let requests = pipeline.requests();
    let base_request = &requests[1];
    assert_eq!(base_request.options, GenerationOptions::for_base());
    assert_eq!(base_request.output_dir, output.path());
    assert!(base_request.prefilled.keys().all(|key| !key.starts_with('_')));
    // merged definitions order: base fields first
    let keys: Vec<&str> = base_request.prefilled.keys().map(String::as_str).collect();
    assert_eq!(keys, ["project_slug", "license", "name"]);
    assert_eq!(base_request.prefilled.get("project_slug"), Some(&json!("demo")));
}

#[test]
fn test_replay_is_saved_for_the_root_project() {
    let fixture = hierarchy();
    let output = TempDir::new().unwrap();
    let pipeline = RecordingPipeline::new();
    let mut session = fixture.session("app").unwrap();

    let project = generate_root(
        &pipeline,
        &mut session,
        &fixture.path("app"),
        output.path(),
        GenerationOptions::default(),
    );

    let answers = load_replay(&project).unwrap();
    assert_eq!(answers.get("name"), Some(&json!("App")));
    assert_eq!(answers.get("license"), Some(&json!("MIT")));
    assert_eq!(answers.get("_bases"), Some(&json!(["core"])));
}

#[test]
fn test_replay_can_be_disabled() {
    let fixture = hierarchy();
    let output = TempDir::new().unwrap();
    let pipeline = RecordingPipeline::new();
    let mut options = fixture.session_options();
    options.save_replay = false;
    let mut session = Session::new(
        &fixture.path("app"),
        Box::new(templar_cli::source::LocalRepositoryResolver::new()),
        options,
    )
    .unwrap();

    let project = generate_root(
        &pipeline,
        &mut session,
        &fixture.path("app"),
        output.path(),
        GenerationOptions::default(),
    );
    assert!(!replay_path(&project).exists());
}

#[test]
fn test_root_environment_inherits_from_bases() {
    let fixture = hierarchy();
    let output = TempDir::new().unwrap();
    let pipeline = RecordingPipeline::new();
    let mut session = fixture.session("app").unwrap();

    generate_root(
        &pipeline,
        &mut session,
        &fixture.path("app"),
        output.path(),
        GenerationOptions::default(),
    );

    let environment = session.environment_of(&TemplateId::from("app")).unwrap();
    assert!(environment.search_paths.contains(&fixture.path("core").join("templates")));
    assert_eq!(environment.extensions, ["jinja2_time.TimeExtension"]);

    // the root was rendered from its working copy with that environment
    let environments = pipeline.environments();
    let (root_dir, root_environment) = environments.last().unwrap();
    assert_eq!(Some(root_dir.as_path()), session.working_copy_dir());
    assert_eq!(root_environment, environment);
}

#[test]
fn test_second_generation_does_not_expand_bases_again() {
    let fixture = hierarchy();
    let output = TempDir::new().unwrap();
    let pipeline = RecordingPipeline::new();
    let mut session = fixture.session("app").unwrap();

    generate_root(
        &pipeline,
        &mut session,
        &fixture.path("app"),
        output.path(),
        GenerationOptions::default(),
    );
    let overwrite = GenerationOptions {
        overwrite_if_exists: true,
        ..GenerationOptions::default()
    };
    generate_root(&pipeline, &mut session, &fixture.path("app"), output.path(), overwrite);

    assert_eq!(
        pipeline.requested_templates(),
        [fixture.path("app"), fixture.path("core"), fixture.path("app")]
    );
    assert_eq!(session.expansion().install_calls(), 3);
}

#[test]
fn test_template_without_bases_generates_alone() {
    let fixture = TemplateFixture::new().unwrap();
    fixture.template("plain", json!({"project_slug": "solo"})).unwrap();
    fixture.file("plain", "main.py", "print('hi')").unwrap();
    let output = TempDir::new().unwrap();
    let pipeline = RecordingPipeline::new();
    let mut session = fixture.session("plain").unwrap();

    let project = generate_root(
        &pipeline,
        &mut session,
        &fixture.path("plain"),
        output.path(),
        GenerationOptions::default(),
    );

    assert_eq!(pipeline.requested_templates(), [fixture.path("plain")]);
    assert!(project.join("main.py").is_file());
    assert!(!project.join("cookiecutter.json").exists());
    assert_eq!(session.expansion().stage(), ExpansionStage::Pending);
    assert!(replay_path(&project).is_file());
}
