use dockyard_core::{
    Application, BackendKind, BuildSettings, BuildpackKind, ConfigurationUpdate,
    DestinationBackend, SourceOrigin, SourceProvider, fingerprint,
};

fn destination() -> DestinationBackend {
    DestinationBackend {
        id: "dest-1".to_owned(),
        name: "local".to_owned(),
        kind: BackendKind::SingleHost,
        engine: "/var/run/docker.sock".to_owned(),
        network: "dockyard".to_owned(),
        proxy_managed: true,
    }
}

fn origin() -> SourceOrigin {
    SourceOrigin {
        id: "src-1".to_owned(),
        name: "github".to_owned(),
        provider: SourceProvider::GitHub,
        base_url: None,
        credential_env: None,
    }
}

fn configured_app() -> Application {
    let mut app = Application::new("app123", "shop", BuildpackKind::Node);
    app.attach_destination("dest-1");
    app.attach_source("src-1");
    app.set_repository("acme/shop", "main");
    app
}

fn update(domain: Option<&str>) -> ConfigurationUpdate {
    ConfigurationUpdate {
        settings: BuildSettings::new(BuildpackKind::Node),
        domain: domain.map(str::to_owned),
    }
}

// ── Defaults ──

#[test]
fn node_defaults_fill_port_install_and_start() {
    let s = BuildSettings::new(BuildpackKind::Node).with_defaults();

    assert_eq!(s.port, Some(3000));
    assert_eq!(s.install_command.as_deref(), Some("yarn install"));
    assert_eq!(s.build_command, None);
    assert_eq!(s.start_command.as_deref(), Some("yarn start"));
}

#[test]
fn node_defaults_keep_explicit_values() {
    let s = BuildSettings {
        buildpack: BuildpackKind::Node,
        port: Some(8080),
        install_command: Some("npm ci".to_owned()),
        build_command: Some("npm run build".to_owned()),
        start_command: Some("node dist/main.js".to_owned()),
    }
    .with_defaults();

    assert_eq!(s.port, Some(8080));
    assert_eq!(s.install_command.as_deref(), Some("npm ci"));
    assert_eq!(s.build_command.as_deref(), Some("npm run build"));
    assert_eq!(s.start_command.as_deref(), Some("node dist/main.js"));
}

#[test]
fn blank_commands_are_defaulted() {
    let mut raw = BuildSettings::new(BuildpackKind::Node);
    raw.install_command = Some(" ".to_owned());

    assert_eq!(
        raw.with_defaults().install_command.as_deref(),
        Some("yarn install")
    );
}

#[test]
fn static_defaults_install_only_with_build_command() {
    let plain = BuildSettings::new(BuildpackKind::Static).with_defaults();
    assert_eq!(plain.port, Some(80));
    assert_eq!(plain.install_command, None);
    assert_eq!(plain.start_command, None);

    let mut built = BuildSettings::new(BuildpackKind::Static);
    built.build_command = Some("yarn build".to_owned());
    let built = built.with_defaults();
    assert_eq!(built.install_command.as_deref(), Some("yarn install"));
}

// ── Configuration update ──

#[test]
fn domain_change_records_previous_domain() {
    let mut app = configured_app();
    app.update_configuration(update(Some("old.example.com")));
    assert_eq!(app.previous_domain, None);

    app.update_configuration(update(Some("app.example.com")));

    assert_eq!(app.domain.as_deref(), Some("app.example.com"));
    assert_eq!(app.previous_domain.as_deref(), Some("old.example.com"));
}

#[test]
fn pending_cleanup_survives_a_second_change() {
    let mut app = configured_app();
    app.domain = Some("a.example.com".to_owned());

    app.update_configuration(update(Some("b.example.com")));
    app.update_configuration(update(Some("c.example.com")));

    assert_eq!(app.domain.as_deref(), Some("c.example.com"));
    assert_eq!(app.previous_domain.as_deref(), Some("a.example.com"));
}

#[test]
fn switching_back_cancels_pending_cleanup() {
    let mut app = configured_app();
    app.domain = Some("a.example.com".to_owned());

    app.update_configuration(update(Some("b.example.com")));
    app.update_configuration(update(Some("a.example.com")));

    assert_eq!(app.domain.as_deref(), Some("a.example.com"));
    assert_eq!(app.previous_domain, None);
}

#[test]
fn unchanged_domain_leaves_previous_untouched() {
    let mut app = configured_app();
    app.domain = Some("a.example.com".to_owned());

    app.update_configuration(update(Some("a.example.com")));

    assert_eq!(app.previous_domain, None);
}

#[test]
fn update_does_not_touch_fingerprint() {
    let mut app = configured_app();
    app.config_hash = Some("stored".to_owned());

    let mut next = update(None);
    next.settings.port = Some(9999);
    app.update_configuration(next);

    assert_eq!(app.config_hash.as_deref(), Some("stored"));
    assert_eq!(app.settings.port, Some(9999));
}

// ── Source / repository ──

#[test]
fn switching_source_clears_repository() {
    let mut app = configured_app();

    app.attach_source("src-2");

    assert_eq!(app.source_id.as_deref(), Some("src-2"));
    assert_eq!(app.repository, None);
    assert_eq!(app.branch, None);
}

#[test]
fn reattaching_same_source_keeps_repository() {
    let mut app = configured_app();

    app.attach_source("src-1");

    assert_eq!(app.repository.as_deref(), Some("acme/shop"));
}

// ── Job preparation ──

#[test]
fn prepare_job_seeds_missing_fingerprint_from_raw_settings() {
    let mut app = configured_app();
    app.domain = Some("app.example.com".to_owned());

    let job = app.prepare_job("build-1", &destination(), &origin()).unwrap();

    let expected = fingerprint(&BuildSettings::new(BuildpackKind::Node));
    assert_eq!(app.config_hash.as_deref(), Some(expected.as_str()));
    assert_eq!(job.config_hash.as_deref(), Some(expected.as_str()));
    assert_eq!(job.build_id, "build-1");
    assert_eq!(job.application_id, "app123");
    assert_eq!(job.repository, "acme/shop");
    assert_eq!(job.branch, "main");
    assert_eq!(job.domain.as_deref(), Some("app.example.com"));
}

#[test]
fn prepare_job_keeps_existing_fingerprint() {
    let mut app = configured_app();
    app.config_hash = Some("previous".to_owned());

    let job = app.prepare_job("build-1", &destination(), &origin()).unwrap();

    assert_eq!(job.config_hash.as_deref(), Some("previous"));
}

#[test]
fn prepare_job_requires_repository() {
    let mut app = configured_app();
    app.attach_source("src-1");
    app.repository = None;

    assert!(matches!(
        app.prepare_job("b", &destination(), &origin()),
        Err(dockyard_core::Error::MissingRepository(_))
    ));
}

#[test]
fn prepare_job_requires_matching_destination() {
    let mut app = configured_app();
    let mut other = destination();
    other.id = "dest-2".to_owned();

    assert!(matches!(
        app.prepare_job("b", &other, &origin()),
        Err(dockyard_core::Error::MissingDestination(_))
    ));
}
