use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_point_at_the_hosted_stack() {
    let settings = Settings::defaults().expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.cms.mode, CmsMode::Contentstack);
    assert_eq!(settings.cms.api_host, "api.contentstack.io");
    assert_eq!(settings.cms.cdn_host, "cdn.contentstack.io");
    assert_eq!(settings.cms.environment, "production");
    assert_eq!(settings.cms.locale, "en-us");
    assert!(settings.cms.api_key.is_none());
    assert_eq!(settings.setup.poll_attempts, 5);
    assert_eq!(settings.setup.poll_interval, Duration::from_secs(1));
    assert_eq!(settings.setup.recent_window, Duration::from_secs(30));
    assert_eq!(settings.provisioning.entry_delay, Duration::from_millis(1_000));
    assert_eq!(settings.provisioning.publish_delay, Duration::from_millis(500));
    assert!(settings.provisioning.auto);
    assert_eq!(
        settings.uploads.max_request_bytes.get(),
        DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES
    );
    assert_eq!(
        settings.uploads.max_avatar_bytes.get(),
        DEFAULT_AVATAR_LIMIT_BYTES
    );
    assert_eq!(settings.cache.home_ttl, Duration::from_secs(30));
}

#[test]
fn cms_overrides_replace_file_values() {
    let mut raw = RawSettings::default();
    raw.cms.api_key = Some("from-file".to_string());
    raw.cms.environment = Some("staging".to_string());

    let overrides = CmsOverrides {
        mode: Some(CmsModeArg::Memory),
        api_key: Some("from-cli".to_string()),
        ..Default::default()
    };

    raw.apply_cms_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cms.mode, CmsMode::Memory);
    assert_eq!(settings.cms.api_key.as_deref(), Some("from-cli"));
    assert_eq!(settings.cms.environment, "staging");
}

#[test]
fn blank_credentials_count_as_missing() {
    let mut raw = RawSettings::default();
    raw.cms.delivery_token = Some("   ".to_string());
    raw.cms.environment = Some("".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.cms.delivery_token.is_none());
    assert_eq!(settings.cms.environment, "production");
}

#[test]
fn debug_output_redacts_tokens() {
    let mut raw = RawSettings::default();
    raw.cms.management_token = Some("cs-secret-token".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let rendered = format!("{:?}", settings.cms);
    assert!(!rendered.contains("cs-secret-token"));
    assert!(rendered.contains("<set>"));
}

#[test]
fn unknown_cms_mode_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cms.mode = Some("wordpress".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid mode");
    assert!(matches!(err, LoadError::Invalid { key: "cms.mode", .. }));
}

#[test]
fn avatar_limit_cannot_exceed_request_limit() {
    let mut raw = RawSettings::default();
    raw.uploads.max_request_bytes = Some(1024);
    raw.uploads.max_avatar_bytes = Some(2048);

    let err = Settings::from_raw(raw).expect_err("avatar limit too large");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "uploads.max_avatar_bytes",
            ..
        }
    ));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero port");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["folio"]);
    assert!(args.command.is_none());
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "folio",
        "serve",
        "--server-port",
        "8080",
        "--provisioning-auto",
        "false",
    ]);

    match args.command {
        Some(Command::Serve(serve)) => {
            assert_eq!(serve.overrides.server_port, Some(8080));
            assert_eq!(serve.overrides.provisioning_auto, Some(false));
        }
        other => panic!("expected serve command, got {other:?}"),
    }
}

#[test]
fn cms_flags_apply_to_every_subcommand() {
    let args = CliArgs::parse_from(["folio", "provision", "--cms-mode", "memory"]);

    assert!(matches!(args.command, Some(Command::Provision)));
    assert_eq!(args.cms.mode, Some(CmsModeArg::Memory));
}

#[test]
fn config_file_layers_under_cli_flags() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("folio.toml");
    std::fs::write(
        &path,
        r#"
[server]
port = 4100

[cms]
mode = "contentstack"
environment = "staging"

[setup]
poll_attempts = 2

[cache]
home_ttl_seconds = 0
"#,
    )
    .expect("write config");

    let path_arg = path.to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "folio",
        "--config-file",
        path_arg.as_str(),
        "--cms-mode",
        "memory",
        "serve",
        "--server-port",
        "4200",
    ]);
    let settings = load(&args).expect("settings");

    assert_eq!(settings.server.addr.port(), 4200);
    assert_eq!(settings.cms.mode, CmsMode::Memory);
    assert_eq!(settings.cms.environment, "staging");
    assert_eq!(settings.setup.poll_attempts, 2);
    assert!(settings.cache.home_ttl.is_zero());
}
