use ar_domain::config::{Config, ConfigSeverity};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn default_config_is_valid() {
    let issues = Config::default().validate();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn callback_tls_verification_is_on_by_default() {
    let config: Config = toml::from_str("").unwrap();
    assert!(config.callback.verify_tls);
    assert_eq!(config.callback.timeout_secs, 30);
}

#[test]
fn disabling_tls_verification_is_a_warning() {
    let toml_str = r#"
[callback]
verify_tls = false
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
    assert_eq!(issues[0].field, "callback.verify_tls");
}

#[test]
fn missing_key_source_is_an_error() {
    let toml_str = r#"
[assistants.auth]
env = ""
"#;
    let mut config: Config = toml::from_str(toml_str).unwrap();
    config.assistants.auth.env = None;
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Error && i.field == "assistants.auth"));
}

#[test]
fn unbounded_run_timeout_is_flagged() {
    let toml_str = r#"
[assistants]
run_timeout_secs = 0
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "assistants.run_timeout_secs" && i.severity == ConfigSeverity::Warning));
}

#[test]
fn cors_config_parses_custom_origins() {
    let toml_str = r#"
[server.cors]
allowed_origins = ["https://myapp.com", "http://localhost:3000"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.cors.allowed_origins.len(), 2);
    assert!(config.server.cors.allowed_origins.contains(&"https://myapp.com".to_string()));
}

#[test]
fn zero_port_is_rejected() {
    let toml_str = r#"
[server]
port = 0
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues.iter().any(|i| i.field == "server.port"));
}
