use ar_domain::config::{Config, ConfigSeverity};

/// Validate the config, printing any issues. Returns `false` when at least
/// one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
///
/// A plaintext `assistants.auth.key` is masked.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let mut masked = config.clone();
    if let Some(key) = masked.assistants.auth.key.as_mut() {
        *key = "****".into();
    }
    let output = toml::to_string_pretty(&masked)?;
    print!("{output}");
    Ok(())
}
