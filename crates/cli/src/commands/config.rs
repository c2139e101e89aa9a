use std::env;
use std::fs;
use std::path::Path;

use riverlevels_core::config::{detect_config_path, AppConfig, LoadOptions};
use riverlevels_core::LocaleCatalog;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, String, Option<&str>); 10] = [
        (
            "provider.base_url",
            config.provider.base_url.clone(),
            Some("RIVERLEVELS_PROVIDER_BASE_URL"),
        ),
        (
            "skill.help_message",
            or_builtin(config.skill.help_message.as_deref()),
            Some("RIVERLEVELS_SKILL_HELP_MESSAGE"),
        ),
        (
            "skill.stop_message",
            or_builtin(config.skill.stop_message.as_deref()),
            Some("RIVERLEVELS_SKILL_STOP_MESSAGE"),
        ),
        (
            "skill.end_session_after_reading",
            config.skill.end_session_after_reading.to_string(),
            Some("RIVERLEVELS_SKILL_END_SESSION_AFTER_READING"),
        ),
        (
            "skill.apologize_on_remote_failure",
            config.skill.apologize_on_remote_failure.to_string(),
            Some("RIVERLEVELS_SKILL_APOLOGIZE_ON_REMOTE_FAILURE"),
        ),
        ("rivers", rivers_summary(&config), None),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            Some("RIVERLEVELS_SERVER_BIND_ADDRESS"),
        ),
        ("server.port", config.server.port.to_string(), Some("RIVERLEVELS_SERVER_PORT")),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            Some("RIVERLEVELS_SERVER_GRACEFUL_SHUTDOWN_SECS"),
        ),
        ("logging.level", config.logging.level.clone(), Some("RIVERLEVELS_LOGGING_LEVEL")),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in fields {
        lines.push(render_line(
            key,
            &value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        field_source(
            "logging.format",
            Some("RIVERLEVELS_LOGGING_FORMAT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn or_builtin(value: Option<&str>) -> String {
    value.map(str::to_owned).unwrap_or_else(|| "<built-in>".to_string())
}

fn rivers_summary(config: &AppConfig) -> String {
    let catalog = LocaleCatalog::from_config(config);
    let names: Vec<&str> =
        catalog.active_locale().entities().iter().map(|entity| entity.name.as_str()).collect();
    format!("[{}]", names.join(", "))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
