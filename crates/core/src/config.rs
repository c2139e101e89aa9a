use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{level_intent_name, BUILTIN_RIVERS, UNKNOWN_ENTITY_NAME};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub skill: SkillConfig,
    pub rivers: Vec<RiverConfig>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct SkillConfig {
    pub help_message: Option<String>,
    pub stop_message: Option<String>,
    pub end_session_after_reading: bool,
    pub apologize_on_remote_failure: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiverConfig {
    pub name: String,
    pub external_id: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub provider_base_url: Option<String>,
    pub log_level: Option<String>,
    pub end_session_after_reading: Option<bool>,
    pub apologize_on_remote_failure: Option<bool>,
    pub server_port: Option<u16>,
    pub extra_rivers: Vec<RiverConfig>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig { base_url: String::new() },
            skill: SkillConfig {
                help_message: None,
                stop_message: None,
                end_session_after_reading: false,
                apologize_on_remote_failure: false,
            },
            rivers: Vec::new(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("riverlevels.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(provider) = patch.provider {
            if let Some(base_url) = provider.base_url {
                self.provider.base_url = base_url;
            }
        }

        if let Some(skill) = patch.skill {
            if let Some(help_message) = skill.help_message {
                self.skill.help_message = Some(help_message);
            }
            if let Some(stop_message) = skill.stop_message {
                self.skill.stop_message = Some(stop_message);
            }
            if let Some(end_session) = skill.end_session_after_reading {
                self.skill.end_session_after_reading = end_session;
            }
            if let Some(apologize) = skill.apologize_on_remote_failure {
                self.skill.apologize_on_remote_failure = apologize;
            }
        }

        if let Some(rivers) = patch.rivers {
            self.rivers.extend(rivers);
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RIVERLEVELS_PROVIDER_BASE_URL") {
            self.provider.base_url = value;
        }

        if let Some(value) = read_env("RIVERLEVELS_SKILL_HELP_MESSAGE") {
            self.skill.help_message = Some(value);
        }
        if let Some(value) = read_env("RIVERLEVELS_SKILL_STOP_MESSAGE") {
            self.skill.stop_message = Some(value);
        }
        if let Some(value) = read_env("RIVERLEVELS_SKILL_END_SESSION_AFTER_READING") {
            self.skill.end_session_after_reading =
                parse_bool("RIVERLEVELS_SKILL_END_SESSION_AFTER_READING", &value)?;
        }
        if let Some(value) = read_env("RIVERLEVELS_SKILL_APOLOGIZE_ON_REMOTE_FAILURE") {
            self.skill.apologize_on_remote_failure =
                parse_bool("RIVERLEVELS_SKILL_APOLOGIZE_ON_REMOTE_FAILURE", &value)?;
        }

        if let Some(value) = read_env("RIVERLEVELS_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("RIVERLEVELS_SERVER_PORT") {
            self.server.port = parse_u16("RIVERLEVELS_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("RIVERLEVELS_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("RIVERLEVELS_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("RIVERLEVELS_LOGGING_LEVEL").or_else(|| read_env("RIVERLEVELS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RIVERLEVELS_LOGGING_FORMAT").or_else(|| read_env("RIVERLEVELS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.provider_base_url {
            self.provider.base_url = base_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(end_session) = overrides.end_session_after_reading {
            self.skill.end_session_after_reading = end_session;
        }
        if let Some(apologize) = overrides.apologize_on_remote_failure {
            self.skill.apologize_on_remote_failure = apologize;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        self.rivers.extend(overrides.extra_rivers);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_provider(&self.provider)?;
        validate_skill(&self.skill)?;
        validate_rivers(&self.rivers)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("riverlevels.toml"), PathBuf::from("config/riverlevels.toml")]
        .into_iter()
        .find(|path| path.exists())
}

/// Returns the config file `AppConfig::load` would read, if any.
pub fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    resolve_config_path(explicit_path)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_provider(provider: &ProviderConfig) -> Result<(), ConfigError> {
    let base_url = provider.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::Validation(
            "provider.base_url is required. Set it in riverlevels.toml or via RIVERLEVELS_PROVIDER_BASE_URL"
                .to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "provider.base_url must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

fn validate_skill(skill: &SkillConfig) -> Result<(), ConfigError> {
    let blank = |value: &Option<String>| value.as_deref().is_some_and(|v| v.trim().is_empty());
    if blank(&skill.help_message) {
        return Err(ConfigError::Validation("skill.help_message must not be blank".to_string()));
    }
    if blank(&skill.stop_message) {
        return Err(ConfigError::Validation("skill.stop_message must not be blank".to_string()));
    }
    Ok(())
}

fn validate_rivers(rivers: &[RiverConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    let mut intents: HashMap<String, &str> = BUILTIN_RIVERS
        .iter()
        .map(|(name, _)| (level_intent_name(name), *name))
        .collect();

    for river in rivers {
        if river.name.trim().is_empty() {
            return Err(ConfigError::Validation("rivers[].name must not be empty".to_string()));
        }
        if river.name == UNKNOWN_ENTITY_NAME {
            return Err(ConfigError::Validation(format!(
                "rivers[].name `{UNKNOWN_ENTITY_NAME}` is reserved for failed lookups"
            )));
        }
        validate_external_id(river)?;
        if !seen.insert(river.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "river `{}` is configured more than once",
                river.name
            )));
        }

        let intent = level_intent_name(&river.name);
        if let Some(owner) = intents.insert(intent.clone(), river.name.as_str()) {
            if owner != river.name {
                return Err(ConfigError::Validation(format!(
                    "rivers `{owner}` and `{}` both map to intent `{intent}`",
                    river.name
                )));
            }
        }
    }
    Ok(())
}

/// External ids become a single path segment of the provider URL.
fn validate_external_id(river: &RiverConfig) -> Result<(), ConfigError> {
    let id = &river.external_id;
    if id.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "rivers[].external_id is required for river `{}`",
            river.name
        )));
    }
    let unsupported = |c: &char| c.is_whitespace() || c.is_control() || "/?#%".contains(*c);
    if let Some(bad) = id.chars().find(unsupported) {
        return Err(ConfigError::Validation(format!(
            "rivers[].external_id for river `{}` contains unsupported character {bad:?}",
            river.name
        )));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    provider: Option<ProviderPatch>,
    skill: Option<SkillPatch>,
    rivers: Option<Vec<RiverConfig>>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderPatch {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SkillPatch {
    help_message: Option<String>,
    stop_message: Option<String>,
    end_session_after_reading: Option<bool>,
    apologize_on_remote_failure: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
