use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::domain::currency::CurrencyCode;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub intake: IntakeConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub api_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
    pub default_currency: String,
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
    pub intake_endpoint: Option<String>,
    pub intake_timeout_secs: Option<u64>,
    pub catalog_path: Option<PathBuf>,
    pub default_currency: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
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
            intake: IntakeConfig { endpoint: String::new(), timeout_secs: 15, api_token: None },
            catalog: CatalogConfig { path: None, default_currency: "USD".to_string() },
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

impl IntakeConfig {
    /// An empty endpoint means live submission is unavailable.
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty()
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("enrollo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn default_currency(&self) -> CurrencyCode {
        CurrencyCode::new(&self.catalog.default_currency)
    }

    /// The configured catalog file, or the built-in catalog when none is set.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog.path {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(intake) = patch.intake {
            if let Some(endpoint) = intake.endpoint {
                self.intake.endpoint = endpoint;
            }
            if let Some(timeout_secs) = intake.timeout_secs {
                self.intake.timeout_secs = timeout_secs;
            }
            if let Some(api_token) = intake.api_token {
                self.intake.api_token = Some(api_token.into());
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
            if let Some(default_currency) = catalog.default_currency {
                self.catalog.default_currency = default_currency;
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
        if let Some(value) = read_env("ENROLLO_INTAKE_ENDPOINT") {
            self.intake.endpoint = value;
        }
        if let Some(value) = read_env("ENROLLO_INTAKE_TIMEOUT_SECS") {
            self.intake.timeout_secs = parse_u64("ENROLLO_INTAKE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("ENROLLO_INTAKE_API_TOKEN") {
            self.intake.api_token = Some(value.into());
        }

        if let Some(value) = read_env("ENROLLO_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("ENROLLO_DEFAULT_CURRENCY") {
            self.catalog.default_currency = value;
        }

        let log_level =
            read_env("ENROLLO_LOGGING_LEVEL").or_else(|| read_env("ENROLLO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ENROLLO_LOGGING_FORMAT").or_else(|| read_env("ENROLLO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(endpoint) = overrides.intake_endpoint {
            self.intake.endpoint = endpoint;
        }
        if let Some(timeout_secs) = overrides.intake_timeout_secs {
            self.intake.timeout_secs = timeout_secs;
        }
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = Some(path);
        }
        if let Some(default_currency) = overrides.default_currency {
            self.catalog.default_currency = default_currency;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_intake(&self.intake)?;
        validate_catalog(&self.catalog)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("enrollo.toml"), PathBuf::from("config/enrollo.toml")]
        .into_iter()
        .find(|path| path.exists())
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

fn validate_intake(intake: &IntakeConfig) -> Result<(), ConfigError> {
    let endpoint = intake.endpoint.trim();
    if !endpoint.is_empty()
        && !endpoint.starts_with("http://")
        && !endpoint.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "intake.endpoint must start with http:// or https://".to_string(),
        ));
    }

    if intake.timeout_secs == 0 || intake.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "intake.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    let blank_token = intake
        .api_token
        .as_ref()
        .map(|token| token.expose_secret().trim().is_empty())
        .unwrap_or(false);
    if blank_token {
        return Err(ConfigError::Validation(
            "intake.api_token must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.default_currency.trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.default_currency must not be empty".to_string(),
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

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    intake: Option<IntakePatch>,
    catalog: Option<CatalogPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct IntakePatch {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
    default_currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
