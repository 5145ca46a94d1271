use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let endpoint =
        if config.intake.is_configured() { config.intake.endpoint.as_str() } else { "<unset>" };
    lines.push(render_line(
        "intake.endpoint",
        endpoint,
        source("intake.endpoint", &["ENROLLO_INTAKE_ENDPOINT"]),
    ));
    lines.push(render_line(
        "intake.timeout_secs",
        &config.intake.timeout_secs.to_string(),
        source("intake.timeout_secs", &["ENROLLO_INTAKE_TIMEOUT_SECS"]),
    ));
    let api_token = config
        .intake
        .api_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "intake.api_token",
        &api_token,
        source("intake.api_token", &["ENROLLO_INTAKE_API_TOKEN"]),
    ));

    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<builtin>".to_string());
    lines.push(render_line(
        "catalog.path",
        &catalog_path,
        source("catalog.path", &["ENROLLO_CATALOG_PATH"]),
    ));
    lines.push(render_line(
        "catalog.default_currency",
        &config.catalog.default_currency,
        source("catalog.default_currency", &["ENROLLO_DEFAULT_CURRENCY"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["ENROLLO_LOGGING_LEVEL", "ENROLLO_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["ENROLLO_LOGGING_FORMAT", "ENROLLO_LOG_FORMAT"]),
    ));

    CommandResult::success("config", lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("enrollo.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/enrollo.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
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

/// Keeps a short recognizable prefix (`tok-***`) when the token has one.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once(['-', '_']) {
        Some((prefix, _)) if prefix.len() <= 8 => format!("{prefix}-***"),
        _ => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn tokens_are_redacted_to_prefix_or_placeholder() {
        assert_eq!(redact_token("tok-live-8f2a"), "tok-***");
        assert_eq!(redact_token("8f2a91c0d"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }
}
