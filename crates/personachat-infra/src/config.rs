//! Configuration loading for personachat.
//!
//! Reads `config.toml` from the data directory (`~/.personachat/` in
//! production) and the environment. Everything here runs once at startup;
//! the resulting values are passed explicitly to the services.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use personachat_types::config::GlobalConfig;
use personachat_types::persona::{GLOBAL_INSTRUCTION_VARS, Persona, PersonaConfig};

/// Environment variable holding the completion engine API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PERSONACHAT_DATA_DIR` environment variable
/// 2. `~/.personachat`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PERSONACHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".personachat");
    }

    // Last resort: current directory
    PathBuf::from(".personachat")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Build the persona table from the process environment and `[personas]`.
pub fn build_persona_config(config: &GlobalConfig) -> PersonaConfig {
    build_persona_config_with(config, |name| std::env::var(name).ok())
}

/// Same as [`build_persona_config`] with an injectable variable lookup.
///
/// Override keys may be a bot id or a slug; unknown keys are skipped with a
/// warning.
pub fn build_persona_config_with(
    config: &GlobalConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PersonaConfig {
    let values: Vec<Option<String>> = GLOBAL_INSTRUCTION_VARS.into_iter().map(&lookup).collect();
    let global = PersonaConfig::join_global_parts(values.iter().map(|v| v.as_deref()));

    let mut overrides = BTreeMap::new();
    for (key, text) in &config.personas {
        match key.parse::<Persona>() {
            Ok(persona) => {
                overrides.insert(persona, text.clone());
            }
            Err(err) => tracing::warn!("Ignoring persona override: {err}"),
        }
    }

    PersonaConfig::new(global, overrides)
}

/// The completion engine API key, if set and non-empty.
pub fn load_api_key() -> Option<SecretString> {
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}
