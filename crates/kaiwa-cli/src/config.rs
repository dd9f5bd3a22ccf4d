//! Configuration file loading and provider resolution.
//!
//! The CLI is the persistence collaborator for the core: it reads a TOML
//! file with one `[providers.<name>]` table per endpoint, resolves the
//! selected entry into a [`ProviderConfig`], and reports configuration
//! errors before any request is attempted.
//!
//! ```toml
//! default_provider = "openai"
//!
//! [providers.openai]
//! api_key = "sk-..."
//! model = "gpt-4o-mini"
//!
//! [providers.ark]
//! kind = "volcengine"
//! api_key = "..."
//! model = "ep-2024-..."
//! ```

use kaiwa_core::{Error, ProviderConfig, ProviderKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level config file shape.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEntry>,
}

/// One `[providers.<name>]` table.
#[derive(Debug, Deserialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub response_format: Option<String>,
}

impl FileConfig {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Parse config file contents.
    pub fn parse(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Configuration(format!("invalid config: {}", e)))
    }

    /// Resolve a provider entry to a usable [`ProviderConfig`].
    ///
    /// `name` falls back to `default_provider`; a missing selection, an
    /// unknown entry, or an entry without key/model is a configuration
    /// error.
    pub fn resolve(&self, name: Option<&str>) -> Result<ProviderConfig, Error> {
        let name = name.or(self.default_provider.as_deref()).ok_or_else(|| {
            Error::Configuration(
                "no provider selected: pass --provider or set default_provider".to_string(),
            )
        })?;

        let entry = self.providers.get(name).ok_or_else(|| {
            Error::Configuration(format!("provider '{}' not found in config", name))
        })?;

        let api_key = entry
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!("provider '{}' has no api_key", name))
            })?;
        let model = entry
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::Configuration(format!("provider '{}' has no model", name)))?;

        let mut config = ProviderConfig::new(entry.kind, api_key, model);
        if let Some(base_url) = entry.base_url.as_deref() {
            config = config.with_base_url(base_url);
        }
        if let Some(hint) = entry.response_format.as_deref() {
            config = config.with_response_format(hint);
        }
        Ok(config)
    }
}

/// Default config file path: `$KAIWA_HOME/config.toml` when set, else
/// `~/.kaiwa/config.toml`.
pub fn default_config_path() -> Result<PathBuf, Error> {
    if let Ok(home) = std::env::var("KAIWA_HOME") {
        return Ok(PathBuf::from(home).join("config.toml"));
    }
    dirs_next::home_dir()
        .map(|home| home.join(".kaiwa").join("config.toml"))
        .ok_or_else(|| Error::Configuration("cannot determine home directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default_provider = "openai"

[providers.openai]
api_key = "sk-test"
model = "gpt-4o-mini"

[providers.ark]
kind = "volcengine"
api_key = "ark-test"
model = "ep-123"
base_url = "https://ark.example.com/api/v3"
response_format = "json_object"
"#;

    #[test]
    fn resolves_default_provider() {
        let file = FileConfig::parse(SAMPLE).unwrap();
        let config = file.resolve(None).unwrap();
        assert_eq!(config.kind, ProviderKind::OpenAiCompatible);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolves_named_provider_with_overrides() {
        let file = FileConfig::parse(SAMPLE).unwrap();
        let config = file.resolve(Some("ark")).unwrap();
        assert_eq!(config.kind, ProviderKind::Volcengine);
        assert_eq!(config.base_url(), "https://ark.example.com/api/v3");
        assert_eq!(config.response_format.as_deref(), Some("json_object"));
    }

    #[test]
    fn missing_selection_is_a_configuration_error() {
        let file = FileConfig::parse("[providers.x]\napi_key = \"k\"\nmodel = \"m\"\n").unwrap();
        let err = file.resolve(None).unwrap_err();
        assert!(
            err.to_string().contains("no provider selected"),
            "got: {}",
            err
        );
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let file = FileConfig::parse(SAMPLE).unwrap();
        let err = file.resolve(Some("missing")).unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {}", err);
    }

    #[test]
    fn entry_without_key_or_model_is_rejected() {
        let file =
            FileConfig::parse("[providers.partial]\nmodel = \"m\"\n").unwrap();
        let err = file.resolve(Some("partial")).unwrap_err();
        assert!(err.to_string().contains("api_key"), "got: {}", err);

        let file =
            FileConfig::parse("[providers.partial]\napi_key = \"k\"\n").unwrap();
        let err = file.resolve(Some("partial")).unwrap_err();
        assert!(err.to_string().contains("model"), "got: {}", err);
    }

    #[test]
    fn invalid_toml_is_a_configuration_error() {
        let err = FileConfig::parse("not toml [").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "got: {:?}", err);
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.default_provider.as_deref(), Some("openai"));

        let err = FileConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"), "got: {}", err);
    }
}
