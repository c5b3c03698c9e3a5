//! Configuration loading from `.qembed.toml`.
//!
//! The file is optional. Command-line flags and environment variables
//! override it, and it overrides the built-in defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [remote]
//! url = "http://localhost:11434"
//! model = "qwen3-embedding:0.6b"
//!
//! [output]
//! format = "json"
//! color = false
//! ```

use serde::Deserialize;
use std::path::Path;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = ".qembed.toml";

/// Root configuration structure loaded from `.qembed.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct QembedConfig {
    /// Remote service settings.
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Which service to talk to and which model to use on it.
#[derive(Debug, Deserialize, Default)]
pub struct RemoteSettings {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}

/// Output formatting preferences.
///
/// Distinct from the runtime `OutputConfig` in the output module, which
/// handles actual rendering.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Valid values: `table`, `json`.
    #[serde(default)]
    pub format: Option<String>,

    /// Defaults to `true` when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

impl QembedConfig {
    /// Load `.qembed.toml` from `root`, or defaults if it is missing.
    ///
    /// Read and parse errors are logged as warnings and fall back to defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    pub fn url(&self) -> Option<&str> {
        self.remote.url.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.remote.model.as_deref()
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = QembedConfig::default();
        assert!(config.url().is_none());
        assert!(config.model().is_none());
        assert!(config.default_format().is_none());
        assert!(config.use_color().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[remote]
url = "http://localhost:11434"
model = "qwen3-embedding:0.6b"

[output]
format = "json"
color = false
"#;
        let config: QembedConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.url(), Some("http://localhost:11434"));
        assert_eq!(config.model(), Some("qwen3-embedding:0.6b"));
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
    }

    #[test]
    fn test_partial_config() {
        let config: QembedConfig = toml::from_str("[output]\ncolor = true\n").unwrap();
        assert!(config.url().is_none());
        assert_eq!(config.use_color(), Some(true));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[remote]\nurl = \"http://gpu-box:11434\"\n",
        )
        .unwrap();

        let config = QembedConfig::load(dir.path());
        assert_eq!(config.url(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn test_load_missing_or_malformed_falls_back() {
        let dir = TempDir::new().unwrap();
        assert!(QembedConfig::load(dir.path()).url().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "[remote\nurl = ").unwrap();
        assert!(QembedConfig::load(dir.path()).url().is_none());
    }
}
