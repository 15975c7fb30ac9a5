//! Configuration for zmd.
//!
//! Two layers:
//!
//! - [`instance`]: the per-widget attribute surface ([`Attributes`]) and the
//!   [`InstanceConfig`] snapshot read from it at each render
//! - [`Config`]: the `zmd.toml` file used by the command-line adapter, with
//!   auto-discovery in parent directories
//!
//! CLI settings can be applied during load via [`CliSettings`].

pub mod instance;

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use instance::{Attributes, InstanceConfig};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the directory local sources are resolved against.
    pub base_dir: Option<PathBuf>,
    /// Override stylesheet URLs.
    pub css_urls: Option<Vec<String>>,
    /// Override flat-insertion mode.
    pub no_shadow: Option<bool>,
    /// Override script preloading.
    pub preload_scripts: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "zmd.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attribute defaults applied to every widget.
    pub widget: WidgetConfig,
    /// Fetching configuration (paths are relative strings from TOML).
    fetch: FetchConfigRaw,
    /// Script loading configuration.
    pub scripts: ScriptsConfig,

    /// Resolved fetching configuration (set after loading).
    #[serde(skip)]
    pub fetch_resolved: FetchConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Attribute defaults for widgets.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Markdown engine script location.
    pub renderer_url: Option<String>,
    /// Highlighter script location.
    pub highlighter_url: Option<String>,
    /// Stylesheet URLs, in output order.
    pub css_urls: Option<Vec<String>>,
    /// Insert output into the light tree instead of an encapsulated root.
    pub no_shadow: bool,
}

/// Raw fetch configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FetchConfigRaw {
    timeout_secs: Option<u64>,
    base_dir: Option<String>,
}

/// Resolved fetch configuration with absolute paths.
#[derive(Debug)]
pub struct FetchConfig {
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Directory local sources are resolved against.
    pub base_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            base_dir: PathBuf::from("."),
        }
    }
}

/// Script loading configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Load renderer and highlighter scripts even though the engines are built in.
    pub preload: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Malformed stylesheet list serialization.
    #[error("css-urls must be a JSON array of strings: {0}")]
    Stylesheets(#[from] serde_json::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require an optional string field to be non-empty when set.
fn require_non_empty(value: Option<&str>, field: &str) -> Result<(), ConfigError> {
    if value.is_some_and(str::is_empty) {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `zmd.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_dir) = &settings.base_dir {
            self.fetch_resolved.base_dir.clone_from(base_dir);
        }
        if let Some(css_urls) = &settings.css_urls {
            self.widget.css_urls = Some(css_urls.clone());
        }
        if let Some(no_shadow) = settings.no_shadow {
            self.widget.no_shadow = no_shadow;
        }
        if let Some(preload) = settings.preload_scripts {
            self.scripts.preload = preload;
        }
    }

    /// Attribute defaults for a widget rendering `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Stylesheets`] if the stylesheet list cannot be
    /// serialized.
    pub fn attributes_for(&self, source: &str) -> Result<Attributes, ConfigError> {
        let mut attributes = Attributes::new().with(instance::SRC, source);
        if let Some(url) = &self.widget.renderer_url {
            attributes.set(instance::RENDERER_URL, url.as_str());
        }
        if let Some(url) = &self.widget.highlighter_url {
            attributes.set(instance::HIGHLIGHTER_URL, url.as_str());
        }
        if let Some(urls) = &self.widget.css_urls {
            attributes.set(instance::CSS_URLS, serde_json::to_string(urls)?);
        }
        if self.widget.no_shadow {
            attributes.set(instance::NO_SHADOW, "");
        }
        Ok(attributes)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            widget: WidgetConfig::default(),
            fetch: FetchConfigRaw::default(),
            scripts: ScriptsConfig::default(),
            fetch_resolved: FetchConfig {
                base_dir: base.to_path_buf(),
                ..FetchConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(self.widget.renderer_url.as_deref(), "widget.renderer_url")?;
        require_non_empty(
            self.widget.highlighter_url.as_deref(),
            "widget.highlighter_url",
        )?;
        for url in self.widget.css_urls.iter().flatten() {
            require_non_empty(Some(url), "widget.css_urls entry")?;
        }

        if self.fetch_resolved.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.fetch_resolved = FetchConfig {
            timeout_secs: self.fetch.timeout_secs.unwrap_or(30),
            base_dir: config_dir.join(self.fetch.base_dir.as_deref().unwrap_or(".")),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.fetch_resolved.base_dir, PathBuf::from("/test"));
        assert_eq!(config.fetch_resolved.timeout_secs, 30);
        assert!(config.widget.css_urls.is_none());
        assert!(!config.widget.no_shadow);
        assert!(!config.scripts.preload);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.widget.renderer_url.is_none());
        assert!(!config.scripts.preload);
    }

    #[test]
    fn test_parse_widget_config() {
        let toml = r#"
[widget]
renderer_url = "https://cdn.example/marked.js"
css_urls = ["a.css", "b.css"]
no_shadow = true

[scripts]
preload = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.widget.renderer_url.as_deref(),
            Some("https://cdn.example/marked.js")
        );
        assert_eq!(
            config.widget.css_urls,
            Some(vec!["a.css".to_owned(), "b.css".to_owned()])
        );
        assert!(config.widget.no_shadow);
        assert!(config.scripts.preload);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[fetch]
base_dir = "docs"
timeout_secs = 5
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.fetch_resolved.base_dir, PathBuf::from("/project/docs"));
        assert_eq!(config.fetch_resolved.timeout_secs, 5);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config: Config = toml::from_str("[fetch]\ntimeout_secs = 0\n").unwrap();
        config.resolve_paths(Path::new("/project"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_empty_css_url_rejected() {
        let config: Config = toml::from_str("[widget]\ncss_urls = [\"\"]\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("zmd.toml");
        std::fs::write(&path, "[widget]\nno_shadow = true\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert!(config.widget.no_shadow);
        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.fetch_resolved.base_dir, tmp.path().join("."));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/zmd.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            base_dir: Some(PathBuf::from("/custom")),
            css_urls: Some(vec!["x.css".to_owned()]),
            no_shadow: Some(true),
            preload_scripts: None,
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.fetch_resolved.base_dir, PathBuf::from("/custom"));
        assert_eq!(config.widget.css_urls, Some(vec!["x.css".to_owned()]));
        assert!(config.widget.no_shadow);
        assert!(!config.scripts.preload); // Unchanged
    }

    #[test]
    fn test_attributes_for_roundtrips_into_instance_config() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.widget.css_urls = Some(vec!["a.css".to_owned(), "b.css".to_owned()]);
        config.widget.no_shadow = true;

        let attributes = config.attributes_for("guide.md").unwrap();
        let instance = InstanceConfig::from_attributes(&attributes).unwrap();

        assert_eq!(instance.source.as_deref(), Some("guide.md"));
        assert_eq!(instance.stylesheet_urls, vec!["a.css", "b.css"]);
        assert!(instance.no_shadow);
        assert_eq!(instance.renderer_url, instance::DEFAULT_RENDERER_URL);
    }
}
