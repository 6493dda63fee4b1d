use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::utils::normalize_list;

pub const CONFIG_FILE_NAME: &str = ".l10nguy.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub locales: Vec<String>,
    #[serde(default)]
    pub fallback_locales: Vec<String>,
    #[serde(default)]
    pub default_package: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
    #[serde(default)]
    pub order_by_id: bool,
    #[serde(default = "default_true")]
    pub set_needs_review: bool,
    #[serde(default)]
    pub new_state_qualifier: Option<String>,
    #[serde(default)]
    pub exit_codes: ExitCodes,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitCodes {
    #[serde(default)]
    pub success: u8,
    #[serde(default = "default_missing_code")]
    pub missing: u8,
    #[serde(default = "default_unused_code")]
    pub unused: u8,
    #[serde(default = "default_failure_code")]
    pub failure: u8,
    #[serde(default = "default_failure_code")]
    pub dirty: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub new_state: Option<String>,
    #[serde(default)]
    pub new_state_qualifier: Option<String>,
    #[serde(default = "default_true")]
    pub note_enabled: bool,
    #[serde(default = "default_context_window_lines")]
    pub context_window_lines: usize,
    #[serde(default)]
    pub system_prompt: String,
}

fn default_excludes() -> Vec<String> {
    ["**/node_modules/**", "**/vendor/**", "**/.git/**"]
        .map(String::from)
        .to_vec()
}

fn default_tab_width() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_missing_code() -> u8 {
    5
}

fn default_unused_code() -> u8 {
    6
}

fn default_failure_code() -> u8 {
    7
}

fn default_context_window_lines() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            locales: Vec::new(),
            fallback_locales: Vec::new(),
            default_package: None,
            format: OutputFormat::default(),
            includes: Vec::new(),
            excludes: default_excludes(),
            tab_width: default_tab_width(),
            order_by_id: false,
            set_needs_review: true,
            new_state_qualifier: None,
            exit_codes: ExitCodes::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for ExitCodes {
    fn default() -> Self {
        Self {
            success: 0,
            missing: default_missing_code(),
            unused: default_unused_code(),
            failure: default_failure_code(),
            dirty: default_failure_code(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            new_state: None,
            new_state_qualifier: None,
            note_enabled: true,
            context_window_lines: default_context_window_lines(),
            system_prompt: String::new(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern in `includes` or `excludes` is invalid.
    pub fn validate(&self) -> Result<()> {
        for (field, patterns) in [("includes", &self.includes), ("excludes", &self.excludes)] {
            for pattern in patterns {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in '{}': \"{}\"", field, pattern)
                })?;
            }
        }
        Ok(())
    }

    /// Split and de-duplicate the locale lists.
    fn normalize(&mut self) {
        self.locales = normalize_list(&self.locales);
        self.fallback_locales = normalize_list(&self.fallback_locales);
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// The file the config came from, `None` when using defaults.
    pub path: Option<PathBuf>,
}

impl ConfigLoadResult {
    pub fn from_file(&self) -> bool {
        self.path.is_some()
    }
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let mut config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            config.normalize();
            Ok(ConfigLoadResult {
                config,
                path: Some(path),
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            path: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.paths.is_empty());
        assert!(config.set_needs_review);
        assert_eq!(config.tab_width, 2);
        assert_eq!(config.exit_codes.missing, 5);
        assert_eq!(config.exit_codes.dirty, 7);
        assert_eq!(config.llm.context_window_lines, 5);
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
              "locales": ["de", "fr"],
              "format": "json",
              "exitCodes": { "missing": 1 },
              "llm": { "newState": "translated" }
          }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.locales, vec!["de", "fr"]);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.exit_codes.missing, 1);
        assert_eq!(config.exit_codes.unused, 6);
        assert_eq!(config.llm.new_state.as_deref(), Some("translated"));
        assert!(config.llm.note_enabled);
        assert_eq!(config.excludes, default_excludes());
    }

    #[test]
    fn test_default_config_json_round_trips() {
        let json = default_config_json().unwrap();
        assert!(json.contains("\"setNeedsReview\": true"));
        let config: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.exit_codes, ExitCodes::default());
        assert_eq!(config.llm, LlmConfig::default());
    }

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("DistributionPackages").join("Acme.Site");
        fs::create_dir_all(&sub_dir).unwrap();

        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        let found = find_config_file(&sub_dir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_stops_at_git() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn test_load_config_normalizes_locales() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "locales": ["de, fr", " de ", ""], "fallbackLocales": ["en"] }"#,
        )
        .unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(result.from_file());
        assert_eq!(result.config.locales, vec!["de", "fr"]);
        assert_eq!(result.config.fallback_locales, vec!["en"]);
    }

    #[test]
    fn test_load_config_default_when_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(!result.from_file());
        assert_eq!(result.config.excludes, default_excludes());
    }

    #[test]
    fn test_validate_invalid_pattern() {
        let config = Config {
            excludes: vec!["[invalid".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid glob pattern in 'excludes': \"[invalid\""
        );

        let config = Config {
            includes: vec!["**/[x".to_string()],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("includes"));
    }

    #[test]
    fn test_load_config_with_invalid_pattern_fails() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "includes": ["[invalid"] }"#,
        )
        .unwrap();

        assert!(load_config(dir.path()).is_err());
    }
}
