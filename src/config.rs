use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::{
    DEFAULT_I18N_FUNCTION, DEFAULT_I18N_IMPORT, DEFAULT_IGNORE_MARK, Options,
};

pub const CONFIG_FILE_NAME: &str = ".hanwraprc.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_i18n_function")]
    pub i18n_function: String,
    #[serde(default = "default_i18n_import")]
    pub i18n_import: String,
    /// Path to the dictionary JSON file, relative to the config file's
    /// directory (or the working directory when no file was found).
    #[serde(default)]
    pub dict: Option<String>,
    #[serde(default = "default_ignore_mark")]
    pub ignore_mark: String,
    /// Regex for leading text split off before translation. Defaults to
    /// leading whitespace.
    #[serde(default)]
    pub ignore_prefix: Option<String>,
    /// Regex for trailing text split off before translation. Defaults to
    /// trailing whitespace.
    #[serde(default)]
    pub ignore_suffix: Option<String>,
    #[serde(default)]
    pub raw: bool,
    #[serde(default)]
    pub transforms: Vec<String>,
}

fn default_i18n_function() -> String {
    DEFAULT_I18N_FUNCTION.to_string()
}

fn default_i18n_import() -> String {
    DEFAULT_I18N_IMPORT.to_string()
}

fn default_ignore_mark() -> String {
    DEFAULT_IGNORE_MARK.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            i18n_function: default_i18n_function(),
            i18n_import: default_i18n_import(),
            dict: None,
            ignore_mark: default_ignore_mark(),
            ignore_prefix: None,
            ignore_suffix: None,
            raw: false,
            transforms: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if the edge patterns are invalid regexes.
    pub fn validate(&self) -> Result<()> {
        for (field, pattern) in [
            ("ignorePrefix", &self.ignore_prefix),
            ("ignoreSuffix", &self.ignore_suffix),
        ] {
            if let Some(pattern) = pattern {
                Regex::new(pattern).with_context(|| {
                    format!("Invalid regex in '{}': \"{}\"", field, pattern)
                })?;
            }
        }
        Ok(())
    }

    /// Resolve the configuration into engine options.
    pub fn into_options(self) -> Result<Options> {
        let mut options = Options::new(&self.i18n_function, &self.i18n_import);
        options.ignore_mark = self.ignore_mark;
        if let Some(pattern) = &self.ignore_prefix {
            options.ignore_prefix = Regex::new(pattern)
                .with_context(|| format!("Invalid regex in 'ignorePrefix': \"{}\"", pattern))?;
        }
        if let Some(pattern) = &self.ignore_suffix {
            options.ignore_suffix = Regex::new(pattern)
                .with_context(|| format!("Invalid regex in 'ignoreSuffix': \"{}\"", pattern))?;
        }
        options.raw = self.raw;
        options.transforms = self.transforms;
        options.dict_path = self.dict.map(PathBuf::from);
        Ok(options)
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
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            // A relative dict path means relative to the config file, which
            // may sit above the directory the command runs in.
            if let (Some(dict), Some(dir)) = (&config.dict, path.parent()) {
                if Path::new(dict).is_relative() {
                    config.dict = Some(dir.join(dict).to_string_lossy().into_owned());
                }
            }
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.i18n_function, "t");
        assert_eq!(config.i18n_import, "@/i18n");
        assert_eq!(config.ignore_mark, "i18n!:");
        assert!(config.transforms.is_empty());
        assert!(!config.raw);
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
              "i18nFunction": "$t",
              "i18nImport": "@/locales",
              "transforms": ["vue3-template"]
          }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.i18n_function, "$t");
        assert_eq!(config.i18n_import, "@/locales");
        assert_eq!(config.transforms, vec!["vue3-template"]);
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{ "raw": true }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.raw);
        assert_eq!(config.i18n_function, "t");
    }

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("src").join("components");
        fs::create_dir_all(&sub_dir).unwrap();

        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        let found = find_config_file(&sub_dir);
        assert!(found.is_some());
        assert_eq!(found.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let found = find_config_file(dir.path());
        assert!(found.is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&config_path, r#"{ "i18nFunction": "$t" }"#).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(result.from_file);
        assert_eq!(result.config.i18n_function, "$t");
    }

    #[test]
    fn test_dict_path_resolved_against_config_dir() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("packages").join("app");
        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "dict": "locales/zh.json" }"#,
        )
        .unwrap();

        let result = load_config(&sub_dir).unwrap();
        assert_eq!(
            PathBuf::from(result.config.dict.unwrap()),
            dir.path().join("locales").join("zh.json")
        );
    }

    #[test]
    fn test_load_config_default_when_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(!result.from_file);
        assert_eq!(result.config.i18n_function, "t");
    }

    #[test]
    fn test_validate_invalid_prefix_pattern() {
        let config = Config {
            ignore_prefix: Some("[invalid".to_string()), // unclosed class
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ignorePrefix"));
    }

    #[test]
    fn test_load_config_with_invalid_pattern_fails() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&config_path, r#"{ "ignoreSuffix": "[invalid" }"#).unwrap();

        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn test_into_options_custom_edges() {
        let config = Config {
            ignore_prefix: Some(r"^[0-9]+".to_string()),
            transforms: vec!["vue3-template".to_string()],
            ..Default::default()
        };
        let options = config.into_options().unwrap();
        assert!(options.ignore_prefix.is_match("42你好"));
        assert_eq!(options.transforms, vec!["vue3-template"]);
    }
}
