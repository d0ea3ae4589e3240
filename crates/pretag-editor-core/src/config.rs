//! Per-surface editor configuration.

use serde::{Deserialize, Serialize};
use std::{env, fs};

use crate::error::ConfigError;

pub const DEFAULT_EDITOR_ID: &str = "preTagBox";

/// Mount-time settings for one editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Element id of the editable surface.
    pub id: String,
    /// Literal fragment removed from the initial content before hydration.
    pub fixed_text: String,
    /// Plain initial content, used when `markup` is empty.
    pub default_value: String,
    /// Previously persisted markup projection.
    pub markup: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_EDITOR_ID.into(),
            fixed_text: String::new(),
            default_value: String::new(),
            markup: String::new(),
        }
    }
}

impl EditorConfig {
    pub fn with_markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            ..Self::default()
        }
    }

    pub fn with_default_value(value: impl Into<String>) -> Self {
        Self {
            default_value: value.into(),
            ..Self::default()
        }
    }

    /// Parse TOML, substituting `$VAR` references from the environment first.
    ///
    /// Longer names are substituted first, so `$HOMEDIR` is never read as
    /// `$HOME` followed by `DIR`.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars().collect();
        vars.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut source = source.to_string();
        for (k, v) in vars {
            source = source.replace(&format!("${}", k), &v);
        }
        let config: EditorConfig = toml::from_str(&source)?;
        if config.id.is_empty() {
            return Err(ConfigError::EmptyId);
        }
        Ok(config)
    }

    pub fn load(config_file: &str) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(config_file).map_err(|source| ConfigError::Read {
            path: config_file.to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::from_toml_str("").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.id, "preTagBox");
    }

    #[test]
    fn test_parse_fields() {
        let config = EditorConfig::from_toml_str(
            r#"
            id = "mentions"
            fixed_text = "Reply: "
            default_value = "hello"
            "#,
        )
        .unwrap();
        assert_eq!(config.id, "mentions");
        assert_eq!(config.fixed_text, "Reply: ");
        assert_eq!(config.default_value, "hello");
        assert!(config.markup.is_empty());
    }

    #[test]
    fn test_env_substitution() {
        // Only this test touches this variable.
        unsafe { env::set_var("PRETAG_TEST_FIXED", "Re: ") };
        let config = EditorConfig::from_toml_str(r#"fixed_text = "$PRETAG_TEST_FIXED""#).unwrap();
        assert_eq!(config.fixed_text, "Re: ");
    }

    #[test]
    fn test_env_substitution_prefers_longest_name() {
        // Only this test touches these variables.
        unsafe {
            env::set_var("PRETAG_TEST_ID", "short");
            env::set_var("PRETAG_TEST_IDENT", "long");
        }
        let config = EditorConfig::from_toml_str(
            r#"
            id = "$PRETAG_TEST_IDENT"
            fixed_text = "$PRETAG_TEST_ID"
            "#,
        )
        .unwrap();
        assert_eq!(config.id, "long");
        assert_eq!(config.fixed_text, "short");
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = EditorConfig::from_toml_str(r#"id = """#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyId));
    }

    #[test]
    fn test_bad_toml() {
        let err = EditorConfig::from_toml_str("id = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EditorConfig::load("/nonexistent/pretag.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
