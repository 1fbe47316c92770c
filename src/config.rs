//! Process-wide panel configuration, consulted once when a stack is built.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::options::{PanelOptions, Position};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Global defaults layered between the built-in defaults and call-site
/// options. Only this subset of [`PanelOptions`] is recognized; unknown
/// fields in a config file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    pub width: Option<String>,
    pub min_width: Option<String>,
    pub max_width: Option<String>,
    pub position: Option<Position>,
    pub disable_close: Option<bool>,
}

impl GlobalConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded side page config");
        Ok(config)
    }

    /// Layer `over` on top of `self`, field by field.
    pub fn merge(self, over: GlobalConfig) -> GlobalConfig {
        GlobalConfig {
            width: over.width.or(self.width),
            min_width: over.min_width.or(self.min_width),
            max_width: over.max_width.or(self.max_width),
            position: over.position.or(self.position),
            disable_close: over.disable_close.or(self.disable_close),
        }
    }

    /// The recognized subset as a partial option layer.
    pub fn to_options(&self) -> PanelOptions {
        PanelOptions {
            width: self.width.clone(),
            min_width: self.min_width.clone(),
            max_width: self.max_width.clone(),
            position: self.position,
            disable_close: self.disable_close,
            ..PanelOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_json_reads_recognized_subset() {
        let config = GlobalConfig::from_json(
            r#"{"width":"450px","maxWidth":"90vw","minWidth":"300px","position":"end","disableClose":false,"zIndex":5}"#,
        )
        .unwrap();
        assert_eq!(config.width.as_deref(), Some("450px"));
        assert_eq!(config.max_width.as_deref(), Some("90vw"));
        assert_eq!(config.min_width.as_deref(), Some("300px"));
        assert_eq!(config.position, Some(Position::End));
        assert_eq!(config.disable_close, Some(false));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = GlobalConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"width":"450px"}}"#).unwrap();

        let config = GlobalConfig::load(file.path()).unwrap();
        assert_eq!(config.width.as_deref(), Some("450px"));
        assert!(config.position.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GlobalConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_merge_prefers_override() {
        let file = GlobalConfig {
            width: Some("450px".into()),
            max_width: Some("90vw".into()),
            ..Default::default()
        };
        let flags = GlobalConfig {
            width: Some("600px".into()),
            ..Default::default()
        };
        let merged = file.merge(flags);
        assert_eq!(merged.width.as_deref(), Some("600px"));
        assert_eq!(merged.max_width.as_deref(), Some("90vw"));
    }

    #[test]
    fn test_to_options_only_sets_subset() {
        let config = GlobalConfig {
            width: Some("450px".into()),
            disable_close: Some(true),
            ..Default::default()
        };
        let opts = config.to_options();
        assert_eq!(opts.width.as_deref(), Some("450px"));
        assert_eq!(opts.disable_close, Some(true));
        assert!(opts.z_index.is_none());
        assert!(opts.has_backdrop.is_none());
    }
}
