//! Settings file loading.
//!
//! Settings live in the platform-specific config folder unless `--config`
//! names a file:
//! - macOS: ~/Library/Application Support/com.radio-studio.Radio-Studio/
//! - Windows: %APPDATA%/radio-studio/Radio Studio/config/
//! - Linux: ~/.config/radiostudio/

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use radio_model::ContextConfig;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "radio-studio";
const APP_NAME: &str = "Radio Studio";
const CONFIG_FILENAME: &str = "settings.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub context: ContextConfig,
    pub output: OutputSettings,
}

/// File names used when a command is not given explicit output paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub radio_data_file: String,
    pub script_file: String,
    pub translation_file: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            radio_data_file: "RadioData.xml".to_string(),
            script_file: "recorded_media.lua".to_string(),
            translation_file: "Recorded_Media_EN.txt".to_string(),
        }
    }
}

/// Default settings location. `None` when the platform has no home directory.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

pub fn parse_settings(content: &str) -> Result<Settings> {
    toml::from_str(content).context("parse settings")
}

/// Load settings.
///
/// An explicit path must exist and parse. The default location falls back to
/// defaults when the file is missing or unreadable.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        let settings = parse_settings(&content)
            .with_context(|| format!("settings file {}", path.display()))?;
        tracing::info!("Loaded settings from {}", path.display());
        return Ok(settings);
    }

    let Some(path) = settings_path() else {
        tracing::warn!("Could not determine settings path, using defaults");
        return Ok(Settings::default());
    };
    match fs::read_to_string(&path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                tracing::warn!("Failed to parse settings file: {e:#}, using defaults");
                Ok(Settings::default())
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            Ok(Settings::default())
        }
        Err(e) => {
            tracing::warn!("Failed to read settings file: {e}, using defaults");
            Ok(Settings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = parse_settings(
            r#"
            [context]
            auto_load_project = true
            project_path = "shows/kpz.radio.json"

            [output]
            script_file = "kpz_media.lua"
            "#,
        )
        .unwrap();
        assert!(settings.context.auto_load_project);
        assert_eq!(
            settings.context.project_path,
            Some(PathBuf::from("shows/kpz.radio.json"))
        );
        assert_eq!(settings.context.export_dir, None);
        assert_eq!(settings.output.script_file, "kpz_media.lua");
        assert_eq!(settings.output.radio_data_file, "RadioData.xml");
    }

    #[test]
    fn test_empty_settings_are_default() {
        assert_eq!(parse_settings("").unwrap(), Settings::default());
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        assert_eq!(parse_settings(&text).unwrap(), settings);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
