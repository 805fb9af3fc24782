use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EditorError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_tab_stop")]
    pub tab_stop: usize,

    #[serde(default = "default_quit_times")]
    pub quit_times: u32,

    #[serde(default = "default_message_timeout_seconds")]
    pub message_timeout_seconds: u64,
}

fn default_tab_stop() -> usize {
    8
}

fn default_quit_times() -> u32 {
    3
}

fn default_message_timeout_seconds() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tab_stop: default_tab_stop(),
            quit_times: default_quit_times(),
            message_timeout_seconds: default_message_timeout_seconds(),
        }
    }
}

impl Config {
    /// Loads the config from the default location, falling back to the
    /// defaults on any problem. A missing file is created with defaults.
    pub fn load() -> Self {
        let config_path = Self::config_path();

        match fs::read_to_string(&config_path) {
            Ok(contents) => Self::parse(&config_path, &contents).unwrap_or_else(|e| {
                tracing::warn!(target: "config", error = %e, "config_parse_failed_using_defaults");
                Self::default()
            }),
            Err(_) => {
                let default_config = Self::default();
                if let Err(e) = default_config.save_to(&config_path) {
                    tracing::warn!(target: "config", error = %e, "default_config_write_failed");
                }
                default_config
            }
        }
    }

    /// Loads an explicitly named config file. Unlike [`Config::load`] any
    /// failure is reported to the caller.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| EditorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).map_err(|source| EditorError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    // Zero tab stops or quit presses would make the editor unusable.
    fn normalized(mut self) -> Self {
        self.tab_stop = self.tab_stop.max(1);
        self.quit_times = self.quit_times.max(1);
        self
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let write_err = |reason: String| EditorError::ConfigWrite {
            path: config_path.to_path_buf(),
            reason,
        };

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(config_path, toml_string).map_err(|e| write_err(e.to_string()))?;

        Ok(())
    }

    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("textedit");
        path.push("config.toml");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = Config::parse(Path::new("inline.toml"), "tab_stop = 4\n").unwrap();
        assert_eq!(config.tab_stop, 4);
        assert_eq!(config.quit_times, 3);
        assert_eq!(config.message_timeout_seconds, 5);
    }

    #[test]
    fn zero_values_are_clamped() {
        let config =
            Config::parse(Path::new("inline.toml"), "tab_stop = 0\nquit_times = 0\n").unwrap();
        assert_eq!(config.tab_stop, 1);
        assert_eq!(config.quit_times, 1);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = Config::parse(Path::new("bad.toml"), "tab_stop = \"wide\"").unwrap_err();
        assert!(matches!(err, EditorError::Config { .. }));
    }

    #[test]
    fn save_then_load_from_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            tab_stop: 2,
            quit_times: 5,
            message_timeout_seconds: 1,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, EditorError::ConfigRead { .. }));
    }
}
