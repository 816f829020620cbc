//! Verdict configuration.
//!
//! Loaded from `~/.verdict/config.toml`. A missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Verdict configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Recorded as `decidedBy` and `submittedBy` when `--as` and
    /// `VERDICT_IDENTITY` are both absent.
    pub default_identity: Option<String>,

    /// Database file. Defaults to `~/.verdict/verdict.sqlite`.
    pub database: Option<PathBuf>,

    /// Log filter used when `VERDICT_LOG` is unset (e.g. `info`, `verdict=debug`).
    pub log_level: Option<String>,
}

impl Config {
    /// Load config from `~/.verdict/config.toml`.
    /// Returns defaults if the file is missing and an error if it is invalid.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.default_identity.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(format!(
                "default-identity is empty in {}\n\
                 Set it to your user name or remove it.",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.verdict/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".verdict").join("config.toml"))
    }

    /// The log filter to fall back on when `VERDICT_LOG` is unset.
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }
}
