//! `implementor.toml` handling.

use std::path::{Path, PathBuf};

use implementor_assist::ExpanderOptions;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Looked up in the current directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "implementor.toml";

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}", path.display())]
    #[diagnostic(code(implementor::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}", path.display())]
    #[diagnostic(
        code(implementor::config::parse),
        help("expected `[expander]` and `[output]` tables, see the README")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// The `[output]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// `"text"` or `"json"`.
    pub format: OutputFormat,
}

/// Root configuration (implementor.toml format).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Declaration rendering options.
    pub expander: ExpanderOptions,

    /// Output settings.
    pub output: OutputConfig,
}

impl Config {
    /// Load `explicit`, or [`DEFAULT_CONFIG_FILE`] from `dir` if it exists.
    /// Only a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => {
                let path = dir.join(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_path(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, path)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
