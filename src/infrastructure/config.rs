//! Dump configuration.
//!
//! Options may come from a TOML file and from the command line; the command
//! line wins where both say something.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::Result;

/// How top-level cv-qualifiers show up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvQualifiedMode {
    /// Only as a `c`/`v`/`r` suffix on the unqualified type's id.
    #[default]
    Suffix,
    /// Suffixed references also get a matching `CvQualifiedType` element.
    Element,
}

/// Everything that shapes one dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Qualified names (`ns::Class`) to start from. Empty dumps the whole
    /// translation unit.
    pub start_names: Vec<String>,
    pub cv_qualified: CvQualifiedMode,
}

/// Contents of a `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    #[serde(default)]
    pub start: Vec<String>,
    #[serde(default)]
    pub cv_qualified: CvQualifiedMode,
}

impl DumpConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Merge command-line values over this config.
    pub fn into_options(self, cli_start: &[String], cv_elements: bool) -> DumpOptions {
        let start_names = if cli_start.is_empty() {
            self.start
        } else {
            cli_start.to_vec()
        };
        let cv_qualified = if cv_elements {
            CvQualifiedMode::Element
        } else {
            self.cv_qualified
        };
        DumpOptions {
            start_names: split_start_names(&start_names),
            cv_qualified,
        }
    }
}

/// Flatten comma-separated start lists and drop empty entries.
pub fn split_start_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .flat_map(|n| n.as_ref().split(','))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}
