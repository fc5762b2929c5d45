//! Project manifest: a JSON file providing sources and session
//! configuration, so a build can be described once and replayed.

use std::path::{Path, PathBuf};

use cbuild_config::SessionConfig;
use cbuild_core::{Error, Result};
use serde::Deserialize;

/// `cbuild.json` structure. Command-line flags are merged on top of the
/// manifest; on collision the command line wins.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    /// Source files (or pre-built link inputs), in link order.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    /// Session configuration applied to every unit.
    #[serde(flatten)]
    pub config: SessionConfig,
    /// Default output path for file-producing builds.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|err| Error::Configuration {
            reason: format!("invalid manifest '{}': {err}", path.display()),
        })
    }
}
