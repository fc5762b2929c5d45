//! cbuild Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic beyond defaults and
//! merge precedence. It serves as the shared configuration vocabulary across
//! all cbuild crates.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mapping of macro name to its body.
///
/// A `None` body is the empty-body marker: the macro is defined without a
/// value and compares equal to `1` in integer preprocessor conditionals.
pub type MacroMap = BTreeMap<String, Option<String>>;

/// Shared configuration consumed by every build issued against a session.
///
/// All fields stay public and mutable after construction; a session applies
/// whatever the configuration holds at the time `build_to_*` is called.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Raw compiler option strings, order preserved.
    #[serde(default)]
    pub options: Vec<String>,
    /// Session-level macro definitions. Keys are unique; on collision the
    /// later-specified value wins (see [`SessionConfig::set_define`]).
    #[serde(default)]
    pub defines: MacroMap,
    /// Ordered `-I` search directories.
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Ordered `-isystem` search directories.
    #[serde(default)]
    pub sys_include_dirs: Vec<PathBuf>,
    /// Ordered `-L` search directories.
    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,
    /// Explicit compiler driver. When unset, discovery falls back to the
    /// `CC` environment variable and then to `cc` on `PATH`.
    #[serde(default)]
    pub compiler: Option<PathBuf>,
}

impl SessionConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw compiler option.
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Append raw compiler options, preserving their order.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Define a macro with a body.
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_define(name, Some(value.into()));
        self
    }

    /// Define a macro with an empty body (evaluates to `1` in `#if`).
    pub fn with_define_flag(mut self, name: impl Into<String>) -> Self {
        self.set_define(name, None);
        self
    }

    /// Merge a whole macro mapping; entries override existing names.
    pub fn with_defines(mut self, defines: MacroMap) -> Self {
        for (name, value) in defines {
            self.defines.insert(name, value);
        }
        self
    }

    /// Append an `-I` include directory.
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Append an `-isystem` include directory.
    pub fn with_sys_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sys_include_dirs.push(dir.into());
        self
    }

    /// Append an `-L` library directory.
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dirs.push(dir.into());
        self
    }

    /// Pin the compiler driver instead of discovering one.
    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = Some(compiler.into());
        self
    }

    /// Insert one macro definition. The invariant is last-write-wins: a
    /// later call for the same name replaces the earlier body.
    pub fn set_define(&mut self, name: impl Into<String>, value: Option<String>) {
        self.defines.insert(name.into(), value);
    }
}

/// Build stage enum for stage-specific log targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Session,
    Toolchain,
    Pipeline,
    Artifact,
}

impl Stage {
    /// Get the string name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Session => "session",
            Stage::Toolchain => "toolchain",
            Stage::Pipeline => "pipeline",
            Stage::Artifact => "artifact",
        }
    }

    /// Get the log target name for this stage
    pub fn target(&self) -> String {
        format!("cbuild::{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let cfg = SessionConfig::default();
        assert!(cfg.options.is_empty());
        assert!(cfg.defines.is_empty());
        assert!(cfg.compiler.is_none());
    }

    #[test]
    fn test_options_preserve_order() {
        let cfg = SessionConfig::new()
            .with_option("-Wall")
            .with_options(["-O2", "-g"]);
        assert_eq!(cfg.options, vec!["-Wall", "-O2", "-g"]);
    }

    #[test]
    fn test_define_collision_later_wins() {
        let mut extra = MacroMap::new();
        extra.insert("A".to_string(), Some("2".to_string()));
        let cfg = SessionConfig::new().with_define("A", "1").with_defines(extra);
        assert_eq!(cfg.defines["A"], Some("2".to_string()));
    }

    #[test]
    fn test_define_flag_has_empty_body() {
        let cfg = SessionConfig::new().with_define_flag("NDEBUG");
        assert_eq!(cfg.defines["NDEBUG"], None);
    }

    #[test]
    fn test_stage_target() {
        assert_eq!(Stage::Pipeline.as_str(), "pipeline");
        assert_eq!(Stage::Artifact.target(), "cbuild::artifact");
    }
}
