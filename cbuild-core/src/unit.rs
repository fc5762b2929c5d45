//! Translation units - the per-build source inputs.

use std::path::{Path, PathBuf};

use cbuild_config::MacroMap;

use crate::artifact::ArchBinary;

/// Where a unit's content comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitSource {
    /// Inline C source text, materialized into the build scratch directory.
    Code(String),
    /// Path to a C source file, or to a pre-built object/archive that joins
    /// the final link line without being compiled.
    File(PathBuf),
}

/// One translation unit: a source plus unit-scoped macro overrides.
///
/// Pure value object, never mutated after construction. The overrides are
/// merged over the session macros only while this unit compiles; the next
/// unit observes exactly the session macros plus its own overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    source: UnitSource,
    defines: MacroMap,
}

impl Unit {
    /// A unit holding inline C source text.
    pub fn code(text: impl Into<String>) -> Self {
        Self {
            source: UnitSource::Code(text.into()),
            defines: MacroMap::new(),
        }
    }

    /// A unit referring to a file on disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: UnitSource::File(path.into()),
            defines: MacroMap::new(),
        }
    }

    /// Add a unit-scoped macro with a body.
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(name.into(), Some(value.into()));
        self
    }

    /// Add a unit-scoped macro with an empty body (evaluates to `1`).
    pub fn with_define_flag(mut self, name: impl Into<String>) -> Self {
        self.defines.insert(name.into(), None);
        self
    }

    /// Merge a whole macro mapping; entries override existing names.
    pub fn with_defines(mut self, defines: MacroMap) -> Self {
        for (name, value) in defines {
            self.defines.insert(name, value);
        }
        self
    }

    pub fn source(&self) -> &UnitSource {
        &self.source
    }

    pub fn defines(&self) -> &MacroMap {
        &self.defines
    }
}

// A bare string or path input is sugar for a file-path unit.

impl From<&str> for Unit {
    fn from(path: &str) -> Self {
        Unit::file(path)
    }
}

impl From<String> for Unit {
    fn from(path: String) -> Self {
        Unit::file(path)
    }
}

impl From<&Path> for Unit {
    fn from(path: &Path) -> Self {
        Unit::file(path)
    }
}

impl From<PathBuf> for Unit {
    fn from(path: PathBuf) -> Self {
        Unit::file(path)
    }
}

impl From<&ArchBinary> for Unit {
    fn from(archive: &ArchBinary) -> Self {
        Unit::file(archive.path())
    }
}
