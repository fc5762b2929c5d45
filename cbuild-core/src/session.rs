//! Compiler session - the facade every build goes through.

use std::path::Path;

use cbuild_config::SessionConfig;
use tracing::info;

use crate::artifact::{ArchBinary, ExeBinary, LibBinary, MemBinary};
use crate::error::Result;
use crate::pipeline::BuildContext;
use crate::unit::Unit;

/// Options for in-memory builds.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemOptions {
    /// Relocate (load the image) at build time instead of on first access.
    pub eager: bool,
}

impl MemOptions {
    pub fn eager() -> Self {
        Self { eager: true }
    }
}

/// Options for file-producing builds.
#[derive(Clone, Copy, Debug)]
pub struct FileOptions {
    /// Append the platform suffix to the output path when missing.
    pub auto_add_suffix: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            auto_add_suffix: true,
        }
    }
}

impl FileOptions {
    pub fn no_suffix() -> Self {
        Self {
            auto_add_suffix: false,
        }
    }
}

/// Holds the shared configuration consumed by every build issued against
/// it.
///
/// Builds run synchronously and block the caller; `&mut self` on every
/// `build_to_*` operation enforces at the type level that exactly one build
/// is in flight per session. The session keeps no reference to the
/// artifacts it produces; their lifetime is the caller's responsibility.
#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The configuration stays mutable between builds.
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    /// Build the units into an in-process loaded binary.
    pub fn build_to_mem(&mut self, units: &[Unit], options: MemOptions) -> Result<MemBinary> {
        info!(target: "cbuild::session", units = units.len(), eager = options.eager, "building to memory");
        let mut ctx = BuildContext::new(&self.config)?;
        ctx.compile_units(&self.config, units)?;
        ctx.finish_mem(&self.config, options.eager)
    }

    /// Build the units into a standalone executable at `path`.
    pub fn build_to_exe(
        &mut self,
        path: impl AsRef<Path>,
        units: &[Unit],
        options: FileOptions,
    ) -> Result<ExeBinary> {
        info!(target: "cbuild::session", units = units.len(), path = %path.as_ref().display(), "building to executable");
        let mut ctx = BuildContext::new(&self.config)?;
        ctx.compile_units(&self.config, units)?;
        ctx.finish_exe(&self.config, path.as_ref(), options.auto_add_suffix)
    }

    /// Build the units into a shared library at `path`.
    pub fn build_to_lib(
        &mut self,
        path: impl AsRef<Path>,
        units: &[Unit],
        options: FileOptions,
    ) -> Result<LibBinary> {
        info!(target: "cbuild::session", units = units.len(), path = %path.as_ref().display(), "building to library");
        let mut ctx = BuildContext::new(&self.config)?;
        ctx.compile_units(&self.config, units)?;
        ctx.finish_lib(&self.config, path.as_ref(), options.auto_add_suffix)
    }

    /// Build the units into a static archive at `path`.
    pub fn build_to_arch(
        &mut self,
        path: impl AsRef<Path>,
        units: &[Unit],
        options: FileOptions,
    ) -> Result<ArchBinary> {
        info!(target: "cbuild::session", units = units.len(), path = %path.as_ref().display(), "building to archive");
        let mut ctx = BuildContext::new(&self.config)?;
        ctx.compile_units(&self.config, units)?;
        ctx.finish_arch(&self.config, path.as_ref(), options.auto_add_suffix)
    }
}
