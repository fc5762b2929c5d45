//! Build pipeline - compiles ordered units and finalizes artifacts.
//!
//! All per-build state lives in an explicit [`BuildContext`]; the session
//! configuration is never mutated. Each unit's effective macro set is
//! computed as session defines overlaid with the unit's own overrides, so a
//! unit's macros are structurally invisible to every other unit and a
//! session-level macro shadowed by an override is back in force for the
//! next unit.

use std::fs;
use std::path::{Path, PathBuf};

use cbuild_config::{MacroMap, SessionConfig};
use tempfile::TempDir;
use tracing::{debug, trace, warn};

use crate::artifact::{self, ArchBinary, ExeBinary, LibBinary, MemBinary};
use crate::diag::{Diagnostic, Severity};
use crate::error::{Error, Result};
use crate::toolchain::{self, LinkKind, Toolchain, ToolOutput};
use crate::unit::{Unit, UnitSource};

/// Build-scoped state: scratch directory, resolved toolchain, the ordered
/// link inputs produced so far, and the accumulated warning texts.
pub struct BuildContext {
    toolchain: Toolchain,
    scratch: TempDir,
    objects: Vec<PathBuf>,
    warnings: Vec<String>,
}

impl BuildContext {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let toolchain = Toolchain::discover(config)?;
        let scratch = tempfile::Builder::new().prefix("cbuild-").tempdir()?;
        trace!(target: "cbuild::pipeline", scratch = %scratch.path().display(), "build context ready");
        Ok(Self {
            toolchain,
            scratch,
            objects: Vec::new(),
            warnings: Vec::new(),
        })
    }

    /// Compile every unit in caller order, aborting on the first fatal
    /// diagnostic. An empty unit list builds an empty translation unit so
    /// that finalization always has a link input.
    pub fn compile_units(&mut self, config: &SessionConfig, units: &[Unit]) -> Result<()> {
        if units.is_empty() {
            return self.compile_source(config, &MacroMap::new(), None, 0);
        }
        for (index, unit) in units.iter().enumerate() {
            match unit.source() {
                UnitSource::File(path) if is_link_input(path) => {
                    debug!(target: "cbuild::pipeline", input = %path.display(), "pre-built link input");
                    self.objects.push(path.clone());
                }
                UnitSource::File(path) => {
                    self.compile_source(config, unit.defines(), Some(path.clone()), index)?;
                }
                UnitSource::Code(text) => {
                    let path = self.scratch.path().join(format!("unit_{index}.c"));
                    fs::write(&path, text)?;
                    self.compile_source(config, unit.defines(), Some(path), index)?;
                }
            }
        }
        Ok(())
    }

    fn compile_source(
        &mut self,
        config: &SessionConfig,
        overrides: &MacroMap,
        source: Option<PathBuf>,
        index: usize,
    ) -> Result<()> {
        let source = match source {
            Some(path) => path,
            None => {
                let path = self.scratch.path().join("unit_0.c");
                fs::write(&path, "")?;
                path
            }
        };
        let object = self.scratch.path().join(format!("unit_{index}.o"));

        // session macros overlaid with this unit's overrides, unit wins
        let mut defines = config.defines.clone();
        for (name, value) in overrides {
            defines.insert(name.clone(), value.clone());
        }

        debug!(
            target: "cbuild::pipeline",
            unit = index,
            source = %source.display(),
            overrides = overrides.len(),
            "compiling unit"
        );
        let cmd = self.toolchain.compile_command(config, &defines, &source, &object);
        let output = toolchain::run(cmd)?;
        self.consume_diagnostics(&output)?;
        self.objects.push(object);
        Ok(())
    }

    /// Classify one invocation's stderr: the first `error` line aborts the
    /// build, `warning` lines accumulate in emission order, `note` lines
    /// and unstructured context lines are logged only. A failing exit with
    /// no structured error becomes a fallback diagnostic.
    fn consume_diagnostics(&mut self, output: &ToolOutput) -> Result<()> {
        let mut first_unparsed: Option<&str> = None;
        for line in output.stderr.lines() {
            match line.parse::<Diagnostic>() {
                Ok(diag) if diag.is_fatal() => {
                    warn!(target: "cbuild::pipeline", %diag, "fatal diagnostic");
                    return Err(Error::Compile(diag));
                }
                Ok(diag) if diag.severity == Severity::Warning => {
                    debug!(target: "cbuild::pipeline", %diag, "warning");
                    self.warnings.push(diag.text);
                }
                Ok(diag) => trace!(target: "cbuild::pipeline", %diag, "note"),
                Err(_) => {
                    trace!(target: "cbuild::pipeline", line, "unstructured toolchain output");
                    if first_unparsed.is_none() && !line.trim().is_empty() {
                        first_unparsed = Some(line);
                    }
                }
            }
        }
        if !output.success {
            let text = first_unparsed.unwrap_or("toolchain exited with an error");
            return Err(Error::Compile(Diagnostic::fallback(text)));
        }
        Ok(())
    }

    /// Link the objects into a shared image inside the scratch directory
    /// and hand ownership of both to the in-memory artifact.
    pub fn finish_mem(mut self, config: &SessionConfig, eager: bool) -> Result<MemBinary> {
        let image = self.scratch.path().join(image_file_name());
        let cmd = self
            .toolchain
            .link_command(config, &self.objects, &image, LinkKind::MemoryImage);
        let output = toolchain::run(cmd)?;
        self.consume_diagnostics(&output)?;

        let mut binary = MemBinary::new(image, self.scratch, self.warnings);
        if eager {
            binary.relocate()?;
        }
        Ok(binary)
    }

    pub fn finish_exe(
        mut self,
        config: &SessionConfig,
        path: &Path,
        auto_add_suffix: bool,
    ) -> Result<ExeBinary> {
        let path = resolve_output_path(path, artifact::EXE_SUFFIX, auto_add_suffix)?;
        let cmd = self
            .toolchain
            .link_command(config, &self.objects, &path, LinkKind::Executable);
        let output = toolchain::run(cmd)?;
        self.consume_diagnostics(&output)?;
        Ok(ExeBinary::new(path))
    }

    pub fn finish_lib(
        mut self,
        config: &SessionConfig,
        path: &Path,
        auto_add_suffix: bool,
    ) -> Result<LibBinary> {
        let path = resolve_output_path(path, artifact::LIB_SUFFIX, auto_add_suffix)?;
        let cmd = self
            .toolchain
            .link_command(config, &self.objects, &path, LinkKind::SharedLib);
        let output = toolchain::run(cmd)?;
        self.consume_diagnostics(&output)?;
        Ok(LibBinary::new(path))
    }

    pub fn finish_arch(
        mut self,
        _config: &SessionConfig,
        path: &Path,
        auto_add_suffix: bool,
    ) -> Result<ArchBinary> {
        let path = resolve_output_path(path, artifact::ARCH_SUFFIX, auto_add_suffix)?;
        let cmd = self.toolchain.archive_command(&self.objects, &path)?;
        let output = toolchain::run(cmd)?;
        self.consume_diagnostics(&output)?;
        Ok(ArchBinary::new(path))
    }
}

/// Scratch name of the in-memory link image, carrying the platform's
/// shared-library suffix like the file outputs do.
fn image_file_name() -> String {
    format!("image{}", artifact::LIB_SUFFIX)
}

/// Pre-built inputs skip compilation and join the final link line.
fn is_link_input(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("o" | "obj" | "a" | "lib" | "so" | "dylib" | "dll")
    )
}

/// Absolutize the caller's output path against the working directory at
/// call time and append the platform suffix unless suppressed or already
/// present. Computed before any write so the returned value is stable
/// against later working-directory changes.
fn resolve_output_path(path: &Path, suffix: &str, auto_add_suffix: bool) -> Result<PathBuf> {
    let mut resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    if auto_add_suffix && !suffix.is_empty() {
        let name = resolved
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !name.ends_with(suffix) {
            resolved.set_file_name(format!("{name}{suffix}"));
        }
    }
    Ok(resolved)
}
