//! External toolchain driver - discovery and command construction.
//!
//! The C front end/back end is an opaque collaborator: we locate a
//! `cc`-compatible driver (and `ar` for archives), assemble its command
//! lines from the session configuration, and hand raw stderr back to the
//! pipeline for diagnostic classification.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use cbuild_config::{MacroMap, SessionConfig};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// How the final link step combines the object files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    /// Standalone executable.
    Executable,
    /// Dynamically loadable shared library.
    SharedLib,
    /// Shared image destined for in-process loading. Unresolved externals
    /// must fail at link time, not at first dlopen.
    MemoryImage,
}

/// Resolved compiler and archiver paths for one build.
#[derive(Clone, Debug)]
pub struct Toolchain {
    cc: PathBuf,
    ar: Option<PathBuf>,
}

impl Toolchain {
    /// Resolve the toolchain: explicit `compiler` field first, then the
    /// `CC` environment variable, then `cc` on `PATH`.
    pub fn discover(config: &SessionConfig) -> Result<Self> {
        let cc = match &config.compiler {
            Some(path) => path.clone(),
            None => match std::env::var_os("CC") {
                Some(cc) if !cc.is_empty() => PathBuf::from(cc),
                _ => which::which("cc").map_err(|err| Error::Configuration {
                    reason: format!("no C compiler found on PATH: {err}"),
                })?,
            },
        };
        let ar = which::which("ar").ok();
        debug!(target: "cbuild::toolchain", cc = %cc.display(), "toolchain resolved");
        Ok(Self { cc, ar })
    }

    pub fn cc(&self) -> &Path {
        &self.cc
    }

    /// The archiver, required only for archive outputs.
    pub fn ar(&self) -> Result<&Path> {
        self.ar.as_deref().ok_or_else(|| Error::Configuration {
            reason: "no 'ar' archiver found on PATH".to_string(),
        })
    }

    /// Command compiling one source file to an object file with the given
    /// effective macro set.
    pub fn compile_command(
        &self,
        config: &SessionConfig,
        defines: &MacroMap,
        source: &Path,
        object: &Path,
    ) -> Command {
        let mut cmd = Command::new(&self.cc);
        cmd.arg("-c").arg(source).arg("-o").arg(object).arg("-fPIC");
        for option in &config.options {
            cmd.arg(option);
        }
        for dir in &config.include_dirs {
            cmd.arg("-I").arg(dir);
        }
        for dir in &config.sys_include_dirs {
            cmd.arg("-isystem").arg(dir);
        }
        for (name, value) in defines {
            cmd.arg(define_flag(name, value.as_deref()));
        }
        cmd
    }

    /// Command linking the collected inputs into `output`.
    pub fn link_command(
        &self,
        config: &SessionConfig,
        inputs: &[PathBuf],
        output: &Path,
        kind: LinkKind,
    ) -> Command {
        let mut cmd = Command::new(&self.cc);
        cmd.arg("-o").arg(output);
        match kind {
            LinkKind::Executable => {}
            LinkKind::SharedLib => {
                cmd.arg("-shared").arg("-fPIC");
            }
            LinkKind::MemoryImage => {
                cmd.arg("-shared").arg("-fPIC");
                if cfg!(target_os = "linux") {
                    cmd.arg("-Wl,--no-undefined");
                }
            }
        }
        for input in inputs {
            cmd.arg(input);
        }
        for dir in &config.library_dirs {
            cmd.arg("-L").arg(dir);
        }
        for option in &config.options {
            cmd.arg(option);
        }
        cmd
    }

    /// Command archiving the collected objects into `output`.
    pub fn archive_command(&self, inputs: &[PathBuf], output: &Path) -> Result<Command> {
        let mut cmd = Command::new(self.ar()?);
        cmd.arg("rcs").arg(output);
        for input in inputs {
            cmd.arg(input);
        }
        Ok(cmd)
    }
}

/// Captured result of one toolchain invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub stderr: String,
}

/// Run one toolchain command, blocking, and capture its stderr.
///
/// A missing driver executable surfaces as a configuration error; every
/// other spawn failure propagates as IO.
pub fn run(mut cmd: Command) -> Result<ToolOutput> {
    trace!(target: "cbuild::toolchain", command = ?cmd, "invoking");
    let output = cmd.output().map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            Error::Configuration {
                reason: format!("compiler '{}' not found", cmd.get_program().to_string_lossy()),
            }
        } else {
            Error::Io(err)
        }
    })?;
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    debug!(
        target: "cbuild::toolchain",
        success = output.status.success(),
        stderr_lines = stderr.lines().count(),
        "toolchain finished"
    );
    Ok(ToolOutput {
        success: output.status.success(),
        stderr,
    })
}

fn define_flag(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("-D{name}={value}"),
        // empty body: the preprocessor sees the macro as 1 in #if
        None => format!("-D{name}"),
    }
}
