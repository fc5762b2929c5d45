//! cbuild CLI - drive the system C toolchain from the command line.
//!
//! Builds one or more C sources (or pre-built link inputs) to memory and
//! runs the result, or emits an executable, shared library, or static
//! archive file.

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use cbuild_core::{
    Error, FileOptions, MemOptions, Result, Session, SessionConfig, Unit,
};

mod logging;
mod manifest;

use manifest::Manifest;

/// Requested output kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EmitKind {
    /// Build into process memory and run `main`.
    Mem,
    /// Standalone executable file.
    Exe,
    /// Shared library file.
    Lib,
    /// Static archive file.
    Arch,
}

#[derive(Parser)]
#[command(
    name = "cbuild",
    about = "Drive the system C toolchain: build to memory, executable, library, or archive",
    version
)]
struct Cli {
    /// C source files, or pre-built .o/.a/.so link inputs
    #[arg(value_name = "SOURCE", required_unless_present = "manifest")]
    sources: Vec<PathBuf>,

    /// JSON manifest providing sources and session configuration
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Define a macro (NAME or NAME=VALUE; NAME alone evaluates to 1)
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    defines: Vec<String>,

    /// Add an include search directory
    #[arg(short = 'I', value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Add a system include search directory
    #[arg(long = "isystem", value_name = "DIR")]
    sys_include_dirs: Vec<PathBuf>,

    /// Add a library search directory
    #[arg(short = 'L', value_name = "DIR")]
    library_dirs: Vec<PathBuf>,

    /// Pass a raw option through to the compiler driver
    #[arg(short = 'X', long = "option", value_name = "OPT")]
    options: Vec<String>,

    /// Compiler driver to use instead of $CC / cc
    #[arg(long, value_name = "PATH")]
    compiler: Option<PathBuf>,

    /// Output kind
    #[arg(long, value_enum, default_value_t = EmitKind::Mem)]
    emit: EmitKind,

    /// Output path for exe/lib/arch builds
    #[arg(short = 'o', long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Do not append the platform suffix to the output path
    #[arg(long)]
    no_auto_suffix: bool,

    /// Relocate an in-memory build at build time instead of on first use
    #[arg(long)]
    eager: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = logging::LogFormat::Compact)]
    log_format: logging::LogFormat,

    /// Print the build outcome and diagnostics as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Arguments passed to the program's main (mem builds only)
    #[arg(last = true, value_name = "ARGS")]
    run_args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);

    match execute(&cli) {
        Ok(status) => process::exit(status),
        Err(err) => {
            report_error(&err, cli.json);
            process::exit(1);
        }
    }
}

fn execute(cli: &Cli) -> Result<i32> {
    let mut manifest = match &cli.manifest {
        Some(path) => Manifest::load(path)?,
        None => Manifest::default(),
    };

    // take the config out so the manifest stays usable for output_path
    let config = merge_config(std::mem::take(&mut manifest.config), cli)?;
    let mut units: Vec<Unit> = manifest.sources.iter().map(Unit::file).collect();
    units.extend(cli.sources.iter().cloned().map(Unit::file));

    let mut session = Session::new(config);
    match cli.emit {
        EmitKind::Mem => {
            let mut binary = session.build_to_mem(&units, MemOptions { eager: cli.eager })?;
            let warnings = binary.warnings().to_vec();
            if !cli.json {
                for warning in &warnings {
                    eprintln!("cbuild: warning: {warning}");
                }
            }
            let args: Vec<&str> = cli.run_args.iter().map(String::as_str).collect();
            let status = binary.run(&args)?;
            if cli.json {
                // one document on stdout per invocation
                println!("{}", mem_outcome(status, &warnings));
            }
            Ok(status)
        }
        EmitKind::Exe => {
            let path = output_path(cli, &manifest)?;
            let exe = session.build_to_exe(&path, &units, file_options(cli))?;
            print_outcome("exe", exe.path(), cli.json);
            Ok(0)
        }
        EmitKind::Lib => {
            let path = output_path(cli, &manifest)?;
            let lib = session.build_to_lib(&path, &units, file_options(cli))?;
            print_outcome("lib", lib.path(), cli.json);
            Ok(0)
        }
        EmitKind::Arch => {
            let path = output_path(cli, &manifest)?;
            let arch = session.build_to_arch(&path, &units, file_options(cli))?;
            print_outcome("arch", arch.path(), cli.json);
            Ok(0)
        }
    }
}

/// Manifest configuration overlaid with command-line flags; the command
/// line wins on collision.
fn merge_config(mut config: SessionConfig, cli: &Cli) -> Result<SessionConfig> {
    config.options.extend(cli.options.iter().cloned());
    config.include_dirs.extend(cli.include_dirs.iter().cloned());
    config
        .sys_include_dirs
        .extend(cli.sys_include_dirs.iter().cloned());
    config.library_dirs.extend(cli.library_dirs.iter().cloned());
    for define in &cli.defines {
        let (name, value) = split_define(define)?;
        config.set_define(name, value);
    }
    if let Some(compiler) = &cli.compiler {
        config.compiler = Some(compiler.clone());
    }
    Ok(config)
}

/// `NAME` defines an empty-body macro, `NAME=VALUE` a valued one.
fn split_define(spec: &str) -> Result<(String, Option<String>)> {
    let (name, value) = match spec.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (spec, None),
    };
    if name.is_empty() {
        return Err(Error::Configuration {
            reason: format!("invalid macro definition '{spec}'"),
        });
    }
    Ok((name.to_string(), value))
}

/// Explicit `-o`, then the manifest's `output`, then the first source's
/// file stem.
fn output_path(cli: &Cli, manifest: &Manifest) -> Result<PathBuf> {
    if let Some(path) = &cli.output {
        return Ok(path.clone());
    }
    if let Some(path) = &manifest.output {
        return Ok(path.clone());
    }
    let first = manifest.sources.first().or(cli.sources.first());
    first
        .and_then(|path| path.file_stem())
        .map(PathBuf::from)
        .ok_or_else(|| Error::Configuration {
            reason: "no output path; pass -o or add 'output' to the manifest".to_string(),
        })
}

fn file_options(cli: &Cli) -> FileOptions {
    FileOptions {
        auto_add_suffix: !cli.no_auto_suffix,
    }
}

fn mem_outcome(status: i32, warnings: &[String]) -> serde_json::Value {
    serde_json::json!({ "kind": "mem", "status": status, "warnings": warnings })
}

fn print_outcome(kind: &str, path: &std::path::Path, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({ "kind": kind, "path": path.display().to_string() })
        );
    } else {
        println!("{}", path.display());
    }
}

fn report_error(err: &Error, json: bool) {
    if json {
        let payload = match err.diagnostic() {
            Some(diag) => serde_json::json!({ "error": diag }),
            None => serde_json::json!({ "error": { "message": err.to_string() } }),
        };
        println!("{payload}");
    } else {
        eprintln!("cbuild: {err}");
    }
}
