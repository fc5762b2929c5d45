//! cbuild core - compilation sessions and build artifacts
//!
//! Drives an external C compiler toolchain to produce build outputs from one
//! or more independently configured translation units:
//! - an in-process loaded binary with symbol-level access ([`MemBinary`]),
//! - a standalone executable file ([`ExeBinary`]),
//! - a shared library file ([`LibBinary`]),
//! - a static archive usable as a link input in later builds ([`ArchBinary`]).
//!
//! The entry point is [`Session`]: it holds the shared [`SessionConfig`] and
//! exposes one `build_to_*` operation per output kind.
//!
//! ```no_run
//! use cbuild_core::{Session, Unit, MemOptions};
//!
//! let mut session = Session::default();
//! let unit = Unit::code("int main(void) { return 42; }");
//! let mut binary = session.build_to_mem(&[unit], MemOptions::default())?;
//! assert_eq!(binary.run(&[])?, 42);
//! # Ok::<(), cbuild_core::Error>(())
//! ```

pub mod artifact;
pub mod diag;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod toolchain;
pub mod unit;

pub use artifact::{ArchBinary, ExeBinary, LibBinary, MemBinary, Sym};
pub use cbuild_config::{MacroMap, SessionConfig, Stage};
pub use diag::{Diagnostic, ParseDiagnosticError, Severity};
pub use error::{Error, Result};
pub use session::{FileOptions, MemOptions, Session};
pub use unit::{Unit, UnitSource};
