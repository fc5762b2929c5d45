//! Test helpers for end-to-end builds against the host C toolchain.
#![allow(dead_code)]

use cbuild_core::{MemBinary, MemOptions, Result, Session, Unit};

/// A session with default configuration (toolchain from `CC`/`PATH`).
pub fn session() -> Session {
    Session::default()
}

/// Build units to memory with lazy relocation.
pub fn build_mem(units: &[Unit]) -> Result<MemBinary> {
    session().build_to_mem(units, MemOptions::default())
}

/// Build units to memory and run `main` with no arguments.
pub fn run_units(units: &[Unit]) -> Result<i32> {
    build_mem(units)?.run(&[])
}
