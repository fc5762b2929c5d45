//! In-memory binary lifecycle: relocation, symbol access, execution, close.

mod common;

use cbuild_core::{Error, MemOptions, Unit};
use common::{build_mem, session};

#[test]
fn test_lazy_build_is_open_and_not_relocated() {
    let binary = build_mem(&[Unit::code("")]).unwrap();
    assert!(!binary.closed());
    assert!(!binary.relocated());
}

#[test]
fn test_eager_build_is_relocated_at_build_time() {
    let binary = session()
        .build_to_mem(&[Unit::code("")], MemOptions::eager())
        .unwrap();
    assert!(!binary.closed());
    assert!(binary.relocated());
}

#[test]
fn test_contains_existing_symbol() {
    let binary = build_mem(&[Unit::code("int var;")]).unwrap();
    assert!(binary.contains("var").unwrap());
}

#[test]
fn test_contains_missing_symbol() {
    let binary = build_mem(&[Unit::code("int var;")]).unwrap();
    assert!(!binary.contains("non_existing_var").unwrap());
}

#[test]
fn test_contains_does_not_relocate() {
    let binary = build_mem(&[Unit::code("int var;")]).unwrap();
    assert!(binary.contains("var").unwrap());
    assert!(!binary.relocated());
}

#[test]
fn test_get_returns_readable_address() {
    let mut binary = build_mem(&[Unit::code("int var = 1234;")]).unwrap();
    let addr = binary.get("var").unwrap();
    let value = unsafe { *(addr as *const i32) };
    assert_eq!(value, 1234);
    assert!(binary.relocated());
}

#[test]
fn test_get_missing_symbol_is_not_found() {
    let mut binary = build_mem(&[Unit::code("int var;")]).unwrap();
    assert!(matches!(
        binary.get("non_existing_var"),
        Err(Error::SymbolNotFound { .. })
    ));
}

#[test]
fn test_typed_symbol_is_callable() {
    let mut binary =
        build_mem(&[Unit::code("int func(int a, int b) { return (a+b); }")]).unwrap();
    let sym = binary
        .symbol::<unsafe extern "C" fn(i32, i32) -> i32>("func")
        .unwrap();
    assert_ne!(sym.addr(), 0);
    let result = unsafe { sym.callable()(123, 456) };
    assert_eq!(result, 123 + 456);
}

#[test]
fn test_explicit_relocate_is_idempotent() {
    let mut binary = build_mem(&[Unit::code("int var;")]).unwrap();
    binary.relocate().unwrap();
    assert!(binary.relocated());
    binary.relocate().unwrap();
    assert!(binary.relocated());
}

#[test]
fn test_run_passes_argc_argv() {
    let mut binary =
        build_mem(&[Unit::code("int main(int argc, char **argv) { return argc; }")]).unwrap();
    assert_eq!(binary.run(&["a", "b"]).unwrap(), 3);
}

#[test]
fn test_run_without_main_is_not_found() {
    let mut binary = build_mem(&[Unit::code("int var;")]).unwrap();
    assert!(matches!(
        binary.run(&[]),
        Err(Error::SymbolNotFound { .. })
    ));
}

#[test]
fn test_close_is_terminal_and_idempotent() {
    let mut binary = build_mem(&[Unit::code("int var;")]).unwrap();
    binary.close();
    assert!(binary.closed());
    assert!(matches!(
        binary.contains("var"),
        Err(Error::InvalidState { .. })
    ));
    assert!(matches!(binary.get("var"), Err(Error::InvalidState { .. })));
    assert!(matches!(binary.run(&[]), Err(Error::InvalidState { .. })));
    assert!(matches!(
        binary.relocate(),
        Err(Error::InvalidState { .. })
    ));
    // double close stays a no-op
    binary.close();
    assert!(binary.closed());
}

#[test]
fn test_warnings_survive_relocation_and_close() {
    let unit = Unit::code("#define REDEF 1\n#define REDEF 2\n");
    let mut binary = build_mem(&[unit]).unwrap();
    binary.relocate().unwrap();
    binary.close();
    assert_eq!(binary.warnings().len(), 1);
}
