//! File-producing builds: executables, shared libraries, archives.

mod common;

use std::process::Command;

use cbuild_core::{artifact, FileOptions, Unit};
use common::session;
use serial_test::serial;

#[test]
fn test_build_to_exe_creates_runnable_file() {
    let dir = tempfile::tempdir().unwrap();
    let unit = Unit::code("int main(void) { return 123; }");
    let exe = session()
        .build_to_exe(dir.path().join("program"), &[unit], FileOptions::default())
        .unwrap();
    assert!(exe.path().is_absolute());
    let status = Command::new(exe.path()).status().unwrap();
    assert_eq!(status.code(), Some(123));
}

#[test]
#[serial]
fn test_build_to_exe_resolves_relative_path_against_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let original = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = session().build_to_exe(
        "program",
        &[Unit::code("int main(void) { return 0; }")],
        FileOptions::default(),
    );
    std::env::set_current_dir(original).unwrap();

    let exe = result.unwrap();
    assert!(exe.path().is_absolute());
    assert_eq!(
        std::fs::canonicalize(exe.path().parent().unwrap()).unwrap(),
        std::fs::canonicalize(dir.path()).unwrap()
    );
}

#[test]
fn test_build_to_lib_appends_platform_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let lib = session()
        .build_to_lib(dir.path().join("library"), &[Unit::code("")], FileOptions::default())
        .unwrap();
    let name = lib.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(name, format!("library{}", artifact::LIB_SUFFIX));
    assert!(lib.path().exists());
}

#[test]
fn test_build_to_lib_suffix_can_be_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    let lib = session()
        .build_to_lib(
            dir.path().join("library"),
            &[Unit::code("")],
            FileOptions::no_suffix(),
        )
        .unwrap();
    assert_eq!(lib.path().file_name().unwrap(), "library");
}

#[test]
fn test_built_library_is_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let unit = Unit::code("int func(void) { return 123; }");
    let lib = session()
        .build_to_lib(dir.path().join("library"), &[unit], FileOptions::default())
        .unwrap();
    unsafe {
        let loaded = libloading::Library::new(lib.path()).unwrap();
        let func: libloading::Symbol<unsafe extern "C" fn() -> i32> =
            loaded.get(b"func").unwrap();
        assert_eq!(func(), 123);
    }
}

#[test]
fn test_build_to_arch_produces_linkable_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = session()
        .build_to_arch(
            dir.path().join("library"),
            &[Unit::code("int func() { return 123; }")],
            FileOptions::default(),
        )
        .unwrap();
    assert_eq!(
        archive.path().extension().and_then(|e| e.to_str()),
        Some("a")
    );

    let units = [
        Unit::code("int func(); int main() { return func(); }"),
        Unit::from(&archive),
    ];
    let exe = session()
        .build_to_exe(dir.path().join("main"), &units, FileOptions::default())
        .unwrap();
    let status = Command::new(exe.path()).status().unwrap();
    assert_eq!(status.code(), Some(123));
}

#[test]
fn test_exe_suffix_matches_platform() {
    let dir = tempfile::tempdir().unwrap();
    let exe = session()
        .build_to_exe(
            dir.path().join("program"),
            &[Unit::code("int main(void) { return 0; }")],
            FileOptions::default(),
        )
        .unwrap();
    let name = exe.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(name, format!("program{}", artifact::EXE_SUFFIX));
}
