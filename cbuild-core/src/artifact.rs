//! Build artifacts - the in-memory loaded binary and the file outputs.

use std::fmt;
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};

use libloading::Library;
use object::{Object, ObjectSymbol};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Error, Result};

/// Platform suffix for executable files (empty on unix).
pub const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;
/// Platform suffix for shared library files.
pub const LIB_SUFFIX: &str = std::env::consts::DLL_SUFFIX;
/// Suffix for static archive files.
pub const ARCH_SUFFIX: &str = ".a";

type MainFn = unsafe extern "C" fn(c_int, *const *const c_char) -> c_int;

/// An in-process loaded binary.
///
/// State machine: `Open+NotRelocated` -> `Open+Relocated` -> `Closed`, with
/// `Closed` terminal. Relocation (loading the link image into the process)
/// happens at most once, either eagerly at build time or lazily on the
/// first symbol access or execution request. Dropping the binary closes it,
/// so any scope exit releases the image exactly once.
pub struct MemBinary {
    image: PathBuf,
    scratch: Option<TempDir>,
    lib: Option<Library>,
    closed: bool,
    warnings: Vec<String>,
}

impl MemBinary {
    pub(crate) fn new(image: PathBuf, scratch: TempDir, warnings: Vec<String>) -> Self {
        Self {
            image,
            scratch: Some(scratch),
            lib: None,
            closed: false,
            warnings,
        }
    }

    /// Whether the binary has been closed.
    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Whether the link image has been loaded into the process.
    pub fn relocated(&self) -> bool {
        self.lib.is_some()
    }

    /// Warning texts collected while building this binary, in emission
    /// order, retained for the artifact's full lifetime.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Load the link image into the process. Idempotent: repeated calls
    /// after the first are no-ops. A load failure surfaces as an
    /// invalid-state error, matching implicit-relocation accesses.
    pub fn relocate(&mut self) -> Result<()> {
        self.ensure_open("relocate")?;
        if self.lib.is_none() {
            let lib = unsafe { Library::new(&self.image) }.map_err(|err| Error::InvalidState {
                what: format!("relocation failed: {err}"),
            })?;
            debug!(target: "cbuild::artifact", image = %self.image.display(), "image relocated");
            self.lib = Some(lib);
        }
        Ok(())
    }

    /// Membership test by symbol name against the link image's symbol
    /// table. Never triggers relocation: the image file is inspected
    /// directly, so this works before any load and has no side effects.
    pub fn contains(&self, name: &str) -> Result<bool> {
        self.ensure_open("symbol lookup")?;
        let data = std::fs::read(&self.image)?;
        let file = object::File::parse(&*data).map_err(|err| Error::InvalidState {
            what: format!("unreadable link image: {err}"),
        })?;
        Ok(file
            .symbols()
            .chain(file.dynamic_symbols())
            .any(|sym| !sym.is_undefined() && sym.name() == Ok(name)))
    }

    /// Raw memory address of a symbol, relocating first if needed.
    pub fn get(&mut self, name: &str) -> Result<usize> {
        self.ensure_open("symbol lookup")?;
        self.relocate()?;
        let Some(lib) = self.lib.as_ref() else {
            return Err(Error::InvalidState {
                what: "relocation did not load an image".to_string(),
            });
        };
        let sym = unsafe { lib.get::<*mut std::ffi::c_void>(name.as_bytes()) }.map_err(|_| {
            Error::SymbolNotFound {
                name: name.to_string(),
            }
        })?;
        Ok(*sym as usize)
    }

    /// Typed handle to a symbol, valid only while this binary stays
    /// borrowed - the borrow makes use-after-close unrepresentable.
    pub fn symbol<T>(&mut self, name: &str) -> Result<Sym<'_, T>> {
        let addr = self.get(name)?;
        Ok(Sym {
            addr,
            _owner: PhantomData,
            _signature: PhantomData,
        })
    }

    /// Resolve `main` and invoke it with the C `argc`/`argv` convention,
    /// relocating first if needed. Returns its integer result.
    pub fn run(&mut self, args: &[&str]) -> Result<i32> {
        self.ensure_open("run")?;
        self.relocate()?;
        let Some(lib) = self.lib.as_ref() else {
            return Err(Error::InvalidState {
                what: "relocation did not load an image".to_string(),
            });
        };
        let main = unsafe { lib.get::<MainFn>(b"main") }.map_err(|_| Error::SymbolNotFound {
            name: "main".to_string(),
        })?;

        let owned: Vec<std::ffi::CString> = std::iter::once("main")
            .chain(args.iter().copied())
            .map(std::ffi::CString::new)
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| Error::Configuration {
                reason: "program argument contains a NUL byte".to_string(),
            })?;
        let mut argv: Vec<*const c_char> = owned.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(std::ptr::null());

        debug!(target: "cbuild::artifact", args = args.len(), "running entry point");
        let status = unsafe { main(owned.len() as c_int, argv.as_ptr()) };
        Ok(status)
    }

    /// Release the loaded image and the backing scratch directory.
    /// Idempotent; every accessor fails with an invalid-state error
    /// afterwards.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Some(lib) = self.lib.take() {
            let _ = lib.close();
        }
        if let Some(scratch) = self.scratch.take() {
            let _ = scratch.close();
        }
        self.closed = true;
        debug!(target: "cbuild::artifact", image = %self.image.display(), "binary closed");
    }

    fn ensure_open(&self, what: &str) -> Result<()> {
        if self.closed {
            Err(Error::InvalidState {
                what: format!("{what} on closed binary"),
            })
        } else {
            Ok(())
        }
    }
}

impl Drop for MemBinary {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for MemBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemBinary")
            .field("image", &self.image)
            .field("relocated", &self.relocated())
            .field("closed", &self.closed)
            .field("warnings", &self.warnings.len())
            .finish()
    }
}

/// Typed symbol handle borrowed from an open [`MemBinary`].
pub struct Sym<'bin, T> {
    addr: usize,
    _owner: PhantomData<&'bin Library>,
    _signature: PhantomData<T>,
}

impl<T> Sym<'_, T> {
    /// Raw memory address of the symbol.
    pub fn addr(&self) -> usize {
        self.addr
    }
}

impl<T: Copy> Sym<'_, T> {
    /// Reinterpret the address as `T`.
    ///
    /// # Safety
    /// The caller asserts that `T` is a C-compatible function pointer type
    /// matching the symbol's actual signature.
    pub unsafe fn callable(&self) -> T {
        assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<usize>());
        std::mem::transmute_copy::<usize, T>(&self.addr)
    }
}

/// A standalone executable written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExeBinary {
    path: PathBuf,
}

impl ExeBinary {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolved absolute output path, platform suffix included unless it
    /// was suppressed at build time.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A dynamically loadable shared library written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibBinary {
    path: PathBuf,
}

impl LibBinary {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A static archive written to disk; usable as a link input in later
/// builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchBinary {
    path: PathBuf,
}

impl ArchBinary {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
