//! Thin `dlopen`/`dlsym` wrapper.

use std::ffi::{c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{LldbindError, LldbindResult};

/// A shared library opened with `RTLD_NOW | RTLD_LOCAL`
///
/// The library is closed on drop. Function pointers resolved from it must
/// not outlive it; [`NativeEngine`](super::NativeEngine) keeps both together.
pub(crate) struct Library
{
    handle: *mut c_void,
    path: PathBuf,
}

impl Library
{
    /// Open the library at `path`.
    ///
    /// A bare file name is resolved through the dynamic loader's search path.
    ///
    /// ## Errors
    ///
    /// Returns [`LldbindError::LibraryLoad`] carrying the loader's message.
    pub(crate) fn open(path: &Path) -> LldbindResult<Self>
    {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| LldbindError::LibraryLoad(format!("{}: path contains a NUL byte", path.display())))?;

        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            let reason = last_error().unwrap_or_else(|| "unknown dlopen failure".to_string());
            return Err(LldbindError::LibraryLoad(format!("{}: {reason}", path.display())));
        }

        debug!("Opened {}", path.display());
        Ok(Self {
            handle,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub(crate) fn path(&self) -> &Path
    {
        &self.path
    }

    /// Address of the exported symbol `name`, or `None` when it is missing.
    #[must_use]
    pub(crate) fn symbol(&self, name: &str) -> Option<*mut c_void>
    {
        let c_name = CString::new(name).ok()?;
        // SAFETY: self.handle is a live handle returned by dlopen and c_name is NUL-terminated.
        let address = unsafe { libc::dlsym(self.handle, c_name.as_ptr()) };
        if address.is_null() {
            trace!("Symbol {name} not exported by {}", self.path.display());
            None
        } else {
            Some(address)
        }
    }
}

impl Drop for Library
{
    fn drop(&mut self)
    {
        // SAFETY: the handle came from dlopen and is closed exactly once.
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

/// The pending `dlerror` message, if any.
fn last_error() -> Option<String>
{
    // SAFETY: dlerror returns either null or a NUL-terminated string owned by the loader.
    let message = unsafe { libc::dlerror() };
    if message.is_null() {
        None
    } else {
        // SAFETY: checked non-null above; copied before any further loader call.
        Some(unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_missing_library_reports_path()
    {
        let path = Path::new("/nonexistent/liblldb_wrapper.so");
        match Library::open(path) {
            Err(LldbindError::LibraryLoad(message)) => assert!(message.starts_with("/nonexistent/liblldb_wrapper.so")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("library should not load"),
        }
    }

    #[test]
    fn test_nul_in_path_is_rejected()
    {
        let path = Path::new("lib\0wrapper.so");
        assert!(matches!(Library::open(path), Err(LldbindError::LibraryLoad(_))));
    }
}
