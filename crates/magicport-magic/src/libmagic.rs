//! Runtime binding to the system libmagic.
//!
//! The shared library is opened with `dlopen` so the port builds without
//! libmagic headers and reports a missing library as an ordinary error.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use crate::engine::{Engine, Input, View, ViewKind};
use crate::error::{EngineError, LibraryError};

pub const MAGIC_NONE: c_int = 0x000_0000;
pub const MAGIC_MIME_TYPE: c_int = 0x000_0010;
pub const MAGIC_CHECK: c_int = 0x000_0040;
pub const MAGIC_ERROR: c_int = 0x000_0200;
pub const MAGIC_MIME_ENCODING: c_int = 0x000_0400;

/// Flags shared by every view.
pub const COMMON_FLAGS: c_int = MAGIC_CHECK | MAGIC_ERROR;

#[cfg(target_os = "macos")]
const LIBRARY_CANDIDATES: &[&str] = &[
    "libmagic.1.dylib",
    "/opt/homebrew/lib/libmagic.1.dylib",
    "/usr/local/lib/libmagic.1.dylib",
];

#[cfg(not(target_os = "macos"))]
const LIBRARY_CANDIDATES: &[&str] = &["libmagic.so.1", "libmagic.so"];

type MagicT = *mut c_void;

struct Api {
    handle: *mut c_void,
    open: unsafe extern "C" fn(c_int) -> MagicT,
    close: unsafe extern "C" fn(MagicT),
    load: unsafe extern "C" fn(MagicT, *const c_char) -> c_int,
    file: unsafe extern "C" fn(MagicT, *const c_char) -> *const c_char,
    buffer: unsafe extern "C" fn(MagicT, *const c_void, usize) -> *const c_char,
    error: unsafe extern "C" fn(MagicT) -> *const c_char,
    errno: unsafe extern "C" fn(MagicT) -> c_int,
    version: Option<unsafe extern "C" fn() -> c_int>,
}

impl Api {
    fn open(candidates: &[PathBuf]) -> Result<Self, LibraryError> {
        let mut last_error = String::from("no candidates");
        for candidate in candidates {
            let c_path = CString::new(candidate.as_os_str().as_bytes())
                .map_err(|_| LibraryError::InvalidPath(candidate.clone()))?;

            // SAFETY: `c_path` is a valid NUL-terminated string for the call.
            let handle =
                unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
            if handle.is_null() {
                last_error = dl_error();
                tracing::debug!(
                    library = %candidate.display(),
                    error = %last_error,
                    "dlopen failed"
                );
                continue;
            }

            // SAFETY: `handle` was just returned by a successful `dlopen`.
            return match unsafe { Self::resolve(handle) } {
                Ok(api) => {
                    tracing::debug!(library = %candidate.display(), "libmagic loaded");
                    Ok(api)
                }
                Err(err) => {
                    // SAFETY: no symbol from `handle` escaped the failed resolve.
                    unsafe { libc::dlclose(handle) };
                    Err(err)
                }
            };
        }

        Err(LibraryError::Open {
            tried: candidates
                .iter()
                .map(|c| c.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            message: last_error,
        })
    }

    /// # Safety
    ///
    /// `handle` must be a live handle returned by `dlopen`.
    unsafe fn resolve(handle: *mut c_void) -> Result<Self, LibraryError> {
        Ok(Self {
            handle,
            open: symbol(handle, c"magic_open")?,
            close: symbol(handle, c"magic_close")?,
            load: symbol(handle, c"magic_load")?,
            file: symbol(handle, c"magic_file")?,
            buffer: symbol(handle, c"magic_buffer")?,
            error: symbol(handle, c"magic_error")?,
            errno: symbol(handle, c"magic_errno")?,
            version: symbol(handle, c"magic_version").ok(),
        })
    }
}

impl Drop for Api {
    fn drop(&mut self) {
        // SAFETY: every cookie holds an `Arc<Api>`, so none outlives this.
        unsafe { libc::dlclose(self.handle) };
    }
}

/// # Safety
///
/// `T` must be the function pointer type matching the C symbol `name`.
unsafe fn symbol<T: Copy>(handle: *mut c_void, name: &CStr) -> Result<T, LibraryError> {
    debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*mut c_void>());
    let ptr = libc::dlsym(handle, name.as_ptr());
    if ptr.is_null() {
        return Err(LibraryError::MissingSymbol(name.to_string_lossy().into_owned()));
    }
    Ok(std::mem::transmute_copy::<*mut c_void, T>(&ptr))
}

fn dl_error() -> String {
    // SAFETY: `dlerror` returns NULL or a NUL-terminated thread-local string.
    unsafe {
        let message = libc::dlerror();
        if message.is_null() {
            "unknown dlopen error".to_string()
        } else {
            CStr::from_ptr(message).to_string_lossy().into_owned()
        }
    }
}

/// The system libmagic, loaded at run time.
#[derive(Clone)]
pub struct LibMagic {
    api: Arc<Api>,
}

impl LibMagic {
    /// Load libmagic from `library`, or from the platform's usual names.
    pub fn load(library: Option<&Path>) -> Result<Self, LibraryError> {
        let candidates: Vec<PathBuf> = match library {
            Some(path) => vec![path.to_path_buf()],
            None => LIBRARY_CANDIDATES.iter().map(PathBuf::from).collect(),
        };
        Ok(Self {
            api: Arc::new(Api::open(&candidates)?),
        })
    }

    /// The library's `MAGIC_VERSION`, e.g. `545` for 5.45.
    pub fn version(&self) -> Option<i32> {
        // SAFETY: `magic_version` takes no arguments and has no preconditions.
        self.api.version.map(|version| unsafe { version() })
    }
}

impl std::fmt::Debug for LibMagic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibMagic")
            .field("version", &self.version())
            .finish()
    }
}

fn view_flags(kind: ViewKind) -> c_int {
    COMMON_FLAGS
        | match kind {
            ViewKind::MimeType => MAGIC_MIME_TYPE,
            ViewKind::MimeEncoding => MAGIC_MIME_ENCODING,
            ViewKind::TypeName => MAGIC_NONE,
        }
}

impl Engine for LibMagic {
    type View = Cookie;

    fn open(&self, kind: ViewKind) -> Result<Cookie, EngineError> {
        // SAFETY: `magic_open` accepts any flag combination.
        let raw = unsafe { (self.api.open)(view_flags(kind)) };
        if raw.is_null() {
            let err = std::io::Error::last_os_error();
            return Err(EngineError::new(
                i64::from(err.raw_os_error().unwrap_or(0)),
                format!("magic_open failed: {err}"),
            ));
        }
        Ok(Cookie {
            api: Arc::clone(&self.api),
            raw,
        })
    }
}

/// An open libmagic handle; closed on drop.
pub struct Cookie {
    api: Arc<Api>,
    raw: MagicT,
}

impl Cookie {
    fn last_error(&self, errno: c_int) -> EngineError {
        // SAFETY: `self.raw` is a live cookie; the returned string is owned
        // by libmagic and copied before the next call on this cookie.
        let message = unsafe {
            let message = (self.api.error)(self.raw);
            if message.is_null() {
                "unknown libmagic error".to_string()
            } else {
                CStr::from_ptr(message).to_string_lossy().into_owned()
            }
        };
        EngineError::new(i64::from(errno), message)
    }
}

impl View for Cookie {
    fn load(&mut self, database: Option<&Path>) -> Result<(), EngineError> {
        let database = database.map(path_to_cstring).transpose()?;
        let database_ptr = database.as_ref().map_or(ptr::null(), |p| p.as_ptr());

        // SAFETY: `self.raw` is a live cookie and `database_ptr` is NULL or a
        // NUL-terminated string alive for the call.
        let rc = unsafe { (self.api.load)(self.raw, database_ptr) };
        if rc != 0 {
            // SAFETY: `self.raw` is a live cookie.
            let errno = unsafe { (self.api.errno)(self.raw) };
            return Err(self.last_error(errno));
        }
        Ok(())
    }

    fn classify(&mut self, input: Input<'_>) -> Result<String, EngineError> {
        let result = match input {
            Input::Path(path) => {
                let path = path_to_cstring(path)?;
                // SAFETY: `self.raw` is a live cookie and `path` is NUL-terminated.
                unsafe { (self.api.file)(self.raw, path.as_ptr()) }
            }
            // SAFETY: `self.raw` is a live cookie and the pointer/length pair
            // describes a valid slice.
            Input::Bytes(bytes) => unsafe {
                (self.api.buffer)(self.raw, bytes.as_ptr().cast(), bytes.len())
            },
        };

        // SAFETY: `self.raw` is a live cookie.
        let errno = unsafe { (self.api.errno)(self.raw) };
        if result.is_null() || errno > 0 {
            return Err(self.last_error(errno));
        }

        // SAFETY: non-NULL results are NUL-terminated strings owned by the cookie.
        Ok(unsafe { CStr::from_ptr(result) }
            .to_string_lossy()
            .into_owned())
    }
}

impl Drop for Cookie {
    fn drop(&mut self) {
        // SAFETY: `self.raw` came from `magic_open` and is closed exactly once.
        unsafe { (self.api.close)(self.raw) };
    }
}

fn path_to_cstring(path: &Path) -> Result<CString, EngineError> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| EngineError::new(i64::from(libc::EINVAL), "path contains a NUL byte"))
}
