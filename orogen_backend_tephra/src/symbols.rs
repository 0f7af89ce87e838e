// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolved `HdTephra` entry points.
//!
//! All required symbols are resolved and type-checked once, at load time.
//! The function pointers are copied out of their [`libloading::Symbol`]s and
//! stored next to the owning [`Library`], which keeps them valid for the
//! lifetime of the [`TephraApi`].

use std::ffi::{CString, OsStr, c_char};
use std::fmt;

use libloading::{Library, library_filename};
use orogen_core::engine::EngineOps;
use orogen_core::request::{PickRect, RequestId};

use crate::router;

/// Base name of the Tephra renderer library (`HdTephra.dll`,
/// `libHdTephra.so`, `libHdTephra.dylib`).
pub const LIBRARY_NAME: &str = "HdTephra";

/// `hdtephra_worldpos_request(request_id, x, y)`
type WorldPosRequestFn = unsafe extern "C-unwind" fn(i32, i32, i32);
/// Completion callback for world-position requests:
/// `(request_id, pixel_x, pixel_y, world_x, world_y, world_z)`.
pub(crate) type WorldPosCallback = unsafe extern "C-unwind" fn(i32, i32, i32, f32, f32, f32);
/// `hdtephra_worldpos_setcallback(callback)`
type WorldPosSetCallbackFn = unsafe extern "C-unwind" fn(WorldPosCallback);
/// `hdtephra_objectpick_request(x0, y0, x1, y1)`
type ObjectPickRequestFn = unsafe extern "C-unwind" fn(u32, u32, u32, u32);
/// Completion callback for object-picking requests: `(paths, count)`.
pub(crate) type ObjectPickCallback = unsafe extern "C-unwind" fn(*const *const c_char, u32);
/// `hdtephra_objectpick_setcallback(callback)`
type ObjectPickSetCallbackFn = unsafe extern "C-unwind" fn(ObjectPickCallback);
/// `hdtephra_objectpick_highlight(paths, count)`
type HighlightFn = unsafe extern "C-unwind" fn(*const *const c_char, u32);
/// `hdtephra_setconfigvar(key, value)`
type SetConfigVarFn = unsafe extern "C-unwind" fn(*const c_char, *const c_char);

/// Errors from [`TephraApi::load`].
#[derive(Debug)]
pub enum ApiLoadError {
    /// The `HdTephra` library could not be located or opened.
    LibraryNotFound(libloading::Error),
    /// The library is present but lacks a required entry point.
    MissingSymbol {
        /// Name of the entry point that failed to resolve.
        name: &'static str,
        /// Underlying loader error.
        source: libloading::Error,
    },
}

impl fmt::Display for ApiLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LibraryNotFound(err) => {
                write!(f, "failed to load the {LIBRARY_NAME} library: {err}")
            }
            Self::MissingSymbol { name, .. } => {
                write!(f, "{LIBRARY_NAME} does not export required symbol `{name}`")
            }
        }
    }
}

impl std::error::Error for ApiLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LibraryNotFound(err) | Self::MissingSymbol { source: err, .. } => Some(err),
        }
    }
}

/// The resolved Tephra entry points.
///
/// Implements [`EngineOps`]; the binding owns one of these (or none, in the
/// disabled state) and never touches the symbols directly.
pub struct TephraApi {
    worldpos_request: WorldPosRequestFn,
    worldpos_setcallback: WorldPosSetCallbackFn,
    objectpick_request: ObjectPickRequestFn,
    objectpick_setcallback: ObjectPickSetCallbackFn,
    objectpick_highlight: HighlightFn,
    setconfigvar: SetConfigVarFn,
    /// Keeps the resolved function pointers valid. Dropped last.
    _library: Library,
}

impl fmt::Debug for TephraApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TephraApi").finish_non_exhaustive()
    }
}

impl TephraApi {
    /// Loads the Tephra library under its platform-decorated name and
    /// resolves every required entry point.
    ///
    /// # Errors
    ///
    /// Returns [`ApiLoadError`] when the library is absent or any symbol is
    /// missing. Neither case is fatal to the host; callers are expected to
    /// fall back to a disabled binding.
    pub fn load() -> Result<Self, ApiLoadError> {
        Self::load_from(library_filename(LIBRARY_NAME))
    }

    /// Loads a Tephra-compatible library from an explicit path.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::load`].
    pub fn load_from(path: impl AsRef<OsStr>) -> Result<Self, ApiLoadError> {
        // SAFETY: loading the renderer library runs its initializers; the
        // HdTephra ABI contract is that library initialization has no
        // preconditions on the caller.
        let library =
            unsafe { Library::new(path.as_ref()) }.map_err(ApiLoadError::LibraryNotFound)?;

        Ok(Self {
            worldpos_request: resolve(&library, "hdtephra_worldpos_request")?,
            worldpos_setcallback: resolve(&library, "hdtephra_worldpos_setcallback")?,
            objectpick_request: resolve(&library, "hdtephra_objectpick_request")?,
            objectpick_setcallback: resolve(&library, "hdtephra_objectpick_setcallback")?,
            objectpick_highlight: resolve(&library, "hdtephra_objectpick_highlight")?,
            setconfigvar: resolve(&library, "hdtephra_setconfigvar")?,
            _library: library,
        })
    }

    /// Registers the process-wide completion trampolines with the engine.
    ///
    /// Called once per binding construction, after routing is in place.
    pub(crate) fn install_callbacks(&self) {
        // SAFETY: the trampolines match the callback signatures the engine
        // expects and remain valid for the life of the process.
        unsafe {
            (self.worldpos_setcallback)(router::world_position_trampoline);
            (self.objectpick_setcallback)(router::object_picking_trampoline);
        }
    }
}

impl EngineOps for TephraApi {
    fn request_world_position(&self, id: RequestId, x: i32, y: i32) {
        // SAFETY: fire-and-forget; the engine copies its arguments.
        unsafe { (self.worldpos_request)(id.0, x, y) }
    }

    fn request_object_picking(&self, rect: PickRect) {
        // SAFETY: fire-and-forget; the engine copies its arguments.
        unsafe { (self.objectpick_request)(rect.x0, rect.y0, rect.x1, rect.y1) }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "highlight sets are tiny; the path count always fits in u32"
    )]
    fn highlight_paths(&self, paths: &[String]) {
        let (storage, pointers) = marshal_string_array(paths);
        // SAFETY: `pointers` holds `storage.len()` valid NUL-terminated
        // strings; the engine copies them before returning.
        unsafe { (self.objectpick_highlight)(pointers.as_ptr(), pointers.len() as u32) }
        drop(storage);
    }

    fn set_config_variable(&self, key: &str, value: &str) {
        let (Ok(key), Ok(value)) = (CString::new(key), CString::new(value)) else {
            log::error!("set_config_variable: key or value contains an interior NUL byte");
            return;
        };
        // SAFETY: both pointers are valid NUL-terminated strings; the engine
        // copies them before returning.
        unsafe { (self.setconfigvar)(key.as_ptr(), value.as_ptr()) }
    }
}

/// Copies one typed entry point out of the library.
fn resolve<T: Copy>(library: &Library, name: &'static str) -> Result<T, ApiLoadError> {
    // SAFETY: the signature `T` is taken from the published HdTephra ABI;
    // a mismatch would be a build-time error in the engine, not here.
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|symbol| *symbol)
        .map_err(|source| ApiLoadError::MissingSymbol { name, source })
}

/// Builds the `const char**` view of `paths`.
///
/// Returns the owned `CString` storage together with the pointer array; the
/// storage must outlive the native call. Paths with interior NUL bytes
/// cannot cross the boundary and are skipped with a warning.
fn marshal_string_array(paths: &[String]) -> (Vec<CString>, Vec<*const c_char>) {
    let storage: Vec<CString> = paths
        .iter()
        .filter_map(|path| CString::new(path.as_str()).ok())
        .collect();
    if storage.len() != paths.len() {
        log::warn!(
            "highlight_paths: skipped {} path(s) containing interior NUL bytes",
            paths.len() - storage.len()
        );
    }
    let pointers: Vec<*const c_char> = storage.iter().map(|s| s.as_ptr()).collect();
    (storage, pointers)
}

#[cfg(test)]
mod tests {
    use super::{ApiLoadError, TephraApi, marshal_string_array};

    #[test]
    fn load_from_missing_path_reports_not_found() {
        let err = TephraApi::load_from("/nonexistent/path/to/HdTephra.so")
            .err()
            .expect("loading a nonexistent library must fail");
        assert!(matches!(err, ApiLoadError::LibraryNotFound(_)));
        // The message should name the library for the disabled-state warning.
        assert!(err.to_string().contains("HdTephra"));
    }

    #[test]
    fn marshal_skips_interior_nul() {
        let paths = vec!["/a".to_owned(), "bad\0path".to_owned(), "/b".to_owned()];
        let (storage, pointers) = marshal_string_array(&paths);
        assert_eq!(storage.len(), 2);
        assert_eq!(pointers.len(), 2);
    }
}
