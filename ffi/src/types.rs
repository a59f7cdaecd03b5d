//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Every operation returns one heap-allocated `FfiCourierResult`. The payload
//! is tagged by `FfiDataTag`: text and paths travel as NUL-terminated C
//! strings, raw bodies as an `FfiBytes` pointer/length pair. Conversion
//! helpers live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::path::Path;

use courier_core::{Courier, RequestError};

/// Opaque handle to a `Courier`. C callers receive a pointer to this and pass
/// it back into every FFI function.
pub struct FfiCourier {
    pub(crate) inner: Courier,
}

/// Error codes returned in `FfiCourierResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Validation = 1,
    LengthMismatch = 2,
    AlreadyExists = 3,
    Transport = 4,
    Status = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tag that tells `courier_free_result` what `FfiCourierResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is a `char*` holding the response text.
    Text = 1,
    /// `data` is an `FfiBytes*` holding the raw response body.
    Bytes = 2,
    /// `data` is a `char*` holding the path of a written file.
    Path = 3,
    /// `data` is a `uint64_t*` holding a byte count.
    Count = 4,
}

/// A byte buffer owned by this library.
#[repr(C)]
pub struct FfiBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

/// Result envelope for every operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload described by `data_tag`. On failure `data` is null,
/// `error_message` is a human-readable C string, and `http_status` is set
/// when the server answered with a non-200 code.
#[repr(C)]
pub struct FfiCourierResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

/// Build a C string, dropping interior NULs rather than failing.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> CString {
    let mut bytes = s.into();
    bytes.retain(|&b| b != 0);
    CString::new(bytes).unwrap_or_default()
}

impl FfiCourierResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, http_status: u16, data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiCourierResult {
            error_code,
            error_message,
            http_status,
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_text(text: String) -> *mut Self {
        let data = c_string(text).into_raw() as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 200, FfiDataTag::Text, data)
    }

    pub(crate) fn ok_bytes(bytes: Vec<u8>) -> *mut Self {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut u8;
        let data = Box::into_raw(Box::new(FfiBytes { ptr, len })) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 200, FfiDataTag::Bytes, data)
    }

    pub(crate) fn ok_path(path: &Path) -> *mut Self {
        let data = c_string(path.to_string_lossy().into_owned()).into_raw() as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 200, FfiDataTag::Path, data)
    }

    pub(crate) fn ok_count(count: u64) -> *mut Self {
        let data = Box::into_raw(Box::new(count)) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, FfiDataTag::Count, data)
    }

    /// Build an error result from a `RequestError`.
    pub(crate) fn from_error(err: RequestError) -> *mut Self {
        let (error_code, http_status) = match &err {
            RequestError::Validation(_) => (FfiErrorCode::Validation, 0),
            RequestError::LengthMismatch { .. } => (FfiErrorCode::LengthMismatch, 0),
            RequestError::AlreadyExists(_) => (FfiErrorCode::AlreadyExists, 0),
            RequestError::Transport { .. } => (FfiErrorCode::Transport, 0),
            RequestError::Status { status } => (FfiErrorCode::Status, *status),
        };
        let msg = c_string(err.to_string()).into_raw();
        Self::boxed(error_code, msg, http_status, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = c_string(format!("null argument: {name}")).into_raw();
        Self::boxed(FfiErrorCode::NullArg, msg, 0, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for an argument that is not valid UTF-8.
    pub(crate) fn bad_utf8(name: &str) -> *mut Self {
        let msg = c_string(format!("argument is not valid UTF-8: {name}")).into_raw();
        Self::boxed(FfiErrorCode::Validation, msg, 0, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        let msg = c_string(msg).into_raw();
        Self::boxed(FfiErrorCode::Panic, msg, 0, FfiDataTag::None, std::ptr::null_mut())
    }
}
