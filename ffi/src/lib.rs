//! C-ABI wrapper around `courier-core`.
//!
//! # Overview
//! Exposes every `Courier` operation through `extern "C"` functions so a
//! mobile host (Swift, Kotlin/JNI, or plain C) can issue requests, upload
//! files and download images through one shared Rust client.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One `FfiCourierResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - A null or non-UTF-8 argument is reported in the result, never
//!   dereferenced.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `courier_free_*` function.

pub mod types;

use std::ffi::{CStr, CString};
use std::fs::File;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use courier_core::{copy_stream, ClientConfig, Courier, RequestError, RequestResult};
use log::{debug, warn};

use types::*;

type Outcome = Result<*mut FfiCourierResult, *mut FfiCourierResult>;

/// Run `op`, turning an early-return error or a panic into a result pointer.
fn guarded(name: &str, op: impl FnOnce() -> Outcome) -> *mut FfiCourierResult {
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(result)) | Ok(Err(result)) => result,
        Err(_) => FfiCourierResult::panic(&format!("panic in {name}")),
    }
}

fn client_arg<'a>(client: *const FfiCourier) -> Result<&'a FfiCourier, *mut FfiCourierResult> {
    unsafe { client.as_ref() }.ok_or_else(|| FfiCourierResult::null_arg("client"))
}

fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiCourierResult> {
    if ptr.is_null() {
        return Err(FfiCourierResult::null_arg(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiCourierResult::bad_utf8(name))
}

/// Like `str_arg`, but null means "absent".
fn opt_str_arg<'a>(ptr: *const c_char, name: &str) -> Result<Option<&'a str>, *mut FfiCourierResult> {
    if ptr.is_null() {
        return Ok(None);
    }
    str_arg(ptr, name).map(Some)
}

/// Read `len` C strings from `ptr`. A null array is only accepted when empty.
fn str_array_arg<'a>(ptr: *const *const c_char, len: usize, name: &str) -> Result<Vec<&'a str>, *mut FfiCourierResult> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(FfiCourierResult::null_arg(name));
    }
    let items = unsafe { std::slice::from_raw_parts(ptr, len) };
    items.iter().map(|&item| str_arg(item, name)).collect()
}

fn text_result(result: RequestResult<String>) -> *mut FfiCourierResult {
    match result {
        Ok(text) => FfiCourierResult::ok_text(text),
        Err(e) => FfiCourierResult::from_error(e),
    }
}

fn path_result(result: RequestResult<std::path::PathBuf>) -> *mut FfiCourierResult {
    match result {
        Ok(path) => FfiCourierResult::ok_path(&path),
        Err(e) => FfiCourierResult::from_error(e),
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client. `config_json` may be null for defaults, or a JSON object
/// with any of `timeout_ms`, `user_agent`, `max_redirects`.
///
/// Returns null if the configuration cannot be parsed or an internal panic
/// occurs. The caller must free the returned pointer with `courier_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_client_new(config_json: *const c_char) -> *mut FfiCourier {
    catch_unwind(|| {
        let config = if config_json.is_null() {
            ClientConfig::default()
        } else {
            let json = unsafe { CStr::from_ptr(config_json) }.to_str().unwrap_or("");
            match ClientConfig::from_json(json) {
                Ok(config) => config,
                Err(e) => {
                    warn!("rejecting client config: {e}");
                    return std::ptr::null_mut();
                }
            }
        };
        debug!("creating client with {config:?}");
        Box::into_raw(Box::new(FfiCourier {
            inner: Courier::new(&config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `courier_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn courier_client_free(client: *mut FfiCourier) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// GET `url?query`. `query` may be null. Result carries `Text`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_get(client: *const FfiCourier, url: *const c_char, query: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_get", || {
        let client = client_arg(client)?;
        let url = str_arg(url, "url")?;
        let query = opt_str_arg(query, "query")?;
        Ok(text_result(client.inner.get(url, query)))
    })
}

/// GET `url?query` and return the raw body. Result carries `Bytes`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_get_bytes(client: *const FfiCourier, url: *const c_char, query: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_get_bytes", || {
        let client = client_arg(client)?;
        let url = str_arg(url, "url")?;
        let query = opt_str_arg(query, "query")?;
        let result = client.inner.get_bytes(url, query).and_then(|body| body.into_bytes());
        Ok(match result {
            Ok(bytes) => FfiCourierResult::ok_bytes(bytes),
            Err(e) => FfiCourierResult::from_error(e),
        })
    })
}

/// POST a JSON document. Result carries `Text`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_post(client: *const FfiCourier, url: *const c_char, json: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_post", || {
        let client = client_arg(client)?;
        Ok(text_result(client.inner.post(str_arg(url, "url")?, str_arg(json, "json")?)))
    })
}

/// PUT a JSON document. Result carries `Text`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_put(client: *const FfiCourier, url: *const c_char, json: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_put", || {
        let client = client_arg(client)?;
        Ok(text_result(client.inner.put(str_arg(url, "url")?, str_arg(json, "json")?)))
    })
}

/// DELETE with a JSON document. Result carries `Text`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_delete(client: *const FfiCourier, url: *const c_char, json: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_delete", || {
        let client = client_arg(client)?;
        Ok(text_result(client.inner.delete(str_arg(url, "url")?, str_arg(json, "json")?)))
    })
}

/// POST a multipart form. Each array comes with its own length so a
/// mismatch is reported as `LengthMismatch` rather than read out of bounds.
/// Result carries `Text`.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub extern "C" fn courier_post_multipart(
    client: *const FfiCourier,
    url: *const c_char,
    text_names: *const *const c_char,
    text_names_len: usize,
    text_values: *const *const c_char,
    text_values_len: usize,
    file_names: *const *const c_char,
    file_names_len: usize,
    file_paths: *const *const c_char,
    file_paths_len: usize,
    media_type: *const c_char,
) -> *mut FfiCourierResult {
    guarded("courier_post_multipart", || {
        let client = client_arg(client)?;
        let url = str_arg(url, "url")?;
        let text_names = str_array_arg(text_names, text_names_len, "text_names")?;
        let text_values = str_array_arg(text_values, text_values_len, "text_values")?;
        let file_names = str_array_arg(file_names, file_names_len, "file_names")?;
        let file_paths = str_array_arg(file_paths, file_paths_len, "file_paths")?;
        let media_type = str_arg(media_type, "media_type")?;
        Ok(text_result(client.inner.post_multipart(
            url,
            &text_names,
            &text_values,
            &file_names,
            file_paths.as_slice(),
            media_type,
        )))
    })
}

/// POST a file to the TFS store at `base_url`. Result carries `Text`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_upload_file(client: *const FfiCourier, base_url: *const c_char, file_path: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_upload_file", || {
        let client = client_arg(client)?;
        let base_url = str_arg(base_url, "base_url")?;
        let file_path = str_arg(file_path, "file_path")?;
        Ok(text_result(client.inner.upload_file(base_url, file_path)))
    })
}

/// POST raw image bytes to `server_url`. Result carries `Text`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_submit_image(client: *const FfiCourier, server_url: *const c_char, file_path: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_submit_image", || {
        let client = client_arg(client)?;
        let server_url = str_arg(server_url, "server_url")?;
        let file_path = str_arg(file_path, "file_path")?;
        Ok(text_result(client.inner.submit_image(server_url, file_path)))
    })
}

/// Download a resized image into `local_dir`. A `height` of 0 requests the
/// width only. Result carries `Path`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_download_image(
    client: *const FfiCourier,
    local_dir: *const c_char,
    file_name: *const c_char,
    server_url: *const c_char,
    width: u32,
    height: u32,
) -> *mut FfiCourierResult {
    guarded("courier_download_image", || {
        let client = client_arg(client)?;
        let local_dir = str_arg(local_dir, "local_dir")?;
        let file_name = str_arg(file_name, "file_name")?;
        let server_url = str_arg(server_url, "server_url")?;
        let height = (height > 0).then_some(height);
        Ok(path_result(client.inner.download_image(local_dir, file_name, server_url, width, height)))
    })
}

/// Download an image at original size into `local_dir`. Result carries `Path`.
#[unsafe(no_mangle)]
pub extern "C" fn courier_download_original_image(
    client: *const FfiCourier,
    local_dir: *const c_char,
    file_name: *const c_char,
    server_url: *const c_char,
) -> *mut FfiCourierResult {
    guarded("courier_download_original_image", || {
        let client = client_arg(client)?;
        let local_dir = str_arg(local_dir, "local_dir")?;
        let file_name = str_arg(file_name, "file_name")?;
        let server_url = str_arg(server_url, "server_url")?;
        Ok(path_result(client.inner.download_original_image(local_dir, file_name, server_url)))
    })
}

/// Copy `src_path` to `dst_path`, replacing any existing destination.
/// Result carries `Count` (bytes copied).
#[unsafe(no_mangle)]
pub extern "C" fn courier_copy_file(src_path: *const c_char, dst_path: *const c_char) -> *mut FfiCourierResult {
    guarded("courier_copy_file", || {
        let src_path = str_arg(src_path, "src_path")?;
        let dst_path = str_arg(dst_path, "dst_path")?;
        let result = File::open(src_path)
            .map_err(|e| RequestError::Transport {
                context: format!("opening {src_path}"),
                source: e.into(),
            })
            .and_then(|input| {
                let output = File::create(dst_path).map_err(|e| RequestError::Transport {
                    context: format!("creating {dst_path}"),
                    source: e.into(),
                })?;
                copy_stream(input, output)
            });
        Ok(match result {
            Ok(count) => FfiCourierResult::ok_count(count),
            Err(e) => FfiCourierResult::from_error(e),
        })
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiCourierResult` returned by any operation. Safe to call with
/// null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn courier_free_result(result: *mut FfiCourierResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Text | FfiDataTag::Path => {
                drop(unsafe { CString::from_raw(result.data as *mut c_char) });
            }
            FfiDataTag::Bytes => {
                let bytes = unsafe { Box::from_raw(result.data as *mut FfiBytes) };
                if !bytes.ptr.is_null() {
                    let slice = std::ptr::slice_from_raw_parts_mut(bytes.ptr, bytes.len);
                    drop(unsafe { Box::from_raw(slice) });
                }
            }
            FfiDataTag::Count => {
                drop(unsafe { Box::from_raw(result.data as *mut u64) });
            }
            FfiDataTag::None => {}
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn courier_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { CString::from_raw(s) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn new_client() -> *mut FfiCourier {
        let client = courier_client_new(std::ptr::null());
        assert!(!client.is_null());
        client
    }

    fn message(r: &FfiCourierResult) -> String {
        unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap().to_string()
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client();
        courier_client_free(client);
    }

    #[test]
    fn client_new_with_json_config() {
        let config = CString::new(r#"{"timeout_ms":5000,"user_agent":"app/1.0"}"#).unwrap();
        let client = courier_client_new(config.as_ptr());
        assert!(!client.is_null());
        courier_client_free(client);
    }

    #[test]
    fn client_new_bad_config_returns_null() {
        let config = CString::new("{not json").unwrap();
        assert!(courier_client_new(config.as_ptr()).is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        courier_client_free(std::ptr::null_mut());
    }

    #[test]
    fn get_null_client_returns_null_arg() {
        let url = CString::new("http://localhost:3000").unwrap();
        let result = courier_get(std::ptr::null(), url.as_ptr(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(message(r), "null argument: client");
        assert!(r.data.is_null());
        courier_free_result(result);
    }

    #[test]
    fn get_null_url_returns_null_arg() {
        let client = new_client();
        let result = courier_get(client, std::ptr::null(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        courier_free_result(result);
        courier_client_free(client);
    }

    #[test]
    fn empty_url_is_validation_error() {
        let client = new_client();
        let empty = CString::new("").unwrap();
        let body = CString::new("{}").unwrap();
        for result in [
            courier_get(client, empty.as_ptr(), std::ptr::null()),
            courier_post(client, empty.as_ptr(), body.as_ptr()),
            courier_put(client, empty.as_ptr(), body.as_ptr()),
            courier_delete(client, empty.as_ptr(), body.as_ptr()),
        ] {
            let r = unsafe { &*result };
            assert_eq!(r.error_code, FfiErrorCode::Validation);
            assert_eq!(r.http_status, 0);
            courier_free_result(result);
        }
        courier_client_free(client);
    }

    #[test]
    fn invalid_utf8_is_validation_error() {
        let client = new_client();
        let bad = [0xffu8, 0xfe, 0];
        let result = courier_get(client, bad.as_ptr() as *const c_char, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Validation);
        courier_free_result(result);
        courier_client_free(client);
    }

    #[test]
    fn multipart_length_mismatch() {
        let client = new_client();
        let url = CString::new("http://localhost:1/form").unwrap();
        let name = CString::new("user").unwrap();
        let names = [name.as_ptr()];
        let media = CString::new("image/png").unwrap();
        let result = courier_post_multipart(
            client,
            url.as_ptr(),
            names.as_ptr(),
            names.len(),
            std::ptr::null(),
            0,
            std::ptr::null(),
            0,
            std::ptr::null(),
            0,
            media.as_ptr(),
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::LengthMismatch);
        courier_free_result(result);
        courier_client_free(client);
    }

    #[test]
    fn multipart_null_array_with_length_is_null_arg() {
        let client = new_client();
        let url = CString::new("http://localhost:1/form").unwrap();
        let media = CString::new("image/png").unwrap();
        let result = courier_post_multipart(
            client,
            url.as_ptr(),
            std::ptr::null(),
            2,
            std::ptr::null(),
            2,
            std::ptr::null(),
            0,
            std::ptr::null(),
            0,
            media.as_ptr(),
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        courier_free_result(result);
        courier_client_free(client);
    }

    #[test]
    fn download_existing_file_is_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.png"), b"old").unwrap();

        let client = new_client();
        let local = CString::new(dir.path().to_str().unwrap()).unwrap();
        let name = CString::new("photo.png").unwrap();
        let server = CString::new("http://localhost:1/images/").unwrap();
        let result = courier_download_image(client, local.as_ptr(), name.as_ptr(), server.as_ptr(), 100, 0);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::AlreadyExists);
        courier_free_result(result);
        courier_client_free(client);
    }

    #[test]
    fn copy_file_counts_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        let data: Vec<u8> = (0..60_000u32).map(|i| (i % 7) as u8).collect();
        std::fs::write(&src, &data).unwrap();

        let src_c = CString::new(src.to_str().unwrap()).unwrap();
        let dst_c = CString::new(dst.to_str().unwrap()).unwrap();
        let result = courier_copy_file(src_c.as_ptr(), dst_c.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::Count);
        assert_eq!(unsafe { *(r.data as *const u64) }, 60_000);
        assert_eq!(std::fs::read(&dst).unwrap(), data);
        courier_free_result(result);
    }

    #[test]
    fn copy_file_null_is_null_arg() {
        let dst = CString::new("/tmp/x").unwrap();
        let result = courier_copy_file(std::ptr::null(), dst.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        courier_free_result(result);
    }

    #[test]
    fn copy_file_missing_source_is_transport() {
        let dir = tempfile::tempdir().unwrap();
        let src = CString::new(dir.path().join("missing").to_str().unwrap()).unwrap();
        let dst = CString::new(dir.path().join("out").to_str().unwrap()).unwrap();
        let result = courier_copy_file(src.as_ptr(), dst.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Transport);
        courier_free_result(result);
    }

    #[test]
    fn free_result_null_is_safe() {
        courier_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        courier_free_string(std::ptr::null_mut());
    }
}
