//! Request builders and response parsing.
//!
//! # Design
//! Everything here is pure: `build_*` functions validate their arguments and
//! produce an `HttpRequest`, `parse_*` functions interpret an `HttpResponse`.
//! `Courier` strings them together around a `Transport`, and the same
//! functions are exercised directly by the tests.

use std::path::{Component, Path, PathBuf};

use crate::error::{require, RequestError, RequestResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody, JSON_CONTENT_TYPE, OCTET_STREAM};
use crate::multipart::MultipartForm;

/// Fixed part of the TFS upload endpoint. Only plain storage is used, so no
/// app key is sent; files are stored under their extension and never as
/// large files.
pub const TFS_UPLOAD_PATH: &str = "/v1/tfs?suffix=.&simple_name=1&large_file=0";

/// Quality value requesting the image at its original size.
pub const ORIGINAL_IMAGE_QUALITY: u32 = 100;

/// Append `?query` to `url` when a non-empty query is given.
pub fn with_query(url: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{url}?{q}"),
        _ => url.to_string(),
    }
}

pub fn build_get(url: &str, query: Option<&str>) -> RequestResult<HttpRequest> {
    require(url, "request url")?;
    Ok(HttpRequest {
        method: HttpMethod::Get,
        url: with_query(url, query),
        headers: Vec::new(),
        body: None,
    })
}

/// Build a POST, PUT or DELETE carrying a JSON document.
pub fn build_json(method: HttpMethod, url: &str, json: &str) -> RequestResult<HttpRequest> {
    require(url, "request url")?;
    require(json, "request body")?;
    Ok(HttpRequest {
        method,
        url: url.to_string(),
        headers: vec![("content-type".to_string(), JSON_CONTENT_TYPE.to_string())],
        body: Some(json.as_bytes().to_vec()),
    })
}

/// A file part of a multipart form, already read from disk.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl FilePart {
    pub fn read(path: &Path) -> RequestResult<Self> {
        let contents = std::fs::read(path)
            .map_err(|e| RequestError::transport(format!("reading {}", path.display()), e))?;
        Ok(Self {
            file_name: file_name_of(path),
            contents,
        })
    }
}

/// Check the argument shape of a multipart submission before touching disk.
pub fn validate_multipart(
    url: &str,
    text_names: usize,
    text_values: usize,
    file_names: usize,
    files: usize,
    media_type: &str,
) -> RequestResult<()> {
    require(url, "request url")?;
    require(media_type, "media type")?;
    if text_names != text_values {
        return Err(RequestError::LengthMismatch {
            group: "text",
            names: text_names,
            values: text_values,
        });
    }
    if file_names != files {
        return Err(RequestError::LengthMismatch {
            group: "file",
            names: file_names,
            values: files,
        });
    }
    Ok(())
}

pub fn build_multipart(
    url: &str,
    text_names: &[&str],
    text_values: &[&str],
    file_names: &[&str],
    files: &[FilePart],
    media_type: &str,
    form: MultipartForm,
) -> RequestResult<HttpRequest> {
    validate_multipart(
        url,
        text_names.len(),
        text_values.len(),
        file_names.len(),
        files.len(),
        media_type,
    )?;

    let mut form = form;
    for (name, value) in text_names.iter().zip(text_values) {
        form = form.text(name, value);
    }
    for (name, file) in file_names.iter().zip(files) {
        form = form.file(name, &file.file_name, media_type, &file.contents);
    }
    let content_type = form.content_type();

    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: url.to_string(),
        headers: vec![("content-type".to_string(), content_type)],
        body: Some(form.finish()),
    })
}

/// Build the raw upload to a TFS file store rooted at `base_url`.
pub fn build_upload(base_url: &str, contents: Vec<u8>) -> RequestResult<HttpRequest> {
    require(base_url, "upload address")?;
    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: format!("{base_url}{TFS_UPLOAD_PATH}"),
        headers: vec![("content-type".to_string(), OCTET_STREAM.to_string())],
        body: Some(contents),
    })
}

/// Build a raw image POST whose content type is derived from the extension.
pub fn build_image_submit(server_url: &str, file_path: &Path, contents: Vec<u8>) -> RequestResult<HttpRequest> {
    require(server_url, "image server address")?;
    let content_type = match file_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("image/{}", ext.to_ascii_lowercase()),
        _ => OCTET_STREAM.to_string(),
    };
    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: server_url.to_string(),
        headers: vec![("content-type".to_string(), content_type)],
        body: Some(contents),
    })
}

/// How an image should be scaled by the image server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Width(u32),
    WidthHeight(u32, u32),
    Original,
}

impl ImageSize {
    pub fn query(self) -> RequestResult<String> {
        match self {
            ImageSize::Width(w) => {
                check_dimension(w, "width")?;
                Ok(format!("w={w}"))
            }
            ImageSize::WidthHeight(w, h) => {
                check_dimension(w, "width")?;
                check_dimension(h, "height")?;
                Ok(format!("w={w}&h={h}"))
            }
            ImageSize::Original => Ok(format!("q={ORIGINAL_IMAGE_QUALITY}")),
        }
    }
}

fn check_dimension(value: u32, what: &str) -> RequestResult<()> {
    if value == 0 {
        return Err(RequestError::Validation(format!("image {what} must be greater than 0")));
    }
    Ok(())
}

/// The image server does not understand extensions, so the name is sent
/// without one.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

pub fn build_image_request(server_url: &str, file_name: &str, size: ImageSize) -> RequestResult<HttpRequest> {
    require(file_name, "image name")?;
    let query = size.query()?;
    require(server_url, "image server address")?;
    let url = format!("{server_url}{}", strip_extension(file_name));
    build_get(&url, Some(&query))
}

/// Path an image named `file_name` is saved to under `local_dir`. Names that
/// are absolute or climb out with `..` are rejected.
pub fn image_destination(local_dir: &Path, file_name: &str) -> RequestResult<PathBuf> {
    if local_dir.as_os_str().is_empty() {
        return Err(RequestError::Validation("image directory must not be empty".to_string()));
    }
    require(file_name, "image name")?;
    let escapes = Path::new(file_name)
        .components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_) | Component::ParentDir));
    if escapes {
        return Err(RequestError::Validation(format!(
            "image name {file_name:?} must stay inside the image directory"
        )));
    }
    Ok(local_dir.join(file_name))
}

/// Accept only a 200 response.
pub fn check_status(response: &HttpResponse) -> RequestResult<()> {
    if response.status == 200 {
        return Ok(());
    }
    Err(RequestError::Status {
        status: response.status,
    })
}

pub fn parse_body(response: HttpResponse) -> RequestResult<ResponseBody> {
    check_status(&response)?;
    Ok(response.body)
}

pub fn parse_text(response: HttpResponse) -> RequestResult<String> {
    parse_body(response)?.into_text()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
