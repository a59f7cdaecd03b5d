use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Size of the body served for an original-quality image request. Larger than
/// one 50 KiB copy buffer.
pub const ORIGINAL_IMAGE_LEN: usize = 64 * 1024 + 1;

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub q: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TfsQuery {
    pub suffix: String,
    pub simple_name: u8,
    pub large_file: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub received: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormSummary {
    pub fields: BTreeMap<String, String>,
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stored {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

pub fn app() -> Router {
    Router::new()
        .route("/items", get(get_item))
        .route("/status/{code}", get(status).post(status).put(status).delete(status))
        .route("/echo", post(echo).put(echo).delete(echo))
        .route("/form", post(form))
        .route("/v1/tfs", post(tfs_upload))
        .route("/submit", post(submit))
        .route("/images/{name}", get(image))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Deterministic image payload of `len` bytes.
pub fn image_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

async fn get_item(Query(query): Query<ItemQuery>) -> Result<Json<serde_json::Value>, StatusCode> {
    let id = query.id.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({ "id": id })))
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, format!("status {code}"))
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Result<Json<Echo>, StatusCode> {
    if !content_type(&headers).starts_with("application/json") {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
    let received = serde_json::from_str(&body).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
    Ok(Json(Echo {
        method: method.to_string(),
        received,
    }))
}

async fn form(mut multipart: Multipart) -> Result<Json<FormSummary>, StatusCode> {
    let mut summary = FormSummary::default();
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                summary.files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    size: data.len(),
                });
            }
            None => {
                let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                summary.fields.insert(name, value);
            }
        }
    }
    Ok(Json(summary))
}

async fn tfs_upload(Query(query): Query<TfsQuery>, headers: HeaderMap, body: Bytes) -> Result<Json<Stored>, StatusCode> {
    if query.suffix != "." || query.simple_name != 1 || query.large_file != 0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(Stored {
        name: format!("T1{:08x}.", body.len()),
        content_type: content_type(&headers),
        size: body.len(),
    }))
}

async fn submit(headers: HeaderMap, body: Bytes) -> Json<Stored> {
    Json(Stored {
        name: "submitted".to_string(),
        content_type: content_type(&headers),
        size: body.len(),
    })
}

async fn image(Path(name): Path<String>, Query(query): Query<ImageQuery>) -> Result<Vec<u8>, StatusCode> {
    // The image store addresses files by stem only.
    if name.contains('.') {
        return Err(StatusCode::NOT_FOUND);
    }
    let len = match (query.w, query.h, query.q) {
        (Some(w), Some(h), None) if w > 0 && h > 0 => (w as usize) * (h as usize),
        (Some(w), None, None) if w > 0 => w as usize,
        (None, None, Some(100)) => ORIGINAL_IMAGE_LEN,
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    Ok(image_bytes(len))
}
