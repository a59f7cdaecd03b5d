use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, image_bytes, Echo, FormSummary, Stored, ORIGINAL_IMAGE_LEN};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(body.to_string())
        .unwrap()
}

// --- items ---

#[tokio::test]
async fn item_by_id() {
    let resp = app().oneshot(get("/items?id=5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, &br#"{"id":5}"#[..]);
}

#[tokio::test]
async fn item_without_id_is_404() {
    let resp = app().oneshot(get("/items")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- status passthrough ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    for code in [201u16, 302, 404, 503] {
        let resp = app().oneshot(get(&format!("/status/{code}"))).await.unwrap();
        assert_eq!(resp.status().as_u16(), code);
    }
}

// --- echo ---

#[tokio::test]
async fn echo_returns_method_and_body() {
    for method in ["POST", "PUT", "DELETE"] {
        let resp = app()
            .oneshot(json_request(method, "/echo", r#"{"title":"x"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let echo: Echo = body_json(resp).await;
        assert_eq!(echo.method, method);
        assert_eq!(echo.received["title"], "x");
    }
}

#[tokio::test]
async fn echo_requires_json_content_type() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(http::header::CONTENT_TYPE, "text/plain")
                .body("{}".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- multipart ---

#[tokio::test]
async fn form_summarises_fields_and_files() {
    let body = "--B\r\n\
        Content-Disposition: form-data; name=\"user\"\r\n\
        \r\n\
        alice\r\n\
        --B\r\n\
        Content-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\n\
        Content-Type: image/png\r\n\
        \r\n\
        PNG\r\n\
        --B--\r\n";
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=B")
                .body(body.to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: FormSummary = body_json(resp).await;
    assert_eq!(summary.fields["user"], "alice");
    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.files[0].file_name, "a.png");
    assert_eq!(summary.files[0].content_type, "image/png");
    assert_eq!(summary.files[0].size, 3);
}

// --- tfs ---

#[tokio::test]
async fn tfs_accepts_fixed_query() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/tfs?suffix=.&simple_name=1&large_file=0")
                .header(http::header::CONTENT_TYPE, "application/octet-stream")
                .body("abcd".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stored: Stored = body_json(resp).await;
    assert_eq!(stored.size, 4);
    assert_eq!(stored.content_type, "application/octet-stream");
}

#[tokio::test]
async fn tfs_rejects_large_file_flag() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/tfs?suffix=.&simple_name=1&large_file=1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- images ---

#[tokio::test]
async fn image_sized_by_width_and_height() {
    let resp = app().oneshot(get("/images/photo?w=20&h=3")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, image_bytes(60));
}

#[tokio::test]
async fn original_image_is_larger_than_a_buffer() {
    let resp = app().oneshot(get("/images/photo?q=100")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.len(), ORIGINAL_IMAGE_LEN);
}

#[tokio::test]
async fn image_with_extension_is_404() {
    let resp = app().oneshot(get("/images/photo.png?w=20")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_without_size_is_400() {
    let resp = app().oneshot(get("/images/photo")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
