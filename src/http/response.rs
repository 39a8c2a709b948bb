//! HTTP response building module
//!
//! Builders for every response the server sends, decoupled from the download logic.

use hyper::{Response, StatusCode};

use super::body::{self, ResponseBody};

pub const ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";

/// Validators and representation headers shared by 200/206/304 responses
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_type: &'static str,
    pub disposition: String,
    pub etag: String,
    pub last_modified: Option<String>,
    pub cache_control: String,
}

/// Build 200 OK attachment response
pub fn build_file_response(
    headers: &FileHeaders,
    data: ResponseBody,
    content_length: u64,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", content_length)
        .header("Content-Disposition", &headers.disposition)
        .header("Accept-Ranges", "bytes")
        .header("ETag", &headers.etag)
        .header("Cache-Control", &headers.cache_control);
    if let Some(last_modified) = &headers.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(data).unwrap_or_else(|e| {
        log_build_error("200", &e);
        build_500_response()
    })
}

/// Build 206 Partial Content response for bytes `start..=end` of `total_size`
pub fn build_partial_response(
    headers: &FileHeaders,
    data: ResponseBody,
    start: u64,
    end: u64,
    total_size: u64,
) -> Response<ResponseBody> {
    let content_length = end - start + 1;

    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Content-Disposition", &headers.disposition)
        .header("Accept-Ranges", "bytes")
        .header("ETag", &headers.etag)
        .header("Cache-Control", &headers.cache_control);
    if let Some(last_modified) = &headers.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(data).unwrap_or_else(|e| {
        log_build_error("206", &e);
        build_500_response()
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(headers: &FileHeaders) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", &headers.etag)
        .header("Cache-Control", &headers.cache_control);
    if let Some(last_modified) = &headers.last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(body::empty()).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(body::empty())
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain")
        .header("Allow", ALLOW_METHODS)
        .body(body::full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(body::full("405 Method Not Allowed"))
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOW_METHODS)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(body::empty())
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(body::full("416 Range Not Satisfiable"))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(body::full("416 Range Not Satisfiable"))
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build the plain-text response for an error status
pub fn build_error_response(status: StatusCode) -> Response<ResponseBody> {
    match status {
        StatusCode::NOT_FOUND => build_404_response(),
        StatusCode::METHOD_NOT_ALLOWED => build_405_response(),
        StatusCode::INTERNAL_SERVER_ERROR => build_500_response(),
        other => {
            let text = format!(
                "{} {}",
                other.as_u16(),
                other.canonical_reason().unwrap_or("Error")
            );
            build_text_response(other, text)
        }
    }
}

fn build_text_response(status: StatusCode, text: impl Into<String>) -> Response<ResponseBody> {
    let text = text.into();
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Content-Length", text.len())
        .body(body::full(text.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut response = Response::new(body::full(text));
            *response.status_mut() = status;
            response
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
