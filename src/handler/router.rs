//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! matching the download route, and access logging.

use crate::config::AppState;
use crate::error::DownloadError;
use crate::handler::download;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed to serve a download
pub struct RequestContext<'a> {
    /// Decoded filename, relative to the download directory
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub if_range: Option<String>,
    pub range_header: Option<String>,
}

impl<'a> RequestContext<'a> {
    fn new(path: &'a str, parts: &Parts) -> Self {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            path,
            is_head: parts.method == Method::HEAD,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
            if_range: header("if-range"),
            range_header: header("range"),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let response = route_request(&parts, &state).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::from_request(
            &peer_addr,
            &parts.method,
            &parts.uri,
            parts.version,
            &parts.headers,
        );
        entry.status = response.status().as_u16();
        entry.body_bytes = if parts.method == Method::HEAD {
            0
        } else {
            content_length(&response)
        };
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
async fn route_request(parts: &Parts, state: &AppState) -> Response<ResponseBody> {
    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&parts.method) {
        return resp;
    }

    // 2. Only `{prefix}/<filename>` is served
    let path = parts.uri.path();
    let Some(raw_filename) = match_download_route(path, state.config.route_prefix()) else {
        logger::log_debug(&format!("No route for {path}"));
        return http::build_404_response();
    };

    // 3. Decode the filename and hand it to the download handler
    let filename = match decode_filename(raw_filename) {
        Ok(name) => name,
        Err(e) => {
            logger::log_debug(&format!("Rejected {path}: {e}"));
            return http::build_error_response(e.status());
        }
    };

    let ctx = RequestContext::new(&filename, parts);
    download::serve_download(
        &ctx,
        &state.download_root,
        &state.config.download.cache_control,
    )
    .await
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Raw (still percent-encoded) filename if `path` is `{prefix}/<filename>`
pub fn match_download_route<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    path.strip_prefix(prefix)?
        .strip_prefix('/')
        .filter(|rest| !rest.is_empty())
}

/// Percent-decode a filename taken from the request path
///
/// `%2F` becomes a separator just like a literal `/`; `+` stays `+`.
pub fn decode_filename(raw: &str) -> Result<Cow<'_, str>, DownloadError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| DownloadError::InvalidEncoding)
}

fn content_length(response: &Response<ResponseBody>) -> u64 {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
