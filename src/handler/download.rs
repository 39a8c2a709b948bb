//! Download handler
//!
//! Resolves a requested filename under the download directory and sends
//! the file as an attachment, honouring conditional and range requests.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use hyper::Response;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::DownloadError;
use crate::handler::router::RequestContext;
use crate::http::{
    self, body, cache, disposition, mime, range::RangeParseResult, FileHeaders, ResponseBody,
};
use crate::logger;

/// An opened file ready to be sent
#[derive(Debug)]
pub struct DownloadFile {
    /// Path as requested under the download root, symlinks not resolved
    pub path: PathBuf,
    pub file: File,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl DownloadFile {
    /// Name offered to the client's save dialog
    pub fn download_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Serve `filename` from `root` as an attachment
pub async fn serve_download(
    ctx: &RequestContext<'_>,
    root: &Path,
    cache_control: &str,
) -> Response<ResponseBody> {
    let filename = ctx.path;
    let result = match open_download(root, filename).await {
        Ok(download) => build_download_response(ctx, download, cache_control).await,
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| {
        log_failure(filename, &e);
        http::build_error_response(e.status())
    })
}

fn log_failure(filename: &str, err: &DownloadError) {
    match err {
        DownloadError::PathTraversal(detail) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {detail}"));
        }
        DownloadError::Io(e) => {
            logger::log_error(&format!("Failed to read '{filename}': {e}"));
        }
        other => logger::log_debug(&format!("Download refused: {other}")),
    }
}

/// Join `relative` onto `root` one component at a time
///
/// `.` is skipped. `..`, absolute components and NUL bytes are rejected
/// outright, whether or not they would land back inside `root`. The
/// filesystem is not consulted.
pub fn resolve_download_path(root: &Path, relative: &str) -> Result<PathBuf, DownloadError> {
    if relative.contains('\0') {
        return Err(DownloadError::PathTraversal(relative.escape_debug().to_string()));
    }

    let mut result = root.to_path_buf();
    let mut has_name = false;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(name) => {
                result.push(name);
                has_name = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DownloadError::PathTraversal(relative.to_string()));
            }
        }
    }

    if has_name {
        Ok(result)
    } else {
        Err(DownloadError::NotFound(relative.to_string()))
    }
}

/// Canonicalize `path` and check it is still inside `root`
///
/// Catches symlinks pointing out of the download directory.
pub async fn verify_containment(
    root: &Path,
    path: &Path,
    relative: &str,
) -> Result<PathBuf, DownloadError> {
    let canonical_root = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Download directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return Err(DownloadError::NotFound(relative.to_string()));
        }
    };

    let canonical = fs::canonicalize(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => DownloadError::Io(e),
            // Missing files and non-directory intermediate components
            _ => DownloadError::NotFound(relative.to_string()),
        })?;

    if !canonical.starts_with(&canonical_root) {
        return Err(DownloadError::PathTraversal(format!(
            "{relative} -> {}",
            canonical.display()
        )));
    }

    Ok(canonical)
}

/// Resolve, verify and open `relative` under `root`
pub async fn open_download(root: &Path, relative: &str) -> Result<DownloadFile, DownloadError> {
    let path = resolve_download_path(root, relative)?;
    let canonical = verify_containment(root, &path, relative).await?;

    let metadata = fs::metadata(&canonical)
        .await
        .map_err(|e| DownloadError::from_io(e, relative))?;
    if !metadata.is_file() {
        return Err(DownloadError::NotAFile(relative.to_string()));
    }
    // Component joining drops a trailing slash; a file named as a directory is ENOTDIR
    if relative.ends_with('/') {
        return Err(DownloadError::NotFound(relative.to_string()));
    }

    let file = File::open(&canonical)
        .await
        .map_err(|e| DownloadError::from_io(e, relative))?;
    let metadata = file.metadata().await?;

    Ok(DownloadFile {
        path,
        file,
        size: metadata.len(),
        modified: metadata.modified().ok(),
    })
}

/// Build the 200/206/304/416 response for an opened file
pub async fn build_download_response(
    ctx: &RequestContext<'_>,
    mut download: DownloadFile,
    cache_control: &str,
) -> Result<Response<ResponseBody>, DownloadError> {
    let headers = FileHeaders {
        content_type: mime::content_type_for(&download.path),
        disposition: disposition::attachment(&download.download_name()),
        etag: cache::generate_etag(&download.path, download.size, download.modified),
        last_modified: download.modified.map(cache::http_date),
        cache_control: cache_control.to_string(),
    };

    // If-None-Match wins over If-Modified-Since when both are sent
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match.as_deref(), &headers.etag)
    } else {
        cache::not_modified_since(ctx.if_modified_since.as_deref(), download.modified)
    };
    if not_modified {
        return Ok(http::build_304_response(&headers));
    }

    let range_header = ctx.range_header.as_deref().filter(|_| {
        cache::if_range_allows(ctx.if_range.as_deref(), &headers.etag, download.modified)
    });

    let total_size = download.size;
    match http::parse_range_header(range_header, total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);

            let data = if ctx.is_head {
                body::empty()
            } else {
                download.file.seek(SeekFrom::Start(start)).await?;
                body::stream(download.file.take(range.content_length(total_size)))
            };

            Ok(http::response::build_partial_response(
                &headers, data, start, end, total_size,
            ))
        }
        RangeParseResult::NotSatisfiable => Ok(http::build_416_response(total_size)),
        RangeParseResult::None => {
            let data = if ctx.is_head {
                body::empty()
            } else {
                body::stream(download.file.take(total_size))
            };
            Ok(http::response::build_file_response(&headers, data, total_size))
        }
    }
}
