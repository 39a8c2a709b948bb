//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the download logic.

pub mod body;
pub mod cache;
pub mod disposition;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_416_response,
    build_500_response, build_error_response, build_options_response, FileHeaders,
};
