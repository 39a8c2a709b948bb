//! Request handler module
//!
//! Request dispatch and the download handler itself.

pub mod download;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
