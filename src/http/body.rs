//! Response body helpers
//!
//! All responses share one boxed body type so in-memory messages and
//! streamed files can come out of the same handler.

use futures::TryStreamExt;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Body type of every response the server produces
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Body holding `data` in memory
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Body with no content (HEAD, 304, 204)
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// Body streaming `reader` to the client chunk by chunk
///
/// Dropping the body (client gone) drops the reader.
pub fn stream<R>(reader: R) -> ResponseBody
where
    R: AsyncRead + Send + Sync + 'static,
{
    let frames = ReaderStream::new(reader).map_ok(Frame::data);
    StreamBody::new(frames).boxed()
}
