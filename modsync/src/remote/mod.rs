//! Remote storage backends that serve file contents as byte streams.

mod error;
mod http;

pub use error::{RemoteError, RemoteResult};
pub use http::HttpStorage;

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use crate::manifest::RemoteFileDescriptor;
use crate::BoxFuture;

/// Stream of data chunks for one remote file.
///
/// The stream ends after the last chunk; an `Err` item signals a failed
/// transfer. Dropping the stream closes the underlying connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = RemoteResult<Bytes>> + Send>>;

/// Serves the contents of manifest files.
pub trait RemoteStorage: Send + Sync {
    /// Open a byte stream for `file`.
    fn open_stream<'a>(&'a self, file: &'a RemoteFileDescriptor)
        -> BoxFuture<'a, RemoteResult<ByteStream>>;
}
