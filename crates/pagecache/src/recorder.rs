//! Response body recording.
//!
//! [`ResponseRecorder`] decorates a response body: each data frame polled
//! through it is appended to an internal buffer and handed on unchanged.
//! [`ChannelBody`] is the client-facing side used while a fill drives the
//! recorder, so frames reach the client as soon as they are produced.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use axum::http::{HeaderMap, StatusCode, response::Parts};
use bytes::{Bytes, BytesMut};
use http_body::{Body as HttpBody, Frame, SizeHint};
use tokio::sync::mpsc;

use crate::entry::CacheEntry;

/// Tees a response body into a buffer.
#[derive(Debug)]
pub struct ResponseRecorder<B> {
    inner: B,
    status: StatusCode,
    headers: HeaderMap,
    buffer: BytesMut,
}

impl<B> ResponseRecorder<B> {
    /// Wraps `body`, snapshotting the status and headers from `parts`.
    pub fn new(parts: &Parts, body: B) -> Self {
        Self {
            inner: body,
            status: parts.status,
            headers: parts.headers.clone(),
            buffer: BytesMut::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Bytes recorded so far.
    pub fn body(&self) -> &[u8] {
        &self.buffer
    }

    /// Builds the cache entry from everything recorded.
    pub fn into_entry(self) -> CacheEntry {
        CacheEntry::from_parts(self.status, &self.headers, self.buffer.to_vec())
    }
}

impl<B> HttpBody for ResponseRecorder<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, B::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(frame))) = &polled {
            if let Some(data) = frame.data_ref() {
                this.buffer.extend_from_slice(data);
            }
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Body fed frame by frame through a channel.
#[derive(Debug)]
pub struct ChannelBody {
    rx: mpsc::Receiver<Result<Frame<Bytes>, axum::Error>>,
    size_hint: SizeHint,
}

impl ChannelBody {
    /// Creates a body and the sender feeding it. `size_hint` is advertised
    /// to the client unchanged.
    pub fn channel(
        buffer: usize,
        size_hint: SizeHint,
    ) -> (mpsc::Sender<Result<Frame<Bytes>, axum::Error>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx, size_hint })
    }
}

impl HttpBody for ChannelBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        self.rx.poll_recv(cx)
    }

    fn size_hint(&self) -> SizeHint {
        self.size_hint.clone()
    }
}
