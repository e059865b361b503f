use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use pagecache::{Logger, RequestContext, Store, StoreError};
use parking_lot::Mutex;
use tower::ServiceExt;

/// A fully read response.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Sends a GET for `uri` and reads the whole response.
pub async fn get(app: &Router, uri: &str) -> Captured {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    Captured {
        status,
        headers,
        body,
    }
}

/// Store whose every operation fails with a backend error.
#[allow(dead_code)]
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn get(&self, _key: &str) -> Result<Bytes, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
}

/// Logger keeping every reported fault.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<(String, String)>>>,
}

#[allow(dead_code)]
impl RecordingLogger {
    /// `(cache key, message)` pairs in report order.
    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.lock().clone()
    }
}

impl Logger for RecordingLogger {
    fn error(&self, ctx: &RequestContext, args: fmt::Arguments<'_>) {
        self.lines.lock().push((ctx.key.clone(), args.to_string()));
    }
}
