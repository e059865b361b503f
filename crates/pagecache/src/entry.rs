//! Cached response representation.

use std::collections::BTreeMap;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use tracing::warn;

/// A captured downstream response.
///
/// Header names map to every value that was set for them, in the order the
/// handler set them. Values keep their raw bytes, UTF-8 or not. Entries are built once a fill completes and are never
/// mutated while published; a re-fill replaces them wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// HTTP status code.
    pub status: u16,
    /// Header name to list of values.
    pub header: BTreeMap<String, Vec<HeaderValue>>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl CacheEntry {
    /// Builds an entry from a response head and a fully buffered body.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        let mut header: BTreeMap<String, Vec<HeaderValue>> = BTreeMap::new();
        for (name, value) in headers {
            header
                .entry(name.as_str().to_owned())
                .or_default()
                .push(value.clone());
        }

        Self {
            status: status.as_u16(),
            header,
            body: body.into(),
        }
    }

    /// Whether the status falls in the cacheable `[200, 300)` range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Replays the entry as a fresh response: status, then every header value
    /// in its original multiplicity, then the body.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(Bytes::copy_from_slice(&self.body)));

        *response.status_mut() = StatusCode::from_u16(self.status).unwrap_or_else(|_| {
            warn!(cache.status = self.status, "Cached entry has an invalid status code");
            StatusCode::INTERNAL_SERVER_ERROR
        });

        let headers = response.headers_mut();
        for (name, values) in &self.header {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                warn!(cache.header = %name, "Skipping invalid cached header name");
                continue;
            };
            for value in values {
                headers.append(name.clone(), value.clone());
            }
        }

        response
    }

    /// Resets the entry so it can be reused without leaking data.
    pub(crate) fn reset(&mut self) {
        self.status = 0;
        self.header.clear();
        self.body.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
    use http_body_util::BodyExt;

    #[test]
    fn test_from_parts_keeps_multi_valued_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let entry = CacheEntry::from_parts(StatusCode::OK, &headers, b"hello".to_vec());

        assert_eq!(entry.status, 200);
        assert_eq!(entry.header["set-cookie"], vec!["a=1", "b=2"]);
        assert_eq!(entry.header["content-type"], vec!["text/plain"]);
    }

    #[test]
    fn test_from_parts_keeps_non_utf8_header_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert("x-name", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let entry = CacheEntry::from_parts(StatusCode::OK, &headers, Vec::new());
        let response = entry.to_response();

        assert_eq!(entry.header["x-name"][0].as_bytes(), b"caf\xe9");
        assert_eq!(response.headers()["x-name"].as_bytes(), b"caf\xe9");
        assert_eq!(entry.body, b"hello");
    }

    #[test]
    fn test_is_success_range() {
        let mut entry = CacheEntry::default();
        for (status, expected) in [(199, false), (200, true), (207, true), (299, true), (300, false), (404, false)] {
            entry.status = status;
            assert_eq!(entry.is_success(), expected, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_to_response_replays_everything() {
        let mut entry = CacheEntry {
            status: 201,
            body: b"created".to_vec(),
            ..Default::default()
        };
        entry
            .header
            .insert(
                "x-multi".into(),
                vec![HeaderValue::from_static("one"), HeaderValue::from_static("two")],
            );

        let response = entry.to_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let values: Vec<_> = response
            .headers()
            .get_all("x-multi")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["one", "two"]);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"created");
    }

    #[test]
    fn test_reset_clears_all_fields() {
        let mut entry = CacheEntry {
            status: 200,
            body: vec![1, 2, 3],
            ..Default::default()
        };
        entry
            .header
            .insert("a".into(), vec![HeaderValue::from_static("b")]);

        entry.reset();

        assert_eq!(entry, CacheEntry::default());
    }
}
