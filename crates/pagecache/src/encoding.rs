//! Serialization of cache entries.
//!
//! Entries are stored as `{"status": int, "header": {name: [values]}, "body": base64}`.
//! A header value is a JSON string when it is valid UTF-8 and `{"b64": ...}`
//! otherwise, so no header byte is lost.
//! [`JsonGzipEncoding`] wraps the same record in a gzip stream at the best
//! compression level.

use std::{
    borrow::Cow,
    collections::BTreeMap,
    io::{Read, Write},
};

use axum::http::{HeaderValue, header::InvalidHeaderValue};
use data_encoding::BASE64;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;

/// Error type for encoding operations.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid body encoding: {0}")]
    Base64(#[from] data_encoding::DecodeError),

    #[error("Invalid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),
}

/// Pluggable encoding of cache entries to bytes.
pub trait Encoding: Send + Sync {
    /// Serializes an entry.
    fn marshal(&self, entry: &CacheEntry) -> Result<Vec<u8>, EncodingError>;

    /// Decodes `data` into an existing entry, reusing its allocations.
    fn unmarshal_into(&self, data: &[u8], entry: &mut CacheEntry) -> Result<(), EncodingError>;

    /// Decodes `data` into a new entry.
    fn unmarshal(&self, data: &[u8]) -> Result<CacheEntry, EncodingError> {
        let mut entry = CacheEntry::default();
        self.unmarshal_into(data, &mut entry)?;
        Ok(entry)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Text(String),
    Binary { b64: String },
}

impl WireValue {
    fn from_header(value: &HeaderValue) -> Self {
        match std::str::from_utf8(value.as_bytes()) {
            Ok(text) => Self::Text(text.to_owned()),
            Err(_) => Self::Binary {
                b64: BASE64.encode(value.as_bytes()),
            },
        }
    }

    fn into_header(self) -> Result<HeaderValue, EncodingError> {
        let value = match self {
            Self::Text(text) => HeaderValue::try_from(text)?,
            Self::Binary { b64 } => HeaderValue::from_bytes(&BASE64.decode(b64.as_bytes())?)?,
        };
        Ok(value)
    }
}

#[derive(Serialize)]
struct WireRef<'a> {
    status: u16,
    header: BTreeMap<&'a str, Vec<WireValue>>,
    body: String,
}

#[derive(Deserialize)]
struct Wire<'a> {
    status: u16,
    #[serde(default)]
    header: BTreeMap<String, Vec<WireValue>>,
    #[serde(borrow, default)]
    body: Cow<'a, str>,
}

/// Plain JSON encoding (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoding;

impl JsonEncoding {
    fn write_to<W: Write>(writer: W, entry: &CacheEntry) -> Result<(), EncodingError> {
        let wire = WireRef {
            status: entry.status,
            header: entry
                .header
                .iter()
                .map(|(name, values)| {
                    (name.as_str(), values.iter().map(WireValue::from_header).collect())
                })
                .collect(),
            body: BASE64.encode(&entry.body),
        };
        serde_json::to_writer(writer, &wire)?;
        Ok(())
    }
}

impl Encoding for JsonEncoding {
    fn marshal(&self, entry: &CacheEntry) -> Result<Vec<u8>, EncodingError> {
        let mut out = Vec::with_capacity(entry.body.len() * 4 / 3 + 64);
        Self::write_to(&mut out, entry)?;
        Ok(out)
    }

    fn unmarshal_into(&self, data: &[u8], entry: &mut CacheEntry) -> Result<(), EncodingError> {
        let wire: Wire<'_> = serde_json::from_slice(data)?;

        let encoded = wire.body.as_bytes();
        let len = BASE64.decode_len(encoded.len())?;
        entry.body.clear();
        entry.body.resize(len, 0);
        let written = BASE64
            .decode_mut(encoded, &mut entry.body)
            .map_err(|partial| partial.error)?;
        entry.body.truncate(written);

        entry.status = wire.status;
        entry.header.clear();
        for (name, values) in wire.header {
            let values = values
                .into_iter()
                .map(WireValue::into_header)
                .collect::<Result<_, _>>()?;
            entry.header.insert(name, values);
        }
        Ok(())
    }
}

/// JSON encoding wrapped in gzip at the best compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGzipEncoding;

impl Encoding for JsonGzipEncoding {
    fn marshal(&self, entry: &CacheEntry) -> Result<Vec<u8>, EncodingError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        JsonEncoding::write_to(&mut encoder, entry)?;
        Ok(encoder.finish()?)
    }

    fn unmarshal_into(&self, data: &[u8], entry: &mut CacheEntry) -> Result<(), EncodingError> {
        let mut json = Vec::with_capacity(data.len() * 4);
        GzDecoder::new(data).read_to_end(&mut json)?;
        JsonEncoding.unmarshal_into(&json, entry)
    }
}
