//! Error sink for caching faults.
//!
//! Caching faults never reach the client, so the only place they surface is
//! a [`Logger`]. The default [`Discard`] drops them.

use std::fmt;

use axum::http::{Method, Uri};

/// The request a caching fault occurred on.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub key: String,
}

pub trait Logger: Send + Sync {
    fn error(&self, ctx: &RequestContext, args: fmt::Arguments<'_>);
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl Logger for Discard {
    fn error(&self, _ctx: &RequestContext, _args: fmt::Arguments<'_>) {}
}

/// Forwards to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, ctx: &RequestContext, args: fmt::Arguments<'_>) {
        tracing::error!(
            method = %ctx.method,
            uri = %ctx.uri,
            cache.key = %ctx.key,
            "{}",
            args
        );
    }
}
