//! Configuration for the pagecache server.
//!
//! Cache settings live in [`pagecache::CacheConfig`]; this module adds the
//! server's own settings. Both are loaded from environment variables, with
//! a `.env` file picked up at startup.
//!
//! # Example
//!
//! ```ignore
//! use pagecache::CacheConfig;
//! use pagecache_server::config::server::ServerConfig;
//!
//! let server = ServerConfig::from_env();
//! let cache = CacheConfig::from_env()?;
//! ```

pub mod server;

pub use pagecache::CacheConfig;
