//! # pagecache server
//!
//! A small axum server that serves pages through the [`pagecache`] response
//! cache. It doubles as a reference for wiring the cache into an
//! application.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── config/           # Server configuration (cache settings come from pagecache)
//! ├── modules/
//! │   └── pages/       # Cached demo pages and render statistics
//! ├── router.rs         # Application router and observability layers
//! └── state.rs          # Shared application state and store setup
//! ```
//!
//! ## Routes
//!
//! | Route | Cached | Notes |
//! |-------|--------|-------|
//! | `GET /api/pages/time` | yes | timestamped page |
//! | `GET /api/pages/slow` | yes | 200 ms render, shows request coalescing |
//! | `GET /api/pages/missing` | no | always 404 |
//! | `GET /api/pages/private` | no | marked [`pagecache::Aborted`] |
//! | `GET /api/pages/stats` | no | render count and in-flight fills |
//! | `GET /health` | no | |
//! | `GET /metrics` | no | Prometheus exposition |
//!
//! ## Environment Variables
//!
//! ```bash
//! SERVER_ADDR=0.0.0.0:3000
//! CACHE_BACKEND=memory          # or redis
//! REDIS_URL=redis://127.0.0.1:6379
//! CACHE_TTL_SECONDS=300
//! CACHE_JITTER_MS=0
//! CACHE_KEY_POLICY=uri          # or path
//! CACHE_ENCODING=json           # or gzip
//! ```

pub mod config;
pub mod modules;
pub mod router;
pub mod state;
