use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize console-only logging.
///
/// Used when the observability feature is compiled out or disabled at
/// runtime.
///
/// # Configuration
///
/// - **Log Level**: `RUST_LOG`, falling back to `LOG_LEVEL` (default: "info")
/// - **Filtering**: Noisy dependencies filtered to warn level
/// - **Format**: Compact format with ANSI colors
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pagecache={level},pagecache_server={level},tower_http=warn,hyper=warn,redis=warn",
            level = log_level
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_filter(env_filter);

    // Repeated initialization (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
