use std::env;

/// Server configuration.
///
/// # Environment Variables
///
/// - `SERVER_ADDR`: Address to bind (default: `0.0.0.0:3000`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            addr: env::var("SERVER_ADDR").unwrap_or_else(|_| Self::default().addr),
        }
    }
}
