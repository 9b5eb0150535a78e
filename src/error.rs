use thiserror::Error;

/// Startup configuration problems. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no hosts configured (set PINGBOARD_HOSTS)")]
    NoHosts,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// A probe that could not produce loss statistics at all.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no address found for {0}")]
    NoAddress(String),

    #[error("ping failed: {0}")]
    Transport(String),

    #[error("ping worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind http server: {0}")]
    Bind(#[from] warp::Error),
}
