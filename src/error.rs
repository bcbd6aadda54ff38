#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Login response carried no bearer token")]
    MissingToken,
    #[cfg(feature = "client")]
    #[error("API error during {operation}: status {status:?}: {detail}")]
    Api {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
