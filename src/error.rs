use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiglentError {
    #[error("IO error ({context}): {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },
    #[error("Connection timeout")]
    Timeout,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SiglentError {
    /// Wrap an I/O error, mapping timeouts to [`SiglentError::Timeout`]
    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        match source.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                SiglentError::Timeout
            }
            _ => SiglentError::Io {
                source,
                context: context.into(),
            },
        }
    }
}

impl From<std::io::Error> for SiglentError {
    fn from(source: std::io::Error) -> Self {
        SiglentError::io(source, "I/O operation")
    }
}
