use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the lessons client.
///
/// `Network` and `Server` together are the single remote-failure class: the
/// request never produced a response, or it produced a non-2xx one.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{operation} failed: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} failed with status {status}: {message}")]
    Server {
        operation: &'static str,
        status: StatusCode,
        message: String,
    },
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("cart index {index} is out of range for a cart of {len} item(s)")]
    CartIndexOutOfRange { index: usize, len: usize },
}

impl ShopError {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }

    /// Short reason embedded in the checkout failure message.
    pub fn user_reason(&self) -> String {
        match self {
            Self::Network { operation, .. } => format!("could not reach the server to {operation}"),
            Self::Server {
                operation, message, ..
            } => format!("failed to {operation} ({message})"),
            other => other.to_string(),
        }
    }
}

pub type ShopResult<T> = std::result::Result<T, ShopError>;
