//! Error types for the model service clients

/// Result type for model service operations.
///
/// This is a convenience type alias that uses [`ServiceError`] as the error type.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Error raised when the external embedding or chat service cannot satisfy a request.
///
/// The clients never retry. Every variant is final for the request that
/// produced it, and the caller decides whether to abort (ingestion) or to
/// report the failure (interactive queries).
///
/// # Error Categories
///
/// - **Transport**: the service could not be reached or timed out
/// - **Protocol**: the service answered with a non-success status
/// - **Shape**: the body did not match the expected response contract
/// - **Configuration**: the client was configured with unusable values
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service could not be reached, or the request timed out
    #[error("Model service unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service returned a non-success HTTP status
    #[error("Model service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Malformed response from model service: {message}")]
    MalformedResponse { message: String },

    /// Client configuration is unusable
    #[error("Invalid model service configuration: {message}")]
    InvalidConfig { message: String },
}

impl ServiceError {
    /// Wrap a transport failure for the given endpoint.
    pub fn unreachable(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Unreachable {
            url: url.into(),
            source,
        }
    }

    /// Create a malformed response error with a custom message.
    ///
    /// Used whenever the service answers successfully but the body fails
    /// validation: missing fields, empty vectors, non-finite numbers, or
    /// vectors of inconsistent dimensionality.
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether the failure happened before the service produced any answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}
