use std::fmt::{self, Display};

/// The kind of error that occurred while talking to a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider could not be reached (connection, timeout, etc.).
    Network,
    /// The provider answered with a non-success HTTP status.
    Status,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The provider answered, but the body could not be decoded.
    InvalidResponse,
    /// Any other errors.
    Other,
}

impl ErrorKind {
    /// Returns whether an error of this kind may go away on its own.
    ///
    /// Transports can use this to decide whether a request is worth
    /// retrying. The agent loop itself never retries.
    #[inline]
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::Network | ErrorKind::RateLimitExceeded)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::Status => write!(f, "Unexpected status"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::InvalidResponse => write!(f, "Invalid response"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
