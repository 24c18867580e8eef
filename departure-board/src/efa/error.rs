//! EFA client error types.

use std::error::Error as _;
use std::io;

/// Errors from the EFA HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum EfaError {
    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The host has no usable network (unreachable network, DNS failure)
    #[error("no network connection: {0}")]
    Offline(String),

    /// The server could not be reached (refused, reset, TLS failure)
    #[error("cannot connect to server: {0}")]
    Connect(String),

    /// Any other transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// API returned a non-success status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not a JSON document of the expected envelope.
    /// `body` holds the start of the offending response for logging.
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },
}

impl EfaError {
    /// Whether trying again later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EfaError::Timeout | EfaError::Offline(_) | EfaError::Connect(_) => true,
            EfaError::Http(_) => true,
            EfaError::Api { status, .. } => *status >= 500 || *status == 429,
            EfaError::Json { .. } => false,
        }
    }
}

impl From<reqwest::Error> for EfaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return EfaError::Timeout;
        }
        if err.is_connect() {
            let message = error_chain(&err);
            return if is_offline(&err, &message) {
                EfaError::Offline(message)
            } else {
                EfaError::Connect(message)
            };
        }
        EfaError::Http(err)
    }
}

/// Render an error and its sources as one line.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_offline(err: &reqwest::Error, message: &str) -> bool {
    if message.contains("dns error") || message.contains("failed to lookup address") {
        return true;
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return matches!(
                io_err.kind(),
                io::ErrorKind::NetworkUnreachable
                    | io::ErrorKind::NetworkDown
                    | io::ErrorKind::HostUnreachable
                    | io::ErrorKind::NotConnected
            );
        }
        source = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(EfaError::Timeout.to_string(), "request timed out");

        let err = EfaError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "API error 503: Service Unavailable");

        let err = EfaError::Json {
            message: "expected value".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("JSON parse error"));
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn retryable() {
        assert!(EfaError::Timeout.is_retryable());
        assert!(EfaError::Offline("dns error".into()).is_retryable());
        assert!(
            EfaError::Api {
                status: 502,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !EfaError::Api {
                status: 404,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !EfaError::Json {
                message: String::new(),
                body: None
            }
            .is_retryable()
        );
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        // Bind then drop to get a local port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::get(format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(EfaError::from(err), EfaError::Connect(_)));
    }
}
