//! Human readable descriptions of failed HTTP responses.

use reqwest::StatusCode;

/// Describe a non-success status in words a user can act on.
pub fn describe_status(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "Authentication required (HTTP 401)".to_string(),
        StatusCode::FORBIDDEN => "Access forbidden (HTTP 403)".to_string(),
        StatusCode::NOT_FOUND => "Not found (HTTP 404)".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "Too many requests (HTTP 429)".to_string(),
        s if s.is_client_error() => format!("Request error (HTTP {})", s.as_u16()),
        s if s.is_server_error() => format!("Server error (HTTP {})", s.as_u16()),
        s => format!("Unexpected response (HTTP {})", s.as_u16()),
    }
}

/// Describe a transport-level failure (DNS, refused connection, TLS, ...).
pub fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_connect() {
        format!("Connection failed: {}", error)
    } else if error.is_timeout() {
        format!("Request timed out: {}", error)
    } else {
        error.to_string()
    }
}
