use thiserror::Error;

/// Transport-level failure of a single request against the controller.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::NetworkError(err)
        }
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// The server refused the credentials or the bearer token.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::AccessDenied(_))
    }
}

/// Failure of a login attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid authentication: {0}")]
    InvalidAuth(String),

    #[error("Cannot connect: {0}")]
    CannotConnect(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidAuth(_) => "invalid_auth",
            AuthError::CannotConnect(_) => "cannot_connect",
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            // A login answer we cannot read is treated like a rejection.
            ApiError::Unauthorized | ApiError::AccessDenied(_) | ApiError::InvalidResponse(_) => {
                AuthError::InvalidAuth(err.to_string())
            }
            ApiError::RateLimited
            | ApiError::ServerError(_)
            | ApiError::Timeout
            | ApiError::NetworkError(_) => AuthError::CannotConnect(err.to_string()),
        }
    }
}

/// Failure of one room poll.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid authentication: {0}")]
    InvalidAuth(String),

    #[error("Cannot connect: {0}")]
    CannotConnect(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::InvalidAuth(_) => "invalid_auth",
            FetchError::CannotConnect(_) => "cannot_connect",
            FetchError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<AuthError> for FetchError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidAuth(msg) => FetchError::InvalidAuth(msg),
            AuthError::CannotConnect(msg) => FetchError::CannotConnect(msg),
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized | ApiError::AccessDenied(_) => {
                FetchError::InvalidAuth(err.to_string())
            }
            ApiError::InvalidResponse(_) => FetchError::InvalidResponse(err.to_string()),
            ApiError::RateLimited
            | ApiError::ServerError(_)
            | ApiError::Timeout
            | ApiError::NetworkError(_) => FetchError::CannotConnect(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "nope"),
            ApiError::AccessDenied(ref b) if b == "nope"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "down"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        // 'ň' is two bytes, so byte 500 falls inside a character
        let body = format!("a{}", "ň".repeat(400));
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated"));
        assert!(truncated.starts_with('a'));
    }

    #[test]
    fn test_authorization_failure_classification() {
        assert!(ApiError::Unauthorized.is_authorization_failure());
        assert!(ApiError::AccessDenied(String::new()).is_authorization_failure());
        assert!(!ApiError::Timeout.is_authorization_failure());
        assert!(!ApiError::InvalidResponse(String::new()).is_authorization_failure());
    }

    #[test]
    fn test_auth_error_codes() {
        assert_eq!(AuthError::from(ApiError::Unauthorized).code(), "invalid_auth");
        assert_eq!(
            AuthError::from(ApiError::InvalidResponse("no token".into())).code(),
            "invalid_auth"
        );
        assert_eq!(AuthError::from(ApiError::Timeout).code(), "cannot_connect");
        assert_eq!(
            AuthError::from(ApiError::ServerError("boom".into())).code(),
            "cannot_connect"
        );
    }

    #[test]
    fn test_fetch_error_codes() {
        assert_eq!(FetchError::from(ApiError::Unauthorized).code(), "invalid_auth");
        assert_eq!(
            FetchError::from(ApiError::InvalidResponse("bad json".into())).code(),
            "invalid_response"
        );
        assert_eq!(FetchError::from(ApiError::RateLimited).code(), "cannot_connect");
        assert_eq!(
            FetchError::from(AuthError::CannotConnect("down".into())).code(),
            "cannot_connect"
        );
    }
}
