use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// Maximum upstream message length surfaced to callers.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Rendered as a JSON `{ "error": message }` body: 400 for bad input, 404 for a
/// missing upstream resource, 500 otherwise.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caller sent an unusable body.
    #[error("{0}")]
    BadRequest(String),

    /// Upstream has no record of the requested resource.
    #[error("{0}")]
    NotFound(String),

    /// A required setting (usually an API key) is missing.
    #[error("server misconfigured: {0}")]
    Config(String),

    /// Upstream answered with a non-success status.
    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Transport failure. Holds the error without its request URL, which can
    /// carry credentials.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    HttpMiddleware(anyhow::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Upstream payload was well-formed JSON but not what we expected.
    #[error("unexpected response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

impl From<reqwest_middleware::Error> for ApiError {
    fn from(e: reqwest_middleware::Error) -> Self {
        match e {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => match e.downcast::<reqwest::Error>() {
                Ok(e) => e.into(),
                Err(e) => Self::HttpMiddleware(e),
            },
        }
    }
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    pub fn upstream(service: &'static str, status: u16, body: &str) -> Self {
        Self::Upstream {
            service,
            status,
            message: truncate(body.trim(), MAX_ERROR_MESSAGE_LEN),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("api.error status={} {}", status.as_u16(), self);
        } else {
            log::warn!("api.reject status={} {}", status.as_u16(), self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
