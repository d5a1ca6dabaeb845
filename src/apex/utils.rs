use axum::{
    Json,
    http::{
        HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW,
        },
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const DETAILS_MAX_CHARS: usize = 200;
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

#[derive(Serialize)]
pub struct ErrorMessage {
    pub status: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorMessage {
    #[inline]
    pub fn new(error: String, details: Option<String>) -> Self {
        Self {
            status: "error",
            error,
            details: details.map(|text| truncate_chars(&text, DETAILS_MAX_CHARS)),
        }
    }
}

/// Every way a contact relay request can fail, mapped onto the HTTP status
/// and JSON body the browser receives.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid JSON payload")]
    InvalidPayload,

    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("Server misconfigured: {0}")]
    Configuration(String),

    #[error("Bot verification failed")]
    BotCheckFailed(String),

    #[error("Mail provider authentication failed")]
    UpstreamAuth(String),

    #[error("Mail provider rejected the message")]
    UpstreamSend { status: StatusCode, details: String },

    #[error("Could not reach {service}")]
    Network {
        service: &'static str,
        details: String,
    },

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl RelayError {
    pub fn validation(message: impl Into<String>, fields: Vec<&'static str>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPayload | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BotCheckFailed(_) => StatusCode::FORBIDDEN,
            Self::UpstreamAuth(_) | Self::Network { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamSend { status, .. } => *status,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Stable name of the failure class, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "InvalidPayload",
            Self::Validation { .. } => "ValidationError",
            Self::Configuration(_) => "ConfigurationError",
            Self::BotCheckFailed(_) => "BotCheckFailed",
            Self::UpstreamAuth(_) => "UpstreamAuthError",
            Self::UpstreamSend { .. } => "UpstreamSendError",
            Self::Network { .. } => "NetworkError",
            Self::MethodNotAllowed => "MethodNotAllowed",
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            Self::Validation { fields, .. } if !fields.is_empty() => Some(fields.join(", ")),
            Self::BotCheckFailed(details)
            | Self::UpstreamAuth(details)
            | Self::UpstreamSend { details, .. }
            | Self::Network { details, .. }
                if !details.is_empty() =>
            {
                Some(details.clone())
            }
            _ => None,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorMessage::new(self.to_string(), self.details());
        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

pub fn with_cors(mut response: Response, allowed_origin: &str) -> Response {
    let origin =
        HeaderValue::from_str(allowed_origin).unwrap_or_else(|_| HeaderValue::from_static("*"));
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

#[inline]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
