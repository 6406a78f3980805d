use thiserror::Error;

/// Main error type for DataHub operations
#[derive(Debug, Error)]
pub enum DatahubError {
    /// Missing or unusable client configuration, detected before anything is sent
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record value did not match its declared field type
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Error returned by the DataHub service
    #[error("[{status} {status_text}] {error_code}: {error_message}")]
    Service {
        status: u16,
        status_text: String,
        error_code: String,
        error_message: String,
        request_id: Option<String>,
    },

    /// Request building error
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error, no response was received
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Base64 decoding error
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

/// Field-level failures raised by the record codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("InvalidBooleanValue: field `{field}` got {value:?}")]
    InvalidBooleanValue { field: String, value: String },

    #[error("InvalidNumber: field `{field}` of type {field_type} got {value:?}")]
    InvalidNumber {
        field: String,
        field_type: String,
        value: String,
    },

    #[error("InvalidTimestamp: field `{field}` got {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("unknown field type {0:?}")]
    UnknownFieldType(String),

    #[error("record has {actual} values but schema has {expected} fields")]
    FieldCountMismatch { expected: usize, actual: usize },

    #[error("duplicate field `{0}` in schema")]
    DuplicateField(String),

    #[error("missing value for field `{0}`")]
    MissingField(String),

    #[error("field `{field}` expects {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("invalid record data: {0}")]
    InvalidRecordData(String),
}

impl DatahubError {
    /// Build a service error from a non-2xx reply and its body
    pub fn service(
        status: u16,
        status_text: impl Into<String>,
        body: &[u8],
        request_id: Option<String>,
    ) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            #[serde(rename = "ErrorCode", default)]
            error_code: String,
            #[serde(rename = "ErrorMessage", default)]
            error_message: String,
            #[serde(rename = "RequestId")]
            request_id: Option<String>,
        }

        let (error_code, error_message, body_request_id) =
            match serde_json::from_slice::<ErrorBody>(body) {
                Ok(parsed) => (parsed.error_code, parsed.error_message, parsed.request_id),
                Err(_) => (
                    String::new(),
                    String::from_utf8_lossy(body).to_string(),
                    None,
                ),
            };

        DatahubError::Service {
            status,
            status_text: status_text.into(),
            error_code,
            error_message,
            request_id: request_id.or(body_request_id),
        }
    }

    /// Check if this error is a permission denied error (403)
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DatahubError::Service { status: 403, .. })
    }

    /// Check if this error is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatahubError::Service { status: 404, .. })
    }

    /// Get the HTTP status code if the service answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DatahubError::Service { status, .. } => Some(*status),
            DatahubError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the service error code, e.g. `NoSuchProject`
    pub fn error_code(&self) -> Option<&str> {
        match self {
            DatahubError::Service { error_code, .. } => Some(error_code),
            _ => None,
        }
    }
}

/// Result type for DataHub operations
pub type Result<T> = std::result::Result<T, DatahubError>;
