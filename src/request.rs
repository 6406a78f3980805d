use crate::error::{DatahubError, Result};
use crate::time::Time;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, DATE};
use reqwest::Method;
use serde_json::Value;

/// Content type sent with every request, trailing semicolon included.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json;";

/// Header carrying the client version marker.
pub const CLIENT_VERSION_HEADER: &str = "x-datahub-client-version";

/// Prefix of the custom headers that take part in signing.
pub const DATAHUB_HEADER_PREFIX: &str = "x-datahub-";

/// RequestDescription is everything the signer and transport need to know
/// about one outbound request. It is built fresh per call.
#[derive(Debug, Clone)]
pub struct RequestDescription {
    /// One of GET, POST, PUT or DELETE
    pub method: Method,
    /// Resource path, always starting with `/`
    pub path: String,
    /// Query parameters; empty for every current endpoint
    pub query: Vec<(String, String)>,
    /// Header map, names are case-insensitive
    pub headers: HeaderMap,
    /// Optional JSON body
    pub body: Option<Value>,
}

impl RequestDescription {
    /// Build a request with the default header set: `Content-Type`,
    /// `Date` taken from `date`, and the client version marker.
    pub fn new(
        method: Method,
        path: &str,
        body: Option<Value>,
        date: Time,
        client_version: &str,
    ) -> Result<Self> {
        if !matches!(
            method,
            Method::GET | Method::POST | Method::PUT | Method::DELETE
        ) {
            return Err(DatahubError::RequestBuild(format!(
                "unsupported HTTP method: {}",
                method
            )));
        }
        validate_path(path)?;

        let mut request = RequestDescription {
            method,
            path: path.to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body,
        };
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        request.set_header(DATE.as_str(), &date.http_date())?;
        request.set_header(CLIENT_VERSION_HEADER, client_version)?;

        Ok(request)
    }

    /// Insert or replace a header
    ///
    /// Values must be visible ASCII so the header is signed as sent.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        if !value.bytes().all(is_header_byte) {
            return Err(DatahubError::RequestBuild(format!(
                "header value for {} is not visible ASCII: {:?}",
                name, value
            )));
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DatahubError::RequestBuild(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| DatahubError::RequestBuild(format!("invalid header value for {}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Header value as a string, empty when absent or not visible ASCII
    pub fn header_str(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Serialized body bytes, empty when there is no body
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        match &self.body {
            Some(body) => Ok(serde_json::to_vec(body)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Visible ASCII plus space and tab
pub(crate) fn is_header_byte(b: u8) -> bool {
    b == b' ' || b == b'\t' || (0x21..0x7f).contains(&b)
}

/// A resource path goes on the wire exactly as it is signed: `/` followed
/// by non-empty segments of unreserved characters, none of them `.` or `..`.
fn validate_path(path: &str) -> Result<()> {
    let segments = match path.strip_prefix('/') {
        Some(rest) => rest,
        None => {
            return Err(DatahubError::RequestBuild(format!(
                "path must start with '/': {}",
                path
            )))
        }
    };

    for segment in segments.split('/') {
        let valid = !segment.is_empty()
            && segment != "."
            && segment != ".."
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'~'));
        if !valid {
            return Err(DatahubError::RequestBuild(format!(
                "invalid path segment {:?} in {:?}",
                segment, path
            )));
        }
    }
    Ok(())
}
