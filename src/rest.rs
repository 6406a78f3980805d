use crate::client::{Config, HttpTransport, Transport};
use crate::credential::Credential;
use crate::error::{DatahubError, Result};
use crate::request::RequestDescription;
use crate::response::Response;
use crate::sign::authorization;
use crate::time::Time;
use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Context for DataHub REST requests: immutable configuration, credential
/// and the transport requests go through.
#[derive(Clone)]
pub struct RestContext {
    /// Configuration
    pub config: Config,
    /// Access key pair used to sign
    pub credential: Credential,
    transport: Arc<dyn Transport>,
}

impl RestContext {
    /// Create a context sending through a pooled HTTP client
    pub fn new(config: Config, credential: Credential) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, credential, transport))
    }

    /// Create a context with a custom transport
    pub fn with_transport(
        config: Config,
        credential: Credential,
        transport: impl Transport + 'static,
    ) -> Self {
        RestContext {
            config,
            credential,
            transport: Arc::new(transport),
        }
    }

    /// Build the description of a request stamped with the current time
    pub fn prepare(&self, method: Method, path: &str, body: Option<Value>) -> Result<RequestDescription> {
        RequestDescription::new(method, path, body, Time::now(), &self.config.client_version)
    }

    /// Sign and send a request, returning the decoded reply
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, PUT or DELETE)
    /// * `path` - resource path, e.g. `/projects/my_project`
    /// * `body` - JSON body, if any
    pub fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response> {
        let request = self.prepare(method, path, body)?;
        self.send(request)
    }

    /// Sign and send an already prepared request
    pub fn send(&self, mut request: RequestDescription) -> Result<Response> {
        let auth = authorization(&request, &self.credential)?;
        request.set_header(AUTHORIZATION.as_str(), &auth)?;

        let url = self.config.url_for(&request.path, &request.query)?;

        let start = Instant::now();
        let raw = self.transport.send(&url, &request)?;
        debug!(
            "[datahub] {} {} => {} {} ({:?})",
            request.method,
            request.path,
            raw.status,
            raw.status_text,
            start.elapsed()
        );

        if !(200..300).contains(&raw.status) {
            let error =
                DatahubError::service(raw.status, raw.status_text, &raw.body, raw.request_id);
            warn!("[datahub] {} {} failed: {}", request.method, request.path, error);
            return Err(error);
        }

        let data = if raw.body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&raw.body)?
        };

        Ok(Response {
            status: raw.status,
            status_text: raw.status_text,
            data,
            request_id: raw.request_id,
        })
    }
}

impl std::fmt::Debug for RestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestContext")
            .field("config", &self.config)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}
