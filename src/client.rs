use crate::error::{DatahubError, Result};
use crate::request::RequestDescription;
use reqwest::blocking::{Client, ClientBuilder};
use std::time::Duration;
use url::form_urlencoded::byte_serialize;
use url::Url;

/// Create the HTTP client for REST API requests
/// with the pool and timeout settings from the configuration
pub fn create_rest_client(config: &Config) -> Result<Client> {
    Ok(ClientBuilder::new()
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()?)
}

/// Configuration for the DataHub client
#[derive(Debug, Clone)]
pub struct Config {
    /// Service endpoint, e.g. `https://dh-cn-shanghai.aliyuncs.com`
    pub endpoint: Url,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
    /// Value of the `x-datahub-client-version` header
    pub client_version: String,
}

impl Config {
    /// Create a new configuration for the given endpoint URL
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(DatahubError::Configuration(format!(
                    "unsupported endpoint scheme: {}",
                    other
                )))
            }
        }

        Ok(Config {
            endpoint,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 50,
            client_version: "1.1".to_string(),
        })
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle pool size per host
    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Override the client version marker
    pub fn with_client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = version.into();
        self
    }

    /// Full URL for a resource path, query included
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = self.endpoint.join(path)?;
        if url.path() != path {
            return Err(DatahubError::RequestBuild(format!(
                "path {:?} would be sent as {:?}",
                path,
                url.path()
            )));
        }
        if !query.is_empty() {
            let query_string = query
                .iter()
                .map(|(k, v)| {
                    let k: String = byte_serialize(k.as_bytes()).collect();
                    if v.is_empty() {
                        k
                    } else {
                        format!("{}={}", k, byte_serialize(v.as_bytes()).collect::<String>())
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
        Ok(url)
    }
}

/// Raw reply handed back by a transport
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub request_id: Option<String>,
    pub body: Vec<u8>,
}

/// Transport sends a signed request and returns whatever the server replied.
///
/// Any HTTP status counts as a reply; only a missing response is an error.
pub trait Transport: Send + Sync {
    fn send(&self, url: &Url, request: &RequestDescription) -> Result<RawResponse>;
}

/// Transport backed by a pooled reqwest blocking client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport using the configuration's pool and timeouts
    pub fn new(config: &Config) -> Result<Self> {
        Ok(HttpTransport {
            client: create_rest_client(config)?,
        })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    fn send(&self, url: &Url, request: &RequestDescription) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), url.as_str())
            .headers(request.headers.clone());

        let body = request.body_bytes()?;
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let http_response = builder.send()?;
        let status = http_response.status();

        let request_id = http_response
            .headers()
            .get("x-datahub-request-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = http_response.bytes()?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            request_id,
            body: body.to_vec(),
        })
    }
}
