//! Request canonicalization and HMAC-SHA1 signing.
//!
//! The string to sign is
//!
//! ```text
//! METHOD\nContent-Type\nDate\nCanonicalizedHeaders\nCanonicalizedResource
//! ```
//!
//! where `CanonicalizedHeaders` are the lower-cased `x-datahub-*` headers
//! sorted by name and `CanonicalizedResource` is the path followed by the
//! sorted query string, if any.

use crate::credential::Credential;
use crate::error::{DatahubError, Result};
use crate::hash::base64_hmac_sha1;
use crate::request::{is_header_byte, RequestDescription, DATAHUB_HEADER_PREFIX};
use log::trace;
use reqwest::header::{HeaderMap, CONTENT_TYPE, DATE};

/// Scheme name placed in front of the Authorization value.
pub const AUTHORIZATION_SCHEME: &str = "DATAHUB";

/// Render the `x-datahub-*` headers as sorted `name:value` lines.
///
/// Returns an empty string when no such header is present.
pub fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut datahub_headers: Vec<(String, &str)> = headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str().to_lowercase();
            if !name.starts_with(DATAHUB_HEADER_PREFIX) {
                return None;
            }
            value.to_str().ok().map(|v| (name, v.trim()))
        })
        .collect();

    datahub_headers.sort_by(|a, b| a.0.cmp(&b.0));

    datahub_headers
        .iter()
        .map(|(name, value)| format!("{}:{}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the resource: the path, plus `?` and the sorted query when present.
pub fn canonicalized_resource(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let mut params: Vec<&(String, String)> = query.iter().collect();
    params.sort();

    let query_string = params
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                k.clone()
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", path, query_string)
}

/// Build the exact string that gets signed.
pub fn string_to_sign(req: &RequestDescription) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}",
        req.method.as_str(),
        req.header_str(CONTENT_TYPE.as_str()),
        req.header_str(DATE.as_str()),
        canonicalized_headers(&req.headers),
        canonicalized_resource(&req.path, &req.query),
    )
}

/// Compute the base64 HMAC-SHA1 signature of a request.
///
/// Fails with a configuration error when either credential half is empty,
/// and refuses `x-datahub-*` headers that could not be canonicalized.
pub fn sign(req: &RequestDescription, cred: &Credential) -> Result<String> {
    cred.check()?;

    for (name, value) in req.headers.iter() {
        if name.as_str().starts_with(DATAHUB_HEADER_PREFIX)
            && !value.as_bytes().iter().all(|b| is_header_byte(*b))
        {
            return Err(DatahubError::RequestBuild(format!(
                "header {} is not visible ASCII and cannot be signed",
                name
            )));
        }
    }

    let canonical = string_to_sign(req);
    trace!("string to sign: {:?}", canonical);

    Ok(base64_hmac_sha1(
        cred.access_key_secret().as_bytes(),
        canonical.as_bytes(),
    ))
}

/// Compute the full `Authorization` header value, `DATAHUB {id}:{signature}`.
pub fn authorization(req: &RequestDescription, cred: &Credential) -> Result<String> {
    let signature = sign(req, cred)?;
    Ok(format!(
        "{} {}:{}",
        AUTHORIZATION_SCHEME, cred.access_key_id, signature
    ))
}
