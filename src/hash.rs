//! Hash and encoding helpers used by the signer and blob records.

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;

/// Base64 encode with the standard padded alphabet
pub fn base64_encode(content: &[u8]) -> String {
    STANDARD.encode(content)
}

/// Base64 decode with the standard padded alphabet
pub fn base64_decode(content: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(content)?)
}

/// Base64 encoded HMAC with SHA1 hash.
pub fn base64_hmac_sha1(key: &[u8], content: &[u8]) -> String {
    let mut h = <Hmac<Sha1> as Mac>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    h.update(content);

    base64_encode(&h.finalize().into_bytes())
}
