use crate::error::{DatahubError, Result};

/// Credential holds the access key pair used to sign every request.
#[derive(Clone, Default)]
pub struct Credential {
    /// Access key identifier, sent in clear inside the Authorization header
    pub access_key_id: String,
    /// Shared secret used as the HMAC key, never sent
    access_key_secret: String,
}

impl Credential {
    /// Create a new Credential from an access key id and secret
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Credential {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }

    /// The signing secret
    pub fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }

    /// Fail with a configuration error unless both halves of the key pair are present
    pub fn check(&self) -> Result<()> {
        if self.access_key_id.is_empty() || self.access_key_secret.is_empty() {
            return Err(DatahubError::Configuration(
                "missing access key id or access key secret".to_string(),
            ));
        }
        Ok(())
    }
}

// Implement Debug manually to avoid exposing the secret
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}
