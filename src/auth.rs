use axum::http::HeaderMap;
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

use crate::config::{BasicAuthCredentials, Config};
use crate::error::{Error, Result};

/// Basic-auth gate for the control surface. Disabled when no credentials
/// are configured.
#[derive(Clone)]
pub struct AuthService {
    credentials: Option<BasicAuthCredentials>,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            credentials: config.basic_auth.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self { credentials: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Decode `Authorization: Basic base64(username:password)`.
    pub fn extract_credentials_from_headers(&self, headers: &HeaderMap) -> Result<BasicAuthCredentials> {
        let auth_header = headers
            .get("Authorization")
            .ok_or_else(|| Error::credentials("Missing Authorization header"))?
            .to_str()
            .map_err(|_| Error::credentials("Invalid Authorization header"))?;

        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or_else(|| Error::credentials("Invalid Authorization header format"))?;

        let decoded = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| Error::credentials("Authorization header is not valid base64"))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| Error::credentials("Authorization header is not valid UTF-8"))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| Error::credentials("Authorization header is missing ':'"))?;

        Ok(BasicAuthCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Both username and password must match.
    pub fn verify(&self, provided: &BasicAuthCredentials) -> bool {
        match &self.credentials {
            None => true,
            Some(expected) => {
                digest_eq(&expected.username, &provided.username)
                    & digest_eq(&expected.password, &provided.password)
            }
        }
    }

    pub fn authorize(&self, headers: &HeaderMap) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let provided = self.extract_credentials_from_headers(headers)?;
        if self.verify(&provided) {
            Ok(())
        } else {
            Err(Error::credentials("Invalid username or password"))
        }
    }
}

// Comparing fixed-size digests keeps the comparison time independent of
// where the inputs first differ.
fn digest_eq(a: &str, b: &str) -> bool {
    Sha256::digest(a.as_bytes()) == Sha256::digest(b.as_bytes())
}
