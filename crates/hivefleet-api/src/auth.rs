use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// A HiveOS personal access token.
///
/// Generated at: <https://the.hiveos.farm> > Account > Sessions > Personal tokens.
/// The secret is only exposed while building the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }

    pub fn secret(&self) -> &SecretString {
        &self.0
    }

    /// Default headers carrying `Authorization: Bearer <token>`.
    ///
    /// The header value is marked sensitive so it never shows up in
    /// reqwest's debug output.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let raw = format!("Bearer {}", self.0.expose_secret().trim());
        let mut value = HeaderValue::from_str(&raw).map_err(|e| Error::Authentication {
            message: format!("invalid access token header value: {e}"),
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

impl From<SecretString> for AccessToken {
    fn from(token: SecretString) -> Self {
        Self::new(token)
    }
}
