// Async HTTP client for the HiveOS REST API (v2).
//
// Base path: https://api2.hiveos.farm/api/v2/
// Auth: `Authorization: Bearer <token>` default header

use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::AccessToken;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{self, AccountProfile, CommandBody, Farm, WorkerCommand, WorkerRecord};

/// The hosted HiveOS API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api2.hiveos.farm/api/v2";

/// How much of an error body ends up in log lines.
const BODY_PREVIEW_LEN: usize = 200;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the HiveOS API.
///
/// Cheap to share behind an `Arc`: the underlying `reqwest::Client` pools
/// connections across all farms and workers.
#[derive(Debug, Clone)]
pub struct HiveClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HiveClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an access token and transport config.
    ///
    /// Injects `Authorization: Bearer <token>` as a default header.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let headers = AccessToken::new(token.clone()).headers()?;
        let http = transport.build_client(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    ///
    /// `https://host/api/v2` → `https://host/api/v2/`
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The normalized API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "response body received");

        let value: Value =
            serde_json::from_str(&body).map_err(|e| deserialization_error(&e, body.clone()))?;
        serde_json::from_value(types::unwrap_envelope(value))
            .map_err(|e| deserialization_error(&e, body))
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    /// Classify a non-success response.
    ///
    /// 401 is checked first: the setup flow matches on `Authentication`
    /// specifically, regardless of what the body says.
    async fn parse_error(&self, status: StatusCode, resp: reqwest::Response) -> Error {
        let body = resp.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: if body.is_empty() {
                    "access token rejected".into()
                } else {
                    preview(&body).to_owned()
                },
            };
        }

        debug!(status = status.as_u16(), body = preview(&body), "request failed");
        Error::Api {
            status: status.as_u16(),
            body,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Account ──────────────────────────────────────────────────────

    pub async fn get_account_profile(&self) -> Result<AccountProfile, Error> {
        self.get("account/profile").await
    }

    // ── Farms ────────────────────────────────────────────────────────

    pub async fn list_farms(&self) -> Result<Vec<Farm>, Error> {
        self.get("farms").await
    }

    // ── Workers ──────────────────────────────────────────────────────

    pub async fn list_workers(&self, farm_id: u64) -> Result<Vec<WorkerRecord>, Error> {
        self.get(&format!("farms/{farm_id}/workers")).await
    }

    pub async fn get_worker(&self, farm_id: u64, worker_id: u64) -> Result<WorkerRecord, Error> {
        self.get(&format!("farms/{farm_id}/workers/{worker_id}"))
            .await
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send a typed command. The response body is discarded on success.
    pub async fn send_command(
        &self,
        farm_id: u64,
        worker_id: u64,
        command: &WorkerCommand,
    ) -> Result<(), Error> {
        let data = command.data();
        self.send_raw_command(farm_id, worker_id, command.name(), data.as_ref())
            .await
    }

    /// Send an arbitrary command name with an optional `data` payload.
    pub async fn send_raw_command(
        &self,
        farm_id: u64,
        worker_id: u64,
        command: &str,
        data: Option<&Value>,
    ) -> Result<(), Error> {
        self.post_no_response(
            &format!("farms/{farm_id}/workers/{worker_id}/command"),
            &CommandBody { command, data },
        )
        .await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn deserialization_error(err: &serde_json::Error, body: String) -> Error {
    Error::Deserialization {
        message: format!("{err} (body preview: {:?})", preview(&body)),
        body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = HiveClient::normalize_base_url(DEFAULT_BASE_URL).unwrap();
        assert_eq!(url.as_str(), "https://api2.hiveos.farm/api/v2/");
        assert_eq!(
            url.join("farms/3/workers").unwrap().as_str(),
            "https://api2.hiveos.farm/api/v2/farms/3/workers"
        );
    }

    #[test]
    fn base_url_with_trailing_slash_is_unchanged() {
        let url = HiveClient::normalize_base_url("http://localhost:8080/api/v2/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v2/");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), BODY_PREVIEW_LEN);
        assert_eq!(preview("short"), "short");
    }
}
