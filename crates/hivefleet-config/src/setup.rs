// ── Setup validation ──
//
// Checks a candidate access token against the live API before it is
// saved. A rejected token is reported against the `access_token` field
// so interactive setup can re-prompt for that field alone.

use hivefleet_api::AccountProfile;
use hivefleet_core::{CoreError, FleetConfig};
use thiserror::Error;
use tracing::{debug, warn};

/// Field name reported when the token is rejected.
pub const ACCESS_TOKEN_FIELD: &str = "access_token";

/// Reason code reported when the token is rejected.
pub const INVALID_AUTH: &str = "invalid_auth";

#[derive(Debug, Error)]
pub enum SetupError {
    /// The API rejected the value of a specific input field.
    #[error("{field} rejected: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("cannot connect to {url}: {message}")]
    CannotConnect { url: String, message: String },

    #[error("unexpected error during setup: {0}")]
    Unknown(String),
}

impl SetupError {
    pub fn is_invalid_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidField {
                field: ACCESS_TOKEN_FIELD,
                reason: INVALID_AUTH,
            }
        )
    }
}

/// Validate the token in `config` by fetching the account profile.
///
/// Authentication rejection becomes `InvalidField { field:
/// "access_token", reason: "invalid_auth" }`; connection problems become
/// `CannotConnect`; anything else is `Unknown`.
pub async fn validate_access_token(config: &FleetConfig) -> Result<AccountProfile, SetupError> {
    let url = config.api_url.to_string();
    let client = config.client().map_err(|e| classify(e, &url))?;

    debug!(url = %url, "validating access token");
    match client.get_account_profile().await {
        Ok(profile) => Ok(profile),
        Err(e) => {
            let err = classify(CoreError::from(e), &url);
            warn!(error = %err, "access token validation failed");
            Err(err)
        }
    }
}

fn classify(err: CoreError, url: &str) -> SetupError {
    match err {
        CoreError::AuthenticationFailed { .. } => SetupError::InvalidField {
            field: ACCESS_TOKEN_FIELD,
            reason: INVALID_AUTH,
        },
        CoreError::ConnectionFailed { reason } => SetupError::CannotConnect {
            url: url.into(),
            message: reason,
        },
        CoreError::Timeout { .. } | CoreError::TransportTimeout => SetupError::CannotConnect {
            url: url.into(),
            message: "request timed out".into(),
        },
        other => SetupError::Unknown(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config_for(server: &MockServer, token: &str) -> FleetConfig {
        FleetConfig::new(
            format!("{}/api/v2", server.uri()).parse().unwrap(),
            SecretString::from(token.to_string()),
        )
    }

    #[tokio::test]
    async fn valid_token_returns_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/account/profile"))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 1, "login": "miner" }
            })))
            .mount(&server)
            .await;

        let profile = validate_access_token(&config_for(&server, "good"))
            .await
            .unwrap();

        assert_eq!(profile.login, "miner");
    }

    #[tokio::test]
    async fn rejected_token_is_a_field_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/account/profile"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthenticated." })),
            )
            .mount(&server)
            .await;

        let err = validate_access_token(&config_for(&server, "bad"))
            .await
            .unwrap_err();

        assert!(err.is_invalid_auth(), "got {err:?}");
    }

    #[tokio::test]
    async fn server_error_is_not_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/account/profile"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = validate_access_token(&config_for(&server, "good"))
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::Unknown(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_api_cannot_connect() {
        let config = FleetConfig::new(
            "http://127.0.0.1:1/api/v2".parse().unwrap(),
            SecretString::from("t".to_string()),
        );

        let err = validate_access_token(&config).await.unwrap_err();

        assert!(matches!(err, SetupError::CannotConnect { .. }), "got {err:?}");
    }
}
