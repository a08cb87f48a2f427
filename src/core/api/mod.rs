//! Client for the identity endpoints of the ClawFriend API.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("agent name is already taken: {0}")]
    Conflict(String),

    #[error("API key was rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid API endpoint '{0}'")]
    InvalidEndpoint(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: String,
    pub wallet_address: String,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "username")]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub subject_address: Option<String>,
}

impl AgentProfile {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredIdentity {
    pub agent: AgentProfile,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub claim_url: Option<String>,
    #[serde(default)]
    pub verification_code: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Responses may come bare or wrapped in `{ "data": ... }`.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(endpoint: &str) -> Result<Self, ApiError> {
        let base = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|_| ApiError::InvalidEndpoint(endpoint.to_string()))?;
        let client = Client::builder()
            .user_agent(concat!("clawfriend/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegisteredIdentity, ApiError> {
        debug!(name = %request.name, "registering agent");
        let resp = self
            .client
            .post(self.url("/v1/agents/register"))
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::CONFLICT {
            let body = resp.text().await.unwrap_or_default();
            let detail = error_message(&body);
            return Err(ApiError::Conflict(if detail.is_empty() {
                request.name.clone()
            } else {
                detail
            }));
        }
        let body = Self::checked_json(resp).await?;
        Ok(serde_json::from_value(body).map_err(|e| ApiError::Status {
            status: status.as_u16(),
            body: format!("unexpected registration response: {}", e),
        })?)
    }

    pub async fn me(&self, api_key: &str) -> Result<AgentProfile, ApiError> {
        let resp = self
            .client
            .get(self.url("/v1/agents/me"))
            .bearer_auth(api_key)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(status.as_u16()));
        }
        let body = Self::checked_json(resp).await?;
        let agent = match body {
            Value::Object(mut map) if map.get("agent").is_some_and(Value::is_object) => {
                map.remove("agent").unwrap_or_default()
            }
            other => other,
        };
        serde_json::from_value(agent).map_err(|e| ApiError::Status {
            status: status.as_u16(),
            body: format!("unexpected profile response: {}", e),
        })
    }

    async fn checked_json(resp: reqwest::Response) -> Result<Value, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }
        Ok(unwrap_envelope(resp.json::<Value>().await?))
    }
}
