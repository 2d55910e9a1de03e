//! Policy-decision collaborator guarding the public image-search path.
//!
//! The decision service is keyed by caller address and evaluated once per
//! call; a denial either carries rate-limit quota details or is a generic
//! policy rejection.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
}

/// Quota details attached to a rate-limit denial.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub reset_seconds: u64,
}

#[derive(Debug, Clone)]
pub enum PolicyDecision {
    Allow,
    DenyRateLimited(RateLimitInfo),
    Deny,
}

#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Evaluate one request against the caller's quota.
    async fn check(&self, client_ip: &str, requested: u32) -> Result<PolicyDecision, PolicyError>;
}

#[derive(Debug, Serialize)]
struct DecisionRequest<'a> {
    ip: &'a str,
    requested: u32,
}

#[derive(Debug, Deserialize)]
struct DecisionResponse {
    allowed: bool,
    reason: Option<DecisionReason>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DecisionReason {
    RateLimit {
        remaining: u32,
        reset_seconds: u64,
    },
    #[serde(other)]
    Other,
}

/// HTTP client for the external policy-decision endpoint.
#[derive(Debug, Clone)]
pub struct HttpPolicyClient {
    http: Client,
    endpoint: String,
}

impl HttpPolicyClient {
    pub fn new(endpoint: String) -> Result<Self, PolicyError> {
        let http = Client::builder()
            .user_agent(concat!("carhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PolicyError::Transport(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    fn decision_from(response: DecisionResponse) -> PolicyDecision {
        if response.allowed {
            return PolicyDecision::Allow;
        }
        match response.reason {
            Some(DecisionReason::RateLimit {
                remaining,
                reset_seconds,
            }) => PolicyDecision::DenyRateLimited(RateLimitInfo {
                remaining,
                reset_seconds,
            }),
            _ => PolicyDecision::Deny,
        }
    }
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn check(&self, client_ip: &str, requested: u32) -> Result<PolicyDecision, PolicyError> {
        let res = self
            .http
            .post(&self.endpoint)
            .json(&DecisionRequest {
                ip: client_ip,
                requested,
            })
            .send()
            .await
            .map_err(|e| PolicyError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(PolicyError::Http { status, body });
        }

        let decision = res
            .json::<DecisionResponse>()
            .await
            .map_err(|e| PolicyError::Serde(e.to_string()))?;

        Ok(Self::decision_from(decision))
    }
}

/// Fallback used when no policy service is configured.
#[derive(Debug, Clone, Default)]
pub struct AllowAllPolicy;

#[async_trait]
impl PolicyClient for AllowAllPolicy {
    async fn check(
        &self,
        _client_ip: &str,
        _requested: u32,
    ) -> Result<PolicyDecision, PolicyError> {
        Ok(PolicyDecision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_decision() {
        let response: DecisionResponse = serde_json::from_str(r#"{"allowed": true}"#).unwrap();
        assert!(matches!(
            HttpPolicyClient::decision_from(response),
            PolicyDecision::Allow
        ));
    }

    #[test]
    fn test_rate_limit_denial_carries_quota() {
        let response: DecisionResponse = serde_json::from_str(
            r#"{"allowed": false, "reason": {"kind": "rate_limit", "remaining": 0, "reset_seconds": 42}}"#,
        )
        .unwrap();
        match HttpPolicyClient::decision_from(response) {
            PolicyDecision::DenyRateLimited(info) => {
                assert_eq!(info.remaining, 0);
                assert_eq!(info.reset_seconds, 42);
            }
            other => panic!("expected rate-limit denial, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_denial() {
        let response: DecisionResponse =
            serde_json::from_str(r#"{"allowed": false, "reason": {"kind": "shield"}}"#).unwrap();
        assert!(matches!(
            HttpPolicyClient::decision_from(response),
            PolicyDecision::Deny
        ));
    }

    #[test]
    fn test_denial_without_reason() {
        let response: DecisionResponse = serde_json::from_str(r#"{"allowed": false}"#).unwrap();
        assert!(matches!(
            HttpPolicyClient::decision_from(response),
            PolicyDecision::Deny
        ));
    }
}
