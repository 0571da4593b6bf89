//! Signed REST action sender (spec.md §4.I).
//!
//! Wraps `reqwest` with a per-call timeout and a circuit breaker so a
//! string of failing calls fails fast instead of piling up blocked
//! Receiver-thread calls (`place_order` runs the REST call synchronously
//! on the Receiver, per spec.md §5).

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};

use super::signer::Signature;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("circuit breaker open, venue REST considered down")]
    CircuitOpen,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("venue returned http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("response decode error: {0}")]
    Decode(String),
}

pub struct RestClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    breaker: CircuitBreaker,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            timeout,
            breaker: CircuitBreaker::new(CircuitBreakerConfig::default()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.breaker.is_call_permitted()
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, RestError> {
        if !self.breaker.is_call_permitted() {
            return Err(RestError::CircuitOpen);
        }

        let url = format!("{}{path}", self.base_url);
        let send = self.client.post(&url).json(body).timeout(self.timeout).send();

        let result = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(response)) => {
                let status = response.status();
                match response.text().await {
                    Ok(text) if status.is_success() => serde_json::from_str(&text)
                        .map_err(|e| RestError::Decode(e.to_string())),
                    Ok(text) => Err(RestError::Http { status: status.as_u16(), body: text }),
                    Err(e) => Err(RestError::Transport(e.to_string())),
                }
            }
            Ok(Err(e)) => Err(RestError::Transport(e.to_string())),
            Err(_) => Err(RestError::Timeout),
        };

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(_) => self.breaker.record_failure(),
        }
        result
    }

    /// Public `/info` query; never signed.
    pub async fn post_info(&self, payload: &Value) -> Result<Value, RestError> {
        self.post("/info", payload).await
    }

    /// Signed `/exchange` action, per spec.md §4.I place/cancel/modify.
    pub async fn post_exchange(
        &self,
        action: Value,
        nonce: u64,
        signature: Signature,
    ) -> Result<Value, RestError> {
        let body = serde_json::json!({
            "action": action,
            "nonce": nonce,
            "signature": signature,
            "vaultAddress": Value::Null,
        });
        self.post("/exchange", &body).await
    }
}

/// True when the venue's exchange response indicates rejection, with the
/// human-readable reason extracted for reason-code mapping.
pub fn exchange_error(response: &Value) -> Option<String> {
    if response.get("status").and_then(|v| v.as_str()) != Some("err") {
        return extract_status_error(response);
    }
    let text = response
        .get("response")
        .map(|r| match r {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "unknown venue error".to_string());
    Some(text)
}

/// Hyperliquid can return top-level `status: ok` while an individual order
/// in `response.data.statuses[]` still carries an `error`.
fn extract_status_error(response: &Value) -> Option<String> {
    let statuses = response.pointer("/response/data/statuses")?.as_array()?;
    statuses.first()?.get("error")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_err_status_is_an_error() {
        let response = json!({"status": "err", "response": "insufficient margin"});
        assert_eq!(exchange_error(&response).as_deref(), Some("insufficient margin"));
    }

    #[test]
    fn per_order_error_inside_ok_envelope_is_an_error() {
        let response = json!({
            "status": "ok",
            "response": {"data": {"statuses": [{"error": "tickRejected"}]}}
        });
        assert_eq!(exchange_error(&response).as_deref(), Some("tickRejected"));
    }

    #[test]
    fn fully_successful_response_has_no_error() {
        let response = json!({
            "status": "ok",
            "response": {"data": {"statuses": [{"resting": {"oid": 1}}]}}
        });
        assert_eq!(exchange_error(&response), None);
    }
}
