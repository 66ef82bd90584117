//! Callback delivery: one JSON POST per relay, never retried.

use std::time::Duration;

use ar_domain::config::CallbackConfig;
use ar_domain::error::{Error, Result};
use ar_domain::relay::StatusPayload;

/// What happened to a callback POST. Only used for logging and tests; the
/// caller of the relay never sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { status: u16 },
    Rejected { status: u16 },
    Failed { error: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

pub struct CallbackClient {
    client: reqwest::Client,
    user_agent: String,
}

impl CallbackClient {
    pub fn from_config(cfg: &CallbackConfig) -> Result<Self> {
        if !cfg.verify_tls {
            tracing::warn!("callback TLS certificate verification is DISABLED");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .danger_accept_invalid_certs(!cfg.verify_tls)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            user_agent: cfg.user_agent.clone(),
        })
    }

    /// POST `payload` to `url` once. Failures are logged and swallowed.
    pub async fn deliver(&self, url: &str, payload: &StatusPayload) -> DeliveryOutcome {
        let result = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(url = %url, status = %resp.status(), "callback delivered");
                DeliveryOutcome::Delivered {
                    status: resp.status().as_u16(),
                }
            }
            Ok(resp) => {
                tracing::warn!(
                    url = %url,
                    status = %resp.status(),
                    "callback returned non-success status"
                );
                DeliveryOutcome::Rejected {
                    status: resp.status().as_u16(),
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "callback delivery failed");
                DeliveryOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_verification_disabled() {
        let cfg = CallbackConfig {
            verify_tls: false,
            ..CallbackConfig::default()
        };
        let client = CallbackClient::from_config(&cfg).unwrap();
        assert_eq!(client.user_agent, "AssistantRelay-Callback/1.0");
    }

    #[test]
    fn builds_with_default_config() {
        let cfg = CallbackConfig::default();
        assert!(cfg.verify_tls);
        assert!(CallbackClient::from_config(&cfg).is_ok());
    }

    #[tokio::test]
    async fn connection_refused_is_failed() {
        let client = CallbackClient::from_config(&CallbackConfig::default()).unwrap();
        let payload = StatusPayload::success("Hello!", "thread_1");
        let outcome = client.deliver("http://127.0.0.1:1/cb", &payload).await;
        assert!(matches!(outcome, DeliveryOutcome::Failed { .. }));
        assert!(!outcome.is_delivered());
    }
}
