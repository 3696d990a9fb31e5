use crate::core::payload_fix::PayloadFix;
use crate::domain::model::{CallOutcome, HttpReply};
use crate::domain::ports::Transport;
use serde_json::Value;
use std::time::Duration;

pub const MAX_RETRIES: u32 = 3;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Attempt budget and exponential backoff (doubling) between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, INITIAL_BACKOFF)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// Delay before the retry that follows the `retry`-th (0-based) failure.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

/// POSTs JSON bodies through a [`Transport`], retrying transient failures.
///
/// * 2xx returns immediately.
/// * 429 and 5xx back off and retry.
/// * Transport errors back off and retry.
/// * Other 4xx return immediately, unless the body names a vendor error that
///   a [`PayloadFix`] can repair; then the body is rewritten and resent once
///   per fix without consuming the retry budget.
pub struct RetryClient<T: Transport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `body` may be rewritten by payload fixes; callers see the final form.
    pub async fn post(&self, url: &str, body: &mut Value) -> CallOutcome {
        let mut budget = self.policy.max_retries;
        let mut attempts = 0;
        let mut retries = 0;
        let mut applied: Vec<PayloadFix> = Vec::new();
        let mut last_error: Option<String> = None;

        while attempts < budget {
            attempts += 1;

            match self.transport.post_json(url, body).await {
                Ok(reply) if reply.is_success() => {
                    tracing::debug!(url, status = reply.status, attempts, "delivered");
                    return CallOutcome {
                        response: Some(reply),
                        attempts,
                        error: None,
                    };
                }
                Ok(reply) => {
                    if let Some(fix) = self.try_fix(&reply, body, &mut applied) {
                        tracing::warn!(url, ?fix, "vendor rejected payload; resending with fix");
                        budget += 1;
                        continue;
                    }

                    last_error = Some(status_message(&reply));

                    if !reply.is_retryable() {
                        tracing::warn!(url, status = reply.status, attempts, "request rejected");
                        return CallOutcome {
                            response: Some(reply),
                            attempts,
                            error: last_error,
                        };
                    }

                    tracing::warn!(url, status = reply.status, attempts, "transient failure");
                }
                Err(e) => {
                    tracing::warn!(url, attempts, error = %e, "request error");
                    last_error = Some(e.to_string());
                }
            }

            if attempts < budget {
                let delay = self.policy.delay_for(retries);
                retries += 1;
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(url, attempts, "giving up after retries");
        CallOutcome {
            response: None,
            attempts,
            error: last_error,
        }
    }

    fn try_fix(
        &self,
        reply: &HttpReply,
        body: &mut Value,
        applied: &mut Vec<PayloadFix>,
    ) -> Option<PayloadFix> {
        let fix = PayloadFix::for_reply(reply)?;
        if applied.contains(&fix) || !fix.apply(body) {
            return None;
        }
        applied.push(fix);
        Some(fix)
    }
}

fn status_message(reply: &HttpReply) -> String {
    format!("Status {}: {}", reply.status, reply.body)
}
