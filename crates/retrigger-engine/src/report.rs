//! Outcome reporting: structured events plus best-effort notifications.
//!
//! The reporter sits outside the decision pipeline: it never blocks it and
//! never fails it. Notifications are dispatched fire-and-forget on a
//! spawned task; the send result is awaited there only to log failures.
//! Discarding that result is deliberate - notification delivery is not
//! retried and never surfaces to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use retrigger_core::{BatchSummary, OutcomeStatus, RunId, TaskOutcome, TaskSpec};
use thiserror::Error;
use tracing::{error, info, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Notification channel errors. Logged and swallowed at the reporter
/// boundary, never propagated.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure or timeout.
    #[error("notification transport failure: {0}")]
    Network(String),

    /// The channel rejected the message.
    #[error("notification channel returned HTTP {0}")]
    Status(u16),
}

/// Human-readable notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one message. Best-effort; the caller discards the result.
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Notifier that drops every message. Used when the notification channel
/// is not configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier backed by the Telegram Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    /// Create a notifier for the given bot token and chat.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::with_api_base(bot_token, chat_id, TELEGRAM_API_BASE)
    }

    /// Create a notifier pointed at a non-default API base (tests).
    pub fn with_api_base(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(&url)
            .timeout(NOTIFY_TIMEOUT)
            .json(&serde_json::json!({ "chat_id": self.chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Turns per-task outcomes into structured log events and best-effort
/// notifications.
#[derive(Clone)]
pub struct Reporter {
    notifier: Arc<dyn Notifier>,
}

impl Reporter {
    /// Create a reporter sending through `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Emit the task-start event.
    pub fn task_started(&self, spec: &TaskSpec) {
        info!(task = %spec.name, mode = ?spec.mode, "Processing task");
    }

    /// Emit the event for a terminal outcome and notify where configured:
    /// triggers and failures always, skips only when `notify_on_skip`.
    pub fn outcome(&self, spec: &TaskSpec, outcome: &TaskOutcome) {
        match outcome.status {
            OutcomeStatus::Triggered => {
                info!(
                    task = %spec.name,
                    dispatch = %spec.dispatch,
                    reason = %outcome.reason,
                    "Workflow dispatched"
                );
                self.send(format!(
                    "Triggered {} for '{}' ({})",
                    spec.dispatch, spec.name, outcome.reason
                ));
            }
            OutcomeStatus::Skipped => {
                info!(
                    task = %spec.name,
                    reason = %outcome.reason,
                    remaining_secs = outcome.remaining.map(|r| r.as_secs()),
                    "Task skipped"
                );
                if spec.notify_on_skip {
                    let detail = match outcome.remaining {
                        Some(r) => format!(" ({}s of cooldown left)", r.as_secs()),
                        None => String::new(),
                    };
                    self.send(format!(
                        "Skipped '{}': {}{}",
                        spec.name, outcome.reason, detail
                    ));
                }
            }
            OutcomeStatus::Failed => {
                error!(
                    task = %spec.name,
                    kind = %outcome.reason,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "Task failed"
                );
                self.send(format!(
                    "Task '{}' failed [{}]: {}",
                    spec.name,
                    outcome.reason,
                    outcome.error.as_deref().unwrap_or("unknown")
                ));
            }
        }
    }

    /// Emit the batch summary event.
    pub fn batch_summary(&self, run_id: &RunId, summary: &BatchSummary) {
        info!(
            run_id = %run_id,
            total = summary.total,
            triggered = summary.triggered,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch complete"
        );
    }

    /// Fire-and-forget dispatch. The spawned task awaits the send only to
    /// log a failure; nothing is retried or surfaced.
    fn send(&self, text: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&text).await {
                warn!(error = %e, "Notification failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrigger_core::{DispatchTarget, ErrorKind, TaskMode};
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct RecordingNotifier {
        tx: mpsc::UnboundedSender<String>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, text: &str) -> Result<(), NotifyError> {
            self.tx.send(text.to_string()).ok();
            if self.fail {
                Err(NotifyError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    fn spec(notify_on_skip: bool) -> TaskSpec {
        TaskSpec {
            name: "staging-redeploy".to_string(),
            mode: TaskMode::Conditional,
            check_url: Some("https://x/y".to_string()),
            trigger_status_codes: vec![404],
            dispatch: DispatchTarget {
                owner: "filipelabs".to_string(),
                repo: "staging".to_string(),
                workflow_id: "deploy.yml".to_string(),
                r#ref: "main".to_string(),
            },
            cooldown: Duration::from_secs(3600),
            notify_on_skip,
        }
    }

    fn recording(fail: bool) -> (Reporter, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Reporter::new(Arc::new(RecordingNotifier { tx, fail }));
        (reporter, rx)
    }

    #[tokio::test]
    async fn triggered_outcome_notifies_unconditionally() {
        let (reporter, mut rx) = recording(false);
        let spec = spec(false);
        reporter.outcome(&spec, &TaskOutcome::condition_met(&spec.name));

        let text = rx.recv().await.unwrap();
        assert!(text.contains("Triggered"));
        assert!(text.contains("staging-redeploy"));
        assert!(text.contains("condition_met"));
    }

    #[tokio::test]
    async fn skip_respects_notify_on_skip_flag() {
        let (reporter, mut rx) = recording(false);
        let silent = spec(false);
        reporter.outcome(&silent, &TaskOutcome::status_not_trigger(&silent.name));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "skip must not notify when disabled");

        let chatty = spec(true);
        reporter.outcome(
            &chatty,
            &TaskOutcome::cooldown_active(&chatty.name, Duration::from_secs(3000)),
        );
        let text = rx.recv().await.unwrap();
        assert!(text.contains("cooldown_active"));
        assert!(text.contains("3000s"));
    }

    #[tokio::test]
    async fn failed_outcome_notifies_with_kind() {
        let (reporter, mut rx) = recording(false);
        let spec = spec(false);
        reporter.outcome(
            &spec,
            &TaskOutcome::failed(&spec.name, ErrorKind::Timeout, "probe timed out"),
        );
        let text = rx.recv().await.unwrap();
        assert!(text.contains("TIMEOUT"));
        assert!(text.contains("probe timed out"));
    }

    #[tokio::test]
    async fn notification_failure_is_swallowed() {
        let (reporter, mut rx) = recording(true);
        let spec = spec(false);
        // Must not panic or propagate anything.
        reporter.outcome(&spec, &TaskOutcome::condition_met(&spec.name));
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn telegram_notifier_posts_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botsecret/sendMessage"))
            .and(body_json(
                serde_json::json!({ "chat_id": "42", "text": "hello" }),
            ))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::with_api_base("secret", "42", server.uri());
        notifier.notify("hello").await.unwrap();
    }

    #[tokio::test]
    async fn telegram_non_success_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::with_api_base("secret", "42", server.uri());
        let err = notifier.notify("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Status(403)));
    }
}
