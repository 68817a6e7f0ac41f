//! Outbound calls: the conditional-check probe and the workflow dispatch.
//!
//! Both operations are independently timeout-bound. A probe returns whatever
//! status code the target answers with; only non-response conditions
//! (timeout, DNS, connection refused) are errors. A dispatch treats any
//! non-success response as an error carrying the remote status and body.

use std::time::Duration;

use async_trait::async_trait;
use retrigger_core::{DispatchTarget, ErrorKind};
use thiserror::Error;
use tracing::debug;

/// Probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatch timeout.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(15);

const GITHUB_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("retrigger/", env!("CARGO_PKG_VERSION"));

/// Errors raised by the actuator. Each variant carries the structured data
/// needed for classification; no message-text inspection anywhere.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// The operation exceeded its timeout and the request was cancelled.
    #[error("{op} did not complete within {timeout:?}")]
    Timeout { op: &'static str, timeout: Duration },

    /// Transport-level failure (DNS, connect, TLS).
    #[error("{op} transport failure: {message}")]
    Network { op: &'static str, message: String },

    /// The remote answered with a non-success status.
    #[error("remote returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
}

impl ActuatorError {
    /// Advisory classification for observability.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network { .. } => ErrorKind::NetworkError,
            Self::Status { code, .. } => ErrorKind::from_status(*code),
        }
    }

    fn from_reqwest(op: &'static str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { op, timeout }
        } else {
            Self::Network {
                op,
                message: err.to_string(),
            }
        }
    }
}

/// The two outbound operations the decision engine needs.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Issue a read-only request against `url` and return its status code.
    async fn probe(&self, url: &str) -> Result<u16, ActuatorError>;

    /// Remotely start the named workflow on the named ref.
    async fn dispatch(&self, target: &DispatchTarget) -> Result<(), ActuatorError>;
}

/// Actuator backed by the GitHub REST API.
pub struct GithubActuator {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl GithubActuator {
    /// Create an actuator using the given dispatch credential.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, GITHUB_API_BASE)
    }

    /// Create an actuator pointed at a non-default API base (tests).
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Actuator for GithubActuator {
    async fn probe(&self, url: &str) -> Result<u16, ActuatorError> {
        debug!(url = %url, "Probing check target");

        let response = self
            .client
            .get(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ActuatorError::from_reqwest("probe", PROBE_TIMEOUT, e))?;

        Ok(response.status().as_u16())
    }

    async fn dispatch(&self, target: &DispatchTarget) -> Result<(), ActuatorError> {
        let url = format!(
            "{}/repos/{}/{}/actions/workflows/{}/dispatches",
            self.api_base, target.owner, target.repo, target.workflow_id
        );
        debug!(url = %url, r#ref = %target.r#ref, "Dispatching workflow");

        let response = self
            .client
            .post(&url)
            .timeout(DISPATCH_TIMEOUT)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({ "ref": target.r#ref }))
            .send()
            .await
            .map_err(|e| ActuatorError::from_reqwest("dispatch", DISPATCH_TIMEOUT, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ActuatorError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
