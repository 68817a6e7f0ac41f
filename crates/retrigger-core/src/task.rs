//! Task specification types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for one batch run, used to correlate log events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Create a new RunId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random RunId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a task decides whether to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskMode {
    /// Probe a target URL first; dispatch only when the status code matches.
    Conditional,
    /// Dispatch unconditionally on every run.
    Scheduled,
}

/// Identifies the remote workflow to invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTarget {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// Workflow file name or numeric id.
    pub workflow_id: String,

    /// Branch or tag to run the workflow on.
    #[serde(rename = "ref")]
    pub r#ref: String,
}

impl fmt::Display for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}:{}@{}",
            self.owner, self.repo, self.workflow_id, self.r#ref
        )
    }
}

/// Immutable description of one monitored/triggered unit.
///
/// Built from a [`TaskEntry`] via [`TaskEntry::into_spec`], which enforces
/// the mode invariants. The spec list is owned by the caller and read-only
/// to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    /// Human label. Not required to be unique.
    pub name: String,

    /// Decision mode, derived from the entry's `enable_check` flag.
    pub mode: TaskMode,

    /// Probe URL. Present iff mode is Conditional.
    pub check_url: Option<String>,

    /// Status codes that arm the trigger. Non-empty iff mode is Conditional.
    pub trigger_status_codes: Vec<u16>,

    /// Remote workflow to invoke.
    pub dispatch: DispatchTarget,

    /// Minimum duration between two successful triggers sharing a dedup key.
    /// Zero disables cooldown gating.
    pub cooldown: Duration,

    /// Whether skipped outcomes are reported through the notifier.
    pub notify_on_skip: bool,
}

impl TaskSpec {
    /// Returns true if this task participates in cooldown gating.
    pub fn uses_cooldown(&self) -> bool {
        self.mode == TaskMode::Conditional && !self.cooldown.is_zero()
    }
}

/// One entry of the caller-supplied task list, as deserialized from the
/// task file. Field semantics follow the external configuration schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    /// Human label for the task.
    pub name: String,

    /// Probe URL; required when `enable_check` is true.
    #[serde(default)]
    pub check_url: Option<String>,

    /// Status codes that arm the trigger; required when `enable_check` is true.
    #[serde(default)]
    pub trigger_status_codes: Option<Vec<u16>>,

    /// Repository owner.
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// Workflow file name or numeric id.
    pub workflow_id: String,

    /// Branch or tag to dispatch on.
    #[serde(rename = "ref")]
    pub r#ref: String,

    /// True selects Conditional mode, false Scheduled mode.
    pub enable_check: bool,

    /// Cooldown window in seconds. Absent or zero disables gating.
    #[serde(default)]
    pub check_interval_secs: Option<u64>,

    /// Whether to notify on skipped outcomes. Defaults to false.
    #[serde(default)]
    pub notify_on_skip: Option<bool>,
}

impl TaskEntry {
    /// Validate this entry into a [`TaskSpec`].
    ///
    /// A Conditional entry without `check_url` or without a non-empty
    /// `trigger_status_codes` list is a configuration error. A Scheduled
    /// entry ignores both fields even when present.
    pub fn into_spec(self) -> Result<TaskSpec, CoreError> {
        for (field, value) in [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("workflow_id", &self.workflow_id),
            ("ref", &self.r#ref),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::EmptyDispatchField {
                    task: self.name.clone(),
                    field,
                });
            }
        }

        let mode = if self.enable_check {
            TaskMode::Conditional
        } else {
            TaskMode::Scheduled
        };

        let (check_url, trigger_status_codes) = match mode {
            TaskMode::Conditional => {
                let url = self
                    .check_url
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| CoreError::MissingCheckUrl(self.name.clone()))?;
                let codes = self
                    .trigger_status_codes
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| CoreError::MissingTriggerCodes(self.name.clone()))?;
                (Some(url), codes)
            }
            // Scheduled tasks ignore the probe fields even if present.
            TaskMode::Scheduled => (None, Vec::new()),
        };

        Ok(TaskSpec {
            name: self.name,
            mode,
            check_url,
            trigger_status_codes,
            dispatch: DispatchTarget {
                owner: self.owner,
                repo: self.repo,
                workflow_id: self.workflow_id,
                r#ref: self.r#ref,
            },
            cooldown: Duration::from_secs(self.check_interval_secs.unwrap_or(0)),
            notify_on_skip: self.notify_on_skip.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(enable_check: bool) -> TaskEntry {
        TaskEntry {
            name: "staging-redeploy".to_string(),
            check_url: Some("https://staging.example.com/health".to_string()),
            trigger_status_codes: Some(vec![404, 502]),
            owner: "filipelabs".to_string(),
            repo: "staging".to_string(),
            workflow_id: "deploy.yml".to_string(),
            r#ref: "main".to_string(),
            enable_check,
            check_interval_secs: Some(3600),
            notify_on_skip: None,
        }
    }

    #[test]
    fn conditional_entry_validates() {
        let spec = entry(true).into_spec().unwrap();
        assert_eq!(spec.mode, TaskMode::Conditional);
        assert_eq!(spec.check_url.as_deref(), Some("https://staging.example.com/health"));
        assert_eq!(spec.trigger_status_codes, vec![404, 502]);
        assert_eq!(spec.cooldown, Duration::from_secs(3600));
        assert!(!spec.notify_on_skip);
        assert!(spec.uses_cooldown());
    }

    #[test]
    fn conditional_without_check_url_is_an_error() {
        let mut e = entry(true);
        e.check_url = None;
        assert!(matches!(
            e.into_spec(),
            Err(CoreError::MissingCheckUrl(name)) if name == "staging-redeploy"
        ));
    }

    #[test]
    fn conditional_with_empty_codes_is_an_error() {
        let mut e = entry(true);
        e.trigger_status_codes = Some(Vec::new());
        assert!(matches!(e.into_spec(), Err(CoreError::MissingTriggerCodes(_))));
    }

    #[test]
    fn scheduled_entry_ignores_probe_fields() {
        let spec = entry(false).into_spec().unwrap();
        assert_eq!(spec.mode, TaskMode::Scheduled);
        assert!(spec.check_url.is_none());
        assert!(spec.trigger_status_codes.is_empty());
        // Cooldown value is carried but scheduled tasks never read it.
        assert!(!spec.uses_cooldown());
    }

    #[test]
    fn empty_dispatch_field_is_an_error() {
        let mut e = entry(false);
        e.repo = "  ".to_string();
        assert!(matches!(
            e.into_spec(),
            Err(CoreError::EmptyDispatchField { field: "repo", .. })
        ));
    }

    #[test]
    fn entry_parses_from_json() {
        let raw = r#"{
            "name": "nightly",
            "owner": "filipelabs",
            "repo": "retrigger",
            "workflow_id": "nightly.yml",
            "ref": "main",
            "enable_check": false
        }"#;
        let e: TaskEntry = serde_json::from_str(raw).unwrap();
        let spec = e.into_spec().unwrap();
        assert_eq!(spec.mode, TaskMode::Scheduled);
        assert_eq!(spec.dispatch.to_string(), "filipelabs/retrigger:nightly.yml@main");
        assert_eq!(spec.cooldown, Duration::ZERO);
    }
}
