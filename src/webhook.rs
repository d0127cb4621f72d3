//! Webhook related structures

use serde_json::Value;

/// Fields pulled out of a GitLab pipeline webhook payload.
///
/// Only `project_name` is required at extraction time. The rest are checked
/// by the renderer, which needs them only for statuses it notifies about.
/// `build_status` keeps the raw value: an absent key is an error, while a
/// non-string value is just a status that isn't notified about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub project_name: String,
    pub build_status: Option<Value>,
    pub git_ref: Option<String>,
    pub commit: Option<String>,
}

impl InboundEvent {
    /// Extract the event from a parsed payload. Returns `None` if there is no
    /// string `project_name` (which includes payloads that aren't objects).
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(|v| v.as_str())
                .map(String::from)
        };

        Some(Self {
            project_name: field("project_name")?,
            build_status: payload.get("build_status").cloned(),
            git_ref: field("ref"),
            commit: field("commit"),
        })
    }

    /// Create an event with every field populated
    pub fn new(project_name: &str, build_status: &str, git_ref: &str, commit: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            build_status: Some(Value::String(build_status.to_string())),
            git_ref: Some(git_ref.to_string()),
            commit: Some(commit.to_string()),
        }
    }
}
