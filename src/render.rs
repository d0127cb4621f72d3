//! Turns a pipeline event into Telegram message text using a per-project
//! Handlebars template.
//!
//! Templates see the event under a `data` key:
//!
//! ```text
//! *{{data.project_name}}* pipeline {{data.status}} on `{{data.branch}}` ({{data.commit}})
//! ```

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::webhook::InboundEvent;

/// The two pipeline outcomes that produce a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failed,
}

impl BuildStatus {
    /// Exact, case-sensitive match. Anything else (running, pending,
    /// canceled, "Success", ...) is not notified about.
    pub fn classify(status: &str) -> Option<Self> {
        match status {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Record handed to the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    pub project_name: String,
    pub branch: String,
    pub commit: String,
    pub status: BuildStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Payload has no '{0}' field")]
    MissingField(&'static str),

    #[error("Failed to read template '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid template: {0}")]
    Syntax(#[from] handlebars::TemplateError),

    #[error("Failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Build the canonical record, or `None` when the status isn't one we notify about.
pub fn notification_data(event: &InboundEvent) -> Result<Option<NotificationData>, RenderError> {
    let raw_status = event
        .build_status
        .as_ref()
        .ok_or(RenderError::MissingField("build_status"))?;

    let Some(status) = raw_status.as_str().and_then(BuildStatus::classify) else {
        return Ok(None);
    };

    Ok(Some(NotificationData {
        project_name: event.project_name.clone(),
        branch: event
            .git_ref
            .clone()
            .ok_or(RenderError::MissingField("ref"))?,
        commit: event
            .commit
            .clone()
            .ok_or(RenderError::MissingField("commit"))?,
        status,
    }))
}

/// Render the message for `event` with the template at `template_path`.
///
/// The template file is read on every call so edits take effect without a
/// restart.
pub async fn render(
    event: &InboundEvent,
    template_path: &Path,
) -> Result<Option<String>, RenderError> {
    let Some(data) = notification_data(event)? else {
        return Ok(None);
    };

    let source = tokio::fs::read_to_string(template_path)
        .await
        .map_err(|source| RenderError::Read {
            path: template_path.to_path_buf(),
            source,
        })?;

    let mut handlebars = Handlebars::new();
    // Output is Telegram Markdown, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_template_string("message", source)?;

    let text = handlebars.render("message", &json!({ "data": data }))?;
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn template(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn classify_is_exact() {
        assert_eq!(BuildStatus::classify("success"), Some(BuildStatus::Success));
        assert_eq!(BuildStatus::classify("failed"), Some(BuildStatus::Failed));
        assert_eq!(BuildStatus::classify("Success"), None);
        assert_eq!(BuildStatus::classify("running"), None);
        assert_eq!(BuildStatus::classify(""), None);
    }

    #[tokio::test]
    async fn renders_success_message() {
        let tpl = template("{{data.project_name}} {{data.status}} on {{ data.branch }} @ {{data.commit}}");
        let event = InboundEvent::new("demo", "success", "main", "abc123");

        let text = render(&event, tpl.path()).await.unwrap();
        assert_eq!(text.as_deref(), Some("demo success on main @ abc123"));
    }

    #[tokio::test]
    async fn failed_status_maps_to_failed() {
        let tpl = template("{{data.status}}");
        let event = InboundEvent::new("demo", "failed", "main", "abc123");
        assert_eq!(render(&event, tpl.path()).await.unwrap().as_deref(), Some("failed"));
    }

    #[tokio::test]
    async fn markdown_is_not_escaped() {
        let tpl = template("*{{data.branch}}*");
        let event = InboundEvent::new("demo", "success", "feature/<x>&y", "abc");
        assert_eq!(
            render(&event, tpl.path()).await.unwrap().as_deref(),
            Some("*feature/<x>&y*")
        );
    }

    #[tokio::test]
    async fn other_statuses_skip_without_reading_template() {
        let event = InboundEvent {
            project_name: "demo".to_string(),
            build_status: Some(Value::String("queued".to_string())),
            git_ref: None,
            commit: None,
        };
        let missing = Path::new("/no/such/template.md");
        assert!(render(&event, missing).await.unwrap().is_none());
    }

    #[test]
    fn missing_fields_are_errors() {
        let mut event = InboundEvent::new("demo", "success", "main", "abc");
        event.commit = None;
        assert!(matches!(
            notification_data(&event),
            Err(RenderError::MissingField("commit"))
        ));

        for raw in [Value::Null, Value::from(5), Value::Bool(true)] {
            event.build_status = Some(raw);
            assert!(matches!(notification_data(&event), Ok(None)));
        }

        event.build_status = None;
        assert!(matches!(
            notification_data(&event),
            Err(RenderError::MissingField("build_status"))
        ));
    }

    #[tokio::test]
    async fn missing_template_file() {
        let event = InboundEvent::new("demo", "success", "main", "abc");
        let err = render(&event, Path::new("/no/such/template.md")).await.unwrap_err();
        assert!(matches!(err, RenderError::Read { .. }));
    }

    #[tokio::test]
    async fn template_syntax_error() {
        let tpl = template("{{data.status");
        let event = InboundEvent::new("demo", "success", "main", "abc");
        assert!(matches!(
            render(&event, tpl.path()).await,
            Err(RenderError::Syntax(_))
        ));
    }
}
