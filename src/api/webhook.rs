//! GitLab pipeline webhook endpoint

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error, info};

use crate::SharedState;
use crate::config::LookupError;
use crate::render::{self, RenderError};
use crate::telegram::DeliveryError;
use crate::webhook::InboundEvent;

pub const TOKEN_HEADER: &str = "X-Gitlab-Token";

/// Every way a webhook request can fail, with its externally visible status.
/// Several variants deliberately collapse onto the same response.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Could not parse JSON body: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("No project provided by the JSON payload")]
    MissingProject,

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Gitlab Token not authorized for project '{project}'")]
    Unauthorized { project: String },

    #[error("Failed to render message for project '{project}': {source}")]
    Render { project: String, source: RenderError },

    #[error("Failed to deliver message for project '{project}': {source}")]
    Delivery {
        project: String,
        source: DeliveryError,
    },
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) | Self::MissingProject | Self::Lookup(_) => "",
            Self::Unauthorized { .. } => "Gitlab Token not authorized",
            Self::Render { .. } | Self::Delivery { .. } => "Notification Error",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}

/// Handles the GitLab webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match notify(&state, &headers, &body).await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            match &e {
                WebhookError::Lookup(LookupError::ProjectNotFound { project }) => {
                    error!(
                        "Project '{}' not found in {}",
                        project,
                        state.store.source().display()
                    );
                }
                WebhookError::Lookup(LookupError::MissingSecret { project }) => {
                    error!(
                        "Key 'gitlab_token' not set for project '{}' in {}",
                        project,
                        state.store.source().display()
                    );
                }
                WebhookError::Unauthorized { .. } => {
                    error!("Not authorized, {}", e);
                }
                _ => error!("{}", e),
            }
            e.into_response()
        }
    }
}

async fn notify(state: &SharedState, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
    // An empty body is treated as an empty object and fails on project_name
    let payload: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body)?
    };
    debug!("{:#?}", &payload);

    let event = InboundEvent::from_payload(&payload).ok_or(WebhookError::MissingProject)?;
    let project = event.project_name.as_str();
    info!("webhook received project '{}'", project);

    let config = state.store.lookup(project)?;

    let token = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
    if token != Some(config.gitlab_token.as_str()) {
        return Err(WebhookError::Unauthorized {
            project: project.to_string(),
        });
    }

    let message = render::render(&event, Path::new(&config.telegram_template))
        .await
        .map_err(|source| WebhookError::Render {
            project: project.to_string(),
            source,
        })?;

    let Some(text) = message else {
        info!(
            "Project '{}' build status {:?} is not notified, skipping",
            project, event.build_status
        );
        return Ok(());
    };

    state
        .telegram
        .send_message(&config.telegram_bot, &config.telegram_group, &text)
        .await
        .map_err(|source| WebhookError::Delivery {
            project: project.to_string(),
            source,
        })?;

    info!("Notification for project '{}' delivered", project);
    Ok(())
}
