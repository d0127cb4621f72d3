//! HTTP handlers

pub mod webhook;

pub use webhook::{WebhookError, handle_webhook};
