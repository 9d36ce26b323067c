//! Status-change detection and Slack delivery for fetched reports.

pub mod changes;
pub mod slack;
pub mod webhook;

pub use changes::{StatusChange, detect_status_changes, status_change_message};
pub use slack::{AttachmentField, SlackAttachment, build_attachment};
pub use webhook::{SlackWebhook, webhook_payload};
