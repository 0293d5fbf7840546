//! Notifier trait definition and shared error types.

use crate::payload::{ErrorNotification, ResponseTimeNotification};

/// Errors that can occur while setting up or using a notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot reach {addr}: {reason}")]
    Connectivity { addr: String, reason: String },

    #[error("SMTP delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Capability contract shared by every notification channel.
///
/// A channel is constructed from configuration, checked once with
/// [`Notifier::initialize`], then used for any number of sends.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable label for this channel (e.g. `"Smtp Mail"`).
    fn client_name(&self) -> &str;

    /// Validate configuration and check that the remote end is reachable.
    async fn initialize(&self) -> Result<(), NotifyError>;

    async fn send_response_time_notification(
        &self,
        notification: &ResponseTimeNotification,
    ) -> Result<(), NotifyError>;

    async fn send_error_notification(
        &self,
        notification: &ErrorNotification,
    ) -> Result<(), NotifyError>;

    /// Test delivery with a sample error notification.
    async fn test(&self) -> Result<(), NotifyError> {
        let sample = ErrorNotification {
            url: "http://localhost/health".to_string(),
            request_type: "GET".to_string(),
            error: "[TEST] This is a test notification".to_string(),
            response_body: String::new(),
            other_info: format!("sent by the {} channel", self.client_name()),
        };
        self.send_error_notification(&sample).await
    }
}

/// Result of dispatching a notification to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
