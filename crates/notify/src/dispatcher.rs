//! Routes notifications to every configured channel.
//!
//! Individual channel failures don't block other channels.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use crate::payload::{ErrorNotification, ResponseTimeNotification};
use crate::traits::{DispatchResult, Notifier, NotifyError};

type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Fans each notification out to a set of channels.
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn add_channel(&mut self, channel: Box<dyn Notifier>) {
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Names of the active channels, in dispatch order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| c.client_name().to_string())
            .collect()
    }

    /// Initialize every channel and drop the ones that fail.
    ///
    /// Returns the failing channel names paired with their errors.
    pub async fn initialize_all(&mut self) -> Vec<(String, NotifyError)> {
        let mut ready = Vec::with_capacity(self.channels.len());
        let mut failed = Vec::new();

        for channel in self.channels.drain(..) {
            match channel.initialize().await {
                Ok(()) => {
                    tracing::info!(channel = channel.client_name(), "notification channel ready");
                    ready.push(channel);
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.client_name(),
                        error = %e,
                        "notification channel failed to initialize, disabling it"
                    );
                    failed.push((channel.client_name().to_string(), e));
                }
            }
        }

        self.channels = ready;
        failed
    }

    pub async fn send_response_time(
        &self,
        notification: &ResponseTimeNotification,
    ) -> Vec<DispatchResult> {
        self.dispatch(|channel| channel.send_response_time_notification(notification))
            .await
    }

    pub async fn send_error(&self, notification: &ErrorNotification) -> Vec<DispatchResult> {
        self.dispatch(|channel| channel.send_error_notification(notification))
            .await
    }

    /// Send a sample notification through every channel.
    pub async fn test_all(&self) -> Vec<DispatchResult> {
        self.dispatch(|channel| channel.test()).await
    }

    async fn dispatch<'a, F>(&'a self, send: F) -> Vec<DispatchResult>
    where
        F: Fn(&'a dyn Notifier) -> SendFuture<'a>,
    {
        if self.channels.is_empty() {
            tracing::debug!("No notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let start = Instant::now();
            let result = send(channel.as_ref()).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        channel = channel.client_name(),
                        duration_ms,
                        "Notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.client_name(),
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.client_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}
