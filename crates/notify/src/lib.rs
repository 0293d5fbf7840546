//! Notification channels for API monitoring alerts.
//!
//! This crate provides:
//! - `Notifier` trait shared by every notification channel
//! - `MailNotifier`, delivering alerts over SMTP with or without `AUTH PLAIN`
//! - Envelope sanitization shared by both SMTP delivery modes
//! - Dispatcher that fans notifications out to configured channels

pub mod config;
pub mod dispatcher;
pub mod email;
pub mod payload;
pub mod smtp;
pub mod traits;

pub use config::{MailNotifierConfig, NotificationsConfig};
pub use dispatcher::Dispatcher;
pub use email::{AuthMode, MailNotifier};
pub use payload::{ErrorNotification, ResponseTimeNotification};
pub use traits::{Notifier, NotifyError};
