//! Notification channel configuration.
//!
//! The monitor reads a JSON document whose `notifications` object holds one
//! entry per channel:
//!
//! ```json
//! {
//!   "notifications": {
//!     "mail": {
//!       "smtpHost": "smtp.example.com",
//!       "port": 25,
//!       "from": "alerts@example.com",
//!       "to": "oncall@example.com"
//!     }
//!   }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::email::MailNotifier;
use crate::traits::{Notifier, NotifyError};

/// SMTP settings for the mail channel.
///
/// `username` and `password` may be `${VAR}` references, resolved from the
/// environment when the notifier is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailNotifierConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "smtpHost")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub subject: String,
    #[serde(default, rename = "senderName")]
    pub sender_name: String,
    pub from: String,
    #[serde(default, rename = "receiverName")]
    pub receiver_name: String,
    pub to: String,
}

impl MailNotifierConfig {
    /// `host:port` as used for dialing.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Copy of this config with credential references resolved.
    pub fn resolved(&self) -> Result<Self, NotifyError> {
        Ok(Self {
            username: resolve_env_ref(&self.username)?,
            password: resolve_env_ref(&self.password)?,
            ..self.clone()
        })
    }
}

/// All configured notification channels.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub mail: Option<MailNotifierConfig>,
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    notifications: NotificationsConfig,
}

impl NotificationsConfig {
    /// Parse the `notifications` section of a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, NotifyError> {
        let file: ConfigFile =
            serde_json::from_str(json).map_err(|e| NotifyError::Config(e.to_string()))?;
        Ok(file.notifications)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NotifyError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| NotifyError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Build one notifier per configured channel.
    pub fn build_channels(&self) -> Result<Vec<Box<dyn Notifier>>, NotifyError> {
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(mail) = &self.mail {
            channels.push(Box::new(MailNotifier::new(mail.resolved()?)));
        }
        Ok(channels)
    }
}

/// Resolve a `${VAR}` reference from the environment; other values pass
/// through unchanged.
pub fn resolve_env_ref(value: &str) -> Result<String, NotifyError> {
    let Some(inner) = value.strip_prefix("${") else {
        return Ok(value.to_string());
    };
    let var_name = inner
        .strip_suffix('}')
        .ok_or_else(|| NotifyError::Config(format!("Malformed env var reference: {value}")))?;
    std::env::var(var_name)
        .map_err(|_| NotifyError::Config(format!("Environment variable '{var_name}' is not set")))
}
