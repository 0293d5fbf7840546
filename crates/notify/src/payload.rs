//! Notification payloads produced by the API monitor.
//!
//! Each payload renders to a plain-text body with [`message`] which the
//! channels wrap in their own framing (mail headers, etc.).
//!
//! [`message`]: ResponseTimeNotification::message

use std::fmt::Write;

use serde::{Deserialize, Serialize};

const TITLE: &str = "Notification from StatusWatch";

/// Raised when the mean response time of an endpoint exceeds its budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeNotification {
    pub url: String,
    pub request_type: String,
    pub expected_response_time_ms: i64,
    pub mean_response_time_ms: i64,
}

/// Raised when a request to an endpoint fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotification {
    pub url: String,
    pub request_type: String,
    pub error: String,
    #[serde(default)]
    pub response_body: String,
    #[serde(default)]
    pub other_info: String,
}

impl ResponseTimeNotification {
    /// Render the human-readable body.
    pub fn message(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{TITLE}\n");
        let _ = writeln!(out, "The response time of one of your APIs is above the expected value.\n");
        let _ = writeln!(out, "Url: {}", self.url);
        let _ = writeln!(out, "Request Type: {}", self.request_type);
        let _ = writeln!(out, "Mean Response Time: {} ms", self.mean_response_time_ms);
        let _ = write!(out, "Expected Response Time: {} ms", self.expected_response_time_ms);
        out
    }
}

impl ErrorNotification {
    /// Render the human-readable body.
    pub fn message(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{TITLE}\n");
        let _ = writeln!(out, "A request to one of your APIs failed.\n");
        let _ = writeln!(out, "Url: {}", self.url);
        let _ = writeln!(out, "Request Type: {}", self.request_type);
        let _ = writeln!(out, "Error: {}", self.error);
        let _ = writeln!(out, "Response Body: {}", self.response_body);
        let _ = write!(out, "Other Info: {}", self.other_info);
        out
    }
}
