//! Domain models for collected chat data.
//!
//! These models represent the messages reconstructed from a chat view and the
//! result shapes handed back to the host.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// Number of content characters that take part in a message's identity.
pub const IDENTITY_PREFIX_CHARS: usize = 50;

/// A single message reconstructed from the chat view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageRecord {
    /// Display name of the author.
    pub sender: String,
    /// Human-formatted time (`DD/MM/YYYY HH:MM`).
    pub timestamp: String,
    /// Machine-readable instant the timestamp was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    /// Message body with reaction annotations removed.
    pub content: String,
}

/// Identity of a message across scroll passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey {
    sender: String,
    timestamp: String,
    content_prefix: String,
}

impl MessageRecord {
    /// Identity key: sender, timestamp and the first 50 characters of content.
    #[must_use]
    pub fn key(&self) -> MessageKey {
        MessageKey {
            sender: self.sender.clone(),
            timestamp: self.timestamp.clone(),
            content_prefix: self.content.chars().take(IDENTITY_PREFIX_CHARS).collect(),
        }
    }

    /// Parsed instant used for ordering, if the record has a usable one.
    #[must_use]
    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        self.datetime.as_deref().and_then(parse_instant)
    }
}

/// Parses the instant formats chat clients put into `datetime` attributes.
///
/// Offset-less values are read as UTC.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// What the host sees before any collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStatus {
    /// Resolved chat display name.
    pub chat_name: String,
    /// Message nodes currently present in the view.
    pub visible_message_count: usize,
}

/// Outcome of a completed collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    /// Distinct messages in the final transcript.
    pub message_count: usize,
    /// Scroll-to-top attempts performed.
    pub top_iterations: usize,
    /// Scroll-to-bottom attempts performed.
    pub bottom_iterations: usize,
    /// Whether the top sweep saw the offset settle before its bound.
    pub reached_top: bool,
    /// Whether the bottom sweep reached the end before its bound.
    pub reached_bottom: bool,
}

/// Uniform response shape of every host action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    /// Successful action covering `count` messages.
    #[must_use]
    pub const fn ok(count: usize) -> Self {
        Self {
            success: true,
            message_count: Some(count),
            error: None,
        }
    }

    /// Failed action carrying the error's display text.
    #[must_use]
    pub fn failed(err: &AppError) -> Self {
        Self {
            success: false,
            message_count: None,
            error: Some(err.to_string()),
        }
    }
}

/// Action results that report how many messages they covered.
pub trait MessageCount {
    fn message_count(&self) -> usize;
}

impl MessageCount for usize {
    fn message_count(&self) -> usize {
        *self
    }
}

impl MessageCount for CollectionReport {
    fn message_count(&self) -> usize {
        self.message_count
    }
}

impl<T: MessageCount> From<Result<T>> for ActionResponse {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::ok(value.message_count()),
            Err(e) => Self::failed(&e),
        }
    }
}

/// A rendered export ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub content: String,
    pub filename: String,
    pub mime_type: &'static str,
}

/// Document written by the JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExport {
    pub chat_name: String,
    pub export_date: String,
    pub message_count: usize,
    pub messages: Vec<MessageRecord>,
}
