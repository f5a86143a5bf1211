//! Host actions against one open chat.
//!
//! A session owns the chat surface, the collector and the export sink. The
//! transcript of a full collection is kept only once the run has finalized;
//! a new run discards the previous one before it starts.

use std::fmt::Display;
use std::path::PathBuf;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::domain::{
    ChatStatus, CollectionReport, MessageCount, MessageRecord, Result, ScrollSurface,
};
use crate::infrastructure::{resolve_chat_name, FileSink};

use super::accumulator::sort_by_datetime;
use super::collector::ScrollCollector;
use super::formatter::{render_export, ExportFormat};

/// Where an export went and what it covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub path: PathBuf,
    pub message_count: usize,
}

impl MessageCount for ExportReceipt {
    fn message_count(&self) -> usize {
        self.message_count
    }
}

/// One chat view plus the actions a host can invoke on it.
#[derive(Debug)]
pub struct ChatSession<S, K, Tz: TimeZone = Local> {
    surface: S,
    collector: ScrollCollector<Tz>,
    sink: K,
    collected: Option<Vec<MessageRecord>>,
}

impl<S, K, Tz> ChatSession<S, K, Tz>
where
    S: ScrollSurface,
    K: FileSink,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    #[must_use]
    pub const fn new(surface: S, collector: ScrollCollector<Tz>, sink: K) -> Self {
        Self {
            surface,
            collector,
            sink,
            collected: None,
        }
    }

    /// Display name of the chat.
    pub fn chat_name(&self) -> String {
        resolve_chat_name(&self.surface, self.collector.extractor().markers())
    }

    /// Chat name and how many messages are rendered right now.
    pub fn status(&self) -> ChatStatus {
        ChatStatus {
            chat_name: self.chat_name(),
            visible_message_count: self.collector.extractor().count_visible(&self.surface),
        }
    }

    /// Scrolls through the whole history and keeps the sorted transcript.
    ///
    /// # Errors
    /// Returns `ContainerNotFound` if the chat has no message list.
    pub async fn collect_full_history(&mut self) -> Result<CollectionReport> {
        self.collected = None;
        let collection = self.collector.collect(&mut self.surface).await?;
        self.collected = Some(collection.records);
        Ok(collection.report)
    }

    /// The collected transcript, or the sorted visible messages when no
    /// collection has finished.
    pub fn transcript(&self) -> Vec<MessageRecord> {
        if let Some(records) = &self.collected {
            return records.clone();
        }

        tracing::debug!("No collected history, using visible messages");
        let mut records = self.collector.extractor().scan(&self.surface);
        sort_by_datetime(&mut records);
        records
    }

    /// Renders the transcript and hands it to the sink.
    ///
    /// # Errors
    /// Returns `NoMessages` when there is nothing to export, or the sink's
    /// error if delivery fails.
    pub fn export(&self, format: ExportFormat) -> Result<ExportReceipt> {
        self.export_at(format, Utc::now())
    }

    fn export_at(&self, format: ExportFormat, exported_at: DateTime<Utc>) -> Result<ExportReceipt> {
        let records = self.transcript();
        let file = render_export(&records, &self.chat_name(), format, exported_at)?;
        let path = self.sink.deliver(&file)?;

        tracing::info!(
            messages = records.len(),
            format = format.extension(),
            "Chat exported"
        );

        Ok(ExportReceipt {
            path,
            message_count: records.len(),
        })
    }
}
