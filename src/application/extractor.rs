//! Message extraction from the current view.
//!
//! One pass reads every rendered message node in document order and turns it
//! into a [`MessageRecord`]. Sender and time that the markup omits for grouped
//! messages are filled from a [`ScanCursor`] that only lives for the pass.

use std::fmt::Display;

use chrono::{Local, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{DomTree, ExtractorConfig, MarkerConfig, MessageRecord};

use super::resolver::{FieldResolver, ResolvedFields};

static REACTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d+\s+(?:Like|Party popper|Heart|Laugh|Surprised|Sad|Angry)\b(?:\s+reactions?)?\.?",
    )
    .unwrap_or_else(|e| unreachable!("reaction pattern is valid: {e}"))
});

/// Removes reaction summaries such as "3 Heart reactions." from message text.
#[must_use]
pub fn strip_reactions(text: &str) -> String {
    REACTION_REGEX.replace_all(text.trim(), "").trim().to_string()
}

/// Last sender and time seen during one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanCursor {
    sender: Option<String>,
    timestamp: Option<String>,
    datetime: Option<String>,
}

impl ScanCursor {
    /// Fills what the resolver could not find, then advances from what it did.
    fn apply(&mut self, resolved: ResolvedFields) -> (String, String, Option<String>) {
        let sender = resolved.sender.filter(|s| !s.is_empty());
        let timestamp = resolved.timestamp.filter(|s| !s.is_empty());
        let datetime = resolved.datetime.filter(|s| !s.is_empty());

        let out = (
            sender.clone().or_else(|| self.sender.clone()).unwrap_or_default(),
            timestamp
                .clone()
                .or_else(|| self.timestamp.clone())
                .unwrap_or_default(),
            if timestamp.is_some() {
                datetime.clone()
            } else {
                self.datetime.clone()
            },
        );

        if sender.is_some() {
            self.sender = sender;
        }
        if timestamp.is_some() {
            self.timestamp = timestamp;
            self.datetime = datetime;
        }

        out
    }
}

/// Turns the rendered message nodes of a view into records.
#[derive(Debug, Clone)]
pub struct MessageExtractor<Tz: TimeZone = Local> {
    markers: MarkerConfig,
    config: ExtractorConfig,
    tz: Tz,
}

impl MessageExtractor<Local> {
    /// Extractor rendering timestamps in the local time zone.
    #[must_use]
    pub const fn new(markers: MarkerConfig, config: ExtractorConfig) -> Self {
        Self {
            markers,
            config,
            tz: Local,
        }
    }
}

impl<Tz> MessageExtractor<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Extractor rendering timestamps in `tz`.
    #[must_use]
    pub const fn with_timezone(markers: MarkerConfig, config: ExtractorConfig, tz: Tz) -> Self {
        Self {
            markers,
            config,
            tz,
        }
    }

    pub const fn markers(&self) -> &MarkerConfig {
        &self.markers
    }

    /// Number of message nodes currently present.
    pub fn count_visible<T: DomTree + ?Sized>(&self, tree: &T) -> usize {
        tree.query_all(&self.markers.message).len()
    }

    /// Extracts every rendered message, in document order.
    pub fn scan<T: DomTree + ?Sized>(&self, tree: &T) -> Vec<MessageRecord> {
        let nodes = tree.query_all(&self.markers.message);
        let mut cursor = ScanCursor::default();
        let records: Vec<MessageRecord> = nodes
            .into_iter()
            .filter_map(|node| self.extract_node(tree, node, &mut cursor))
            .collect();

        tracing::debug!(records = records.len(), "Scanned visible messages");
        records
    }

    /// Extracts one node, threading the pass cursor.
    ///
    /// Returns `None` when nothing but reaction text remains.
    pub fn extract_node<T: DomTree + ?Sized>(
        &self,
        tree: &T,
        node: T::Node,
        cursor: &mut ScanCursor,
    ) -> Option<MessageRecord> {
        let content = strip_reactions(&tree.rendered_text(node));
        if content.is_empty() {
            return None;
        }

        let resolver = FieldResolver::new(
            &self.markers.author,
            &self.markers.time,
            &self.config.time_attribute,
            self.config.max_depth,
            self.tz.clone(),
        );
        let (sender, timestamp, datetime) = cursor.apply(resolver.resolve(tree, node));

        Some(MessageRecord {
            sender,
            timestamp,
            datetime,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::infrastructure::{Document, NodeId};

    fn extractor() -> MessageExtractor<Utc> {
        MessageExtractor::with_timezone(MarkerConfig::default(), ExtractorConfig::default(), Utc)
    }

    fn message(doc: &mut Document, parent: NodeId, text: &str) -> NodeId {
        doc.append(parent, "div", &[("data-tid", "chat-pane-message")], Some(text))
    }

    #[test]
    fn test_strip_reactions() {
        assert_eq!(strip_reactions("Great idea 3 Heart reactions."), "Great idea");
        assert_eq!(strip_reactions("ok\n1 Like reaction."), "ok");
        assert_eq!(strip_reactions("yay 2 party popper reactions"), "yay");
        assert_eq!(strip_reactions("  4 Laugh  "), "");
        assert_eq!(strip_reactions("I like 3 apples"), "I like 3 apples");
        assert_eq!(strip_reactions("She got 10 likes on it"), "She got 10 likes on it");
        assert_eq!(strip_reactions("2 Hearts and 3 Sadness"), "2 Hearts and 3 Sadness");
    }

    #[test]
    fn test_cursor_fallback_for_grouped_messages() {
        // Only the first message has author and time; the rest live in
        // separate containers without siblings carrying markers.
        let mut doc = Document::new("body");
        let root = doc.root_id();

        let head = doc.append(root, "section", &[], None);
        let header = doc.append(head, "div", &[], None);
        doc.append(header, "span", &[("data-tid", "message-author-name")], Some("Ana"));
        doc.append(header, "time", &[("datetime", "2025-03-04T09:15:00Z")], None);
        message(&mut doc, head, "one");

        for text in ["two", "three"] {
            let mut parent = doc.append(root, "section", &[], None);
            for _ in 0..11 {
                parent = doc.append(parent, "div", &[], None);
            }
            message(&mut doc, parent, text);
        }

        let records = extractor().scan(&doc);
        assert_eq!(records.len(), 3);
        for r in &records {
            assert_eq!(r.sender, "Ana");
            assert_eq!(r.timestamp, "04/03/2025 09:15");
            assert_eq!(r.datetime.as_deref(), Some("2025-03-04T09:15:00Z"));
        }
        assert_eq!(
            records.iter().map(|r| r.content.as_str()).collect::<Vec<_>>(),
            ["one", "two", "three"]
        );
    }

    #[test]
    fn test_reaction_only_messages_are_dropped() {
        let mut doc = Document::new("body");
        let root = doc.root_id();
        let row = doc.append(root, "div", &[], None);
        doc.append(row, "span", &[("data-tid", "message-author-name")], Some("Bo"));
        message(&mut doc, row, "2 Like reactions.");
        message(&mut doc, row, "   ");
        let kept = message(&mut doc, row, "real text");
        doc.append(kept, "div", &[], Some("1 Heart reaction."));

        let records = extractor().scan(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "real text");
        assert!(records.iter().all(|r| !r.content.is_empty()));
    }

    #[test]
    fn test_dropped_message_does_not_advance_cursor() {
        let mut doc = Document::new("body");
        let root = doc.root_id();

        for (author, time, text) in [
            ("Ana", "2025-03-04T09:15:00Z", "one"),
            ("Bo", "2025-03-04T09:20:00Z", "2 Like reactions."),
        ] {
            let section = doc.append(root, "section", &[], None);
            let header = doc.append(section, "div", &[], None);
            doc.append(header, "span", &[("data-tid", "message-author-name")], Some(author));
            doc.append(header, "time", &[("datetime", time)], None);
            message(&mut doc, section, text);
        }

        let mut parent = doc.append(root, "section", &[], None);
        for _ in 0..11 {
            parent = doc.append(parent, "div", &[], None);
        }
        message(&mut doc, parent, "three");

        let records = extractor().scan(&doc);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].content, "three");
        assert_eq!(records[1].sender, "Ana");
        assert_eq!(records[1].timestamp, "04/03/2025 09:15");
    }

    #[test]
    fn test_cursor_is_not_advanced_by_fallback() {
        let mut cursor = ScanCursor::default();
        let first = cursor.apply(ResolvedFields {
            sender: Some("Ana".into()),
            timestamp: Some("t1".into()),
            datetime: Some("d1".into()),
        });
        assert_eq!(first, ("Ana".into(), "t1".into(), Some("d1".into())));

        let second = cursor.apply(ResolvedFields {
            sender: None,
            timestamp: Some("t2".into()),
            datetime: Some("d2".into()),
        });
        assert_eq!(second, ("Ana".into(), "t2".into(), Some("d2".into())));

        let third = cursor.apply(ResolvedFields::default());
        assert_eq!(third, ("Ana".into(), "t2".into(), Some("d2".into())));
    }

    #[test]
    fn test_cursor_does_not_leak_between_scans() {
        let mut doc = Document::new("body");
        let root = doc.root_id();
        let mut parent = root;
        for _ in 0..12 {
            parent = doc.append(parent, "div", &[], None);
        }
        message(&mut doc, parent, "orphan");

        let ex = extractor();
        let records = ex.scan(&doc);
        assert_eq!(records[0].sender, "");
        assert_eq!(records[0].timestamp, "");
        assert_eq!(ex.count_visible(&doc), 1);
    }
}
