//! Sender and time resolution for a single message node.
//!
//! Chat clients print the author and time once per group of consecutive
//! messages, so the fields of a message are often found on an ancestor or on
//! an earlier sibling rather than inside the message itself. The resolver
//! climbs a bounded number of ancestors and, at each level, looks first inside
//! the ancestor's subtree and then through its preceding siblings.

use std::fmt::Display;

use chrono::TimeZone;

use crate::domain::{parse_instant, DomTree, NodeMatcher};

/// Rendered form of a resolved instant.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Fields found for one message. `None` means the field was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    pub sender: Option<String>,
    pub timestamp: Option<String>,
    pub datetime: Option<String>,
}

impl ResolvedFields {
    const fn is_complete(&self) -> bool {
        self.sender.is_some() && self.datetime.is_some()
    }
}

/// Bounded nearest-neighbour search for author and time markers.
pub struct FieldResolver<'a, A, M, Tz> {
    author: &'a A,
    time: &'a M,
    time_attribute: &'a str,
    max_depth: usize,
    tz: Tz,
}

impl<'a, A, M, Tz> FieldResolver<'a, A, M, Tz>
where
    A: NodeMatcher,
    M: NodeMatcher,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub const fn new(
        author: &'a A,
        time: &'a M,
        time_attribute: &'a str,
        max_depth: usize,
        tz: Tz,
    ) -> Self {
        Self {
            author,
            time,
            time_attribute,
            max_depth,
            tz,
        }
    }

    /// Resolves sender and time for `node`. Never fails.
    pub fn resolve<T: DomTree + ?Sized>(&self, tree: &T, node: T::Node) -> ResolvedFields {
        let mut fields = ResolvedFields::default();
        let mut level = tree.parent(node);
        let mut depth = 0;

        while let Some(ancestor) = level {
            if depth >= self.max_depth || fields.is_complete() {
                break;
            }

            if fields.sender.is_none() {
                if let Some(found) = tree.find_descendant(ancestor, self.author) {
                    fields.sender = Some(tree.rendered_text(found).trim().to_string());
                }
            }
            if fields.datetime.is_none() {
                if let Some(found) = tree.find_descendant(ancestor, self.time) {
                    self.take_time(tree, found, &mut fields);
                }
            }

            let mut sibling = tree.previous_sibling(ancestor);
            while let Some(current) = sibling {
                if fields.is_complete() {
                    break;
                }
                if fields.sender.is_none() {
                    if let Some(found) = search_sibling(tree, current, self.author) {
                        fields.sender = Some(tree.rendered_text(found).trim().to_string());
                    }
                }
                if fields.datetime.is_none() {
                    if let Some(found) = search_sibling(tree, current, self.time) {
                        self.take_time(tree, found, &mut fields);
                    }
                }
                sibling = tree.previous_sibling(current);
            }

            level = tree.parent(ancestor);
            depth += 1;
        }

        fields
    }

    fn take_time<T: DomTree + ?Sized>(&self, tree: &T, node: T::Node, fields: &mut ResolvedFields) {
        let raw = tree.attr(node, self.time_attribute).unwrap_or_default();
        fields.timestamp = Some(format_timestamp(raw, &self.tz));
        fields.datetime = Some(raw.to_string());
    }
}

/// A sibling's subtree first, then the sibling itself.
fn search_sibling<T, P>(tree: &T, sibling: T::Node, matcher: &P) -> Option<T::Node>
where
    T: DomTree + ?Sized,
    P: NodeMatcher,
{
    tree.find_descendant(sibling, matcher)
        .or_else(|| matcher.matches(tree, sibling).then_some(sibling))
}

/// Renders an instant as `DD/MM/YYYY HH:MM` in `tz`.
///
/// Values that cannot be parsed are returned unchanged.
pub fn format_timestamp<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if raw.is_empty() {
        return String::new();
    }
    parse_instant(raw).map_or_else(
        || {
            tracing::debug!(raw, "Unparseable time value, keeping it verbatim");
            raw.to_string()
        },
        |instant| instant.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::domain::Selector;
    use crate::infrastructure::{Document, NodeId};

    fn author() -> Selector {
        Selector::any().with_attr_eq("data-tid", "message-author-name")
    }

    fn time() -> Selector {
        Selector::tag("time").with_attr("datetime")
    }

    /// list > [row(author, time, msg), row(time, msg), row(msg)]
    fn grouped() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("body");
        let root = doc.root_id();
        let list = doc.append(root, "div", &[], None);

        let head = doc.append(list, "div", &[], None);
        doc.append(head, "span", &[("data-tid", "message-author-name")], Some(" Ana Lima "));
        doc.append(head, "time", &[("datetime", "2025-03-04T09:15:00Z")], None);
        let m1 = doc.append(head, "div", &[("data-tid", "chat-pane-message")], Some("first"));

        let cont = doc.append(list, "div", &[], None);
        doc.append(cont, "time", &[("datetime", "2025-03-04T09:17:00Z")], None);
        let m2 = doc.append(cont, "div", &[("data-tid", "chat-pane-message")], Some("second"));

        let bare = doc.append(list, "div", &[], None);
        let m3 = doc.append(bare, "div", &[("data-tid", "chat-pane-message")], Some("third"));

        (doc, vec![m1, m2, m3])
    }

    #[test]
    fn test_fields_inside_own_group() {
        let (doc, msgs) = grouped();
        let (a, t) = (author(), time());
        let resolver = FieldResolver::new(&a, &t, "datetime", 10, Utc);

        let fields = resolver.resolve(&doc, msgs[0]);
        assert_eq!(fields.sender.as_deref(), Some("Ana Lima"));
        assert_eq!(fields.timestamp.as_deref(), Some("04/03/2025 09:15"));
        assert_eq!(fields.datetime.as_deref(), Some("2025-03-04T09:15:00Z"));
    }

    #[test]
    fn test_sender_from_previous_sibling() {
        let (doc, msgs) = grouped();
        let (a, t) = (author(), time());
        let resolver = FieldResolver::new(&a, &t, "datetime", 10, Utc);

        let fields = resolver.resolve(&doc, msgs[1]);
        assert_eq!(fields.sender.as_deref(), Some("Ana Lima"));
        // Own time wins over the group head's.
        assert_eq!(fields.timestamp.as_deref(), Some("04/03/2025 09:17"));

        let fields = resolver.resolve(&doc, msgs[2]);
        assert_eq!(fields.sender.as_deref(), Some("Ana Lima"));
        // Nearest preceding sibling first.
        assert_eq!(fields.timestamp.as_deref(), Some("04/03/2025 09:17"));
    }

    #[test]
    fn test_depth_bound_stops_search() {
        let mut doc = Document::new("body");
        let mut parent = doc.root_id();
        doc.append(parent, "span", &[("data-tid", "message-author-name")], Some("Far Away"));
        for _ in 0..12 {
            parent = doc.append(parent, "div", &[], None);
        }
        let msg = doc.append(parent, "div", &[], Some("deep"));

        let (a, t) = (author(), time());
        let shallow = FieldResolver::new(&a, &t, "datetime", 10, Utc);
        assert_eq!(shallow.resolve(&doc, msg), ResolvedFields::default());

        let deep = FieldResolver::new(&a, &t, "datetime", 20, Utc);
        assert_eq!(deep.resolve(&doc, msg).sender.as_deref(), Some("Far Away"));
    }

    #[test]
    fn test_sibling_itself_can_be_the_marker() {
        let mut doc = Document::new("body");
        let root = doc.root_id();
        let row = doc.append(root, "div", &[], None);
        doc.append(row, "span", &[("data-tid", "message-author-name")], Some("Bo"));
        doc.append(row, "time", &[("datetime", "garbage")], None);
        let wrap = doc.append(row, "div", &[], None);
        let msg = doc.append(wrap, "div", &[], Some("hi"));

        let (a, t) = (author(), time());
        let resolver = FieldResolver::new(&a, &t, "datetime", 10, Utc);
        let fields = resolver.resolve(&doc, msg);
        assert_eq!(fields.sender.as_deref(), Some("Bo"));
        assert_eq!(fields.timestamp.as_deref(), Some("garbage"));
    }

    #[test]
    fn test_format_timestamp_in_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            format_timestamp("2025-12-31T23:30:00Z", &plus_two),
            "01/01/2026 01:30"
        );
        assert_eq!(format_timestamp("not a date", &Utc), "not a date");
        assert_eq!(format_timestamp("", &Utc), "");
    }
}
