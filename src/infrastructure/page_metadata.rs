//! Chat identity read from page metadata.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{DomTree, MarkerConfig};

/// Name used when the page gives no hint.
pub const DEFAULT_CHAT_NAME: &str = "Teams Chat";

static TITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Chat \| (.+?) \| Microsoft Teams")
        .unwrap_or_else(|e| unreachable!("title pattern is valid: {e}"))
});

static UNREAD_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(\d+\)\s*").unwrap_or_else(|e| unreachable!("unread pattern is valid: {e}"))
});

/// Resolves the chat's display name.
///
/// Tries the title element, then the first page heading, then the document
/// title (`Chat | <name> | Microsoft Teams`, unread counter removed).
pub fn resolve_chat_name<T: DomTree + ?Sized>(tree: &T, markers: &MarkerConfig) -> String {
    if let Some(title) = tree.query(&markers.title) {
        return tree.rendered_text(title).trim().to_string();
    }

    if let Some(heading) = tree.query(&markers.heading) {
        let text = tree.rendered_text(heading);
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    if let Some(caps) = tree.document_title().and_then(|t| TITLE_REGEX.captures(t)) {
        return UNREAD_PREFIX.replace(&caps[1], "").into_owned();
    }

    tracing::debug!("No chat name found on the page, using default");
    DEFAULT_CHAT_NAME.to_string()
}
