//! Compound selectors used as structural markers.
//!
//! Supports a tag name followed by any number of attribute conditions:
//! `time[datetime]`, `[data-tid="chat-pane-message"]`,
//! `div[class*="message-list"]`, `.fui-ChatItem`. Combinators are not
//! supported; the resolver does its own tree walking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dom::{DomTree, NodeMatcher};
use super::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
    Word(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    op: AttrOp,
}

impl AttrCondition {
    fn holds(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Contains(v) => !v.is_empty() && value.contains(v.as_str()),
            AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
            AttrOp::Word(v) => value.split_whitespace().any(|w| w == v),
        }
    }
}

/// A tag name plus attribute conditions, all of which must hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    tag: Option<String>,
    conditions: Vec<AttrCondition>,
}

impl Selector {
    /// Matches any element.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            tag: None,
            conditions: Vec::new(),
        }
    }

    /// Matches elements with the given tag.
    #[must_use]
    pub fn tag(name: &str) -> Self {
        Self {
            tag: Some(name.to_ascii_lowercase()),
            conditions: Vec::new(),
        }
    }

    /// Adds `[name]`.
    #[must_use]
    pub fn with_attr(self, name: &str) -> Self {
        self.with(name, AttrOp::Exists)
    }

    /// Adds `[name="value"]`.
    #[must_use]
    pub fn with_attr_eq(self, name: &str, value: &str) -> Self {
        self.with(name, AttrOp::Equals(value.to_string()))
    }

    /// Adds `[name*="value"]`.
    #[must_use]
    pub fn with_attr_contains(self, name: &str, value: &str) -> Self {
        self.with(name, AttrOp::Contains(value.to_string()))
    }

    fn with(mut self, name: &str, op: AttrOp) -> Self {
        self.conditions.push(AttrCondition {
            name: name.to_string(),
            op,
        });
        self
    }

    /// Parses a selector string.
    ///
    /// # Errors
    /// Returns `InvalidSelector` on malformed input.
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_selector(source, "empty selector"));
        }

        let tag_end = trimmed.find(['[', '.']).unwrap_or(trimmed.len());
        let tag = &trimmed[..tag_end];
        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '*')
        {
            return Err(AppError::invalid_selector(source, "invalid tag name"));
        }

        let mut selector = if tag.is_empty() || tag == "*" {
            Self::any()
        } else {
            Self::tag(tag)
        };

        let mut rest = &trimmed[tag_end..];
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(['[', '.']).unwrap_or(after.len());
                let class = &after[..end];
                if class.is_empty() {
                    return Err(AppError::invalid_selector(source, "empty class name"));
                }
                selector = selector.with("class", AttrOp::Word(class.to_string()));
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let close = closing_bracket(after)
                    .ok_or_else(|| AppError::invalid_selector(source, "unterminated '['"))?;
                let condition = parse_condition(&after[..close])
                    .ok_or_else(|| AppError::invalid_selector(source, "bad attribute condition"))?;
                selector.conditions.push(condition);
                rest = &after[close + 1..];
            } else {
                return Err(AppError::invalid_selector(
                    source,
                    format!("unexpected input '{rest}'"),
                ));
            }
        }

        Ok(selector)
    }
}

/// Index of the `]` closing an attribute condition, skipping quoted text.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_condition(body: &str) -> Option<AttrCondition> {
    let Some(eq) = body.find('=') else {
        let name = body.trim();
        return (!name.is_empty()).then(|| AttrCondition {
            name: name.to_string(),
            op: AttrOp::Exists,
        });
    };

    let (lhs, value) = (&body[..eq], unquote(body[eq + 1..].trim()));
    let (name, op) = match lhs.chars().last() {
        Some('*') => (&lhs[..lhs.len() - 1], AttrOp::Contains(value)),
        Some('^') => (&lhs[..lhs.len() - 1], AttrOp::Prefix(value)),
        Some('$') => (&lhs[..lhs.len() - 1], AttrOp::Suffix(value)),
        Some('~') => (&lhs[..lhs.len() - 1], AttrOp::Word(value)),
        _ => (lhs, AttrOp::Equals(value)),
    };

    let name = name.trim();
    (!name.is_empty()).then(|| AttrCondition {
        name: name.to_string(),
        op,
    })
}

fn unquote(value: &str) -> String {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

impl NodeMatcher for Selector {
    fn matches<T: DomTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool {
        if let Some(tag) = &self.tag {
            if !tree.tag(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.conditions
            .iter()
            .all(|c| c.holds(tree.attr(node, &c.name)))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{tag}")?;
        } else if self.conditions.is_empty() {
            write!(f, "*")?;
        }
        for c in &self.conditions {
            match &c.op {
                AttrOp::Exists => write!(f, "[{}]", c.name)?,
                AttrOp::Equals(v) => write!(f, "[{}=\"{v}\"]", c.name)?,
                AttrOp::Contains(v) => write!(f, "[{}*=\"{v}\"]", c.name)?,
                AttrOp::Prefix(v) => write!(f, "[{}^=\"{v}\"]", c.name)?,
                AttrOp::Suffix(v) => write!(f, "[{}$=\"{v}\"]", c.name)?,
                AttrOp::Word(v) => write!(f, "[{}~=\"{v}\"]", c.name)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::Document;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            Selector::parse("time[datetime]").unwrap(),
            Selector::tag("time").with_attr("datetime")
        );
        assert_eq!(
            Selector::parse(r#"[data-tid="chat-pane-message"]"#).unwrap(),
            Selector::any().with_attr_eq("data-tid", "chat-pane-message")
        );
        assert_eq!(
            Selector::parse("div[class*='message-list']").unwrap(),
            Selector::tag("div").with_attr_contains("class", "message-list")
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div[class").is_err());
        assert!(Selector::parse("div > span").is_err());
        assert!(Selector::parse("[=x]").is_err());
    }

    #[test]
    fn test_display_reparses_to_same_selector() {
        let s = Selector::parse(r#"div.fui-ChatItem[data-tid^="chat"]"#).unwrap();
        assert_eq!(Selector::parse(&s.to_string()).unwrap(), s);
    }

    #[test]
    fn test_matches_nodes() {
        let mut doc = Document::new("body");
        let root = doc.root_id();
        let list = doc.append(root, "div", &[("class", "fui-ChatMessageList big")], None);
        let time = doc.append(list, "time", &[("datetime", "2025-01-01T10:00:00Z")], None);

        let by_class = Selector::parse("div[class*=\"ChatMessageList\"]").unwrap();
        let by_word = Selector::parse(".big").unwrap();
        let time_sel = Selector::parse("time[datetime]").unwrap();

        assert!(by_class.matches(&doc, list));
        assert!(by_word.matches(&doc, list));
        assert!(!by_class.matches(&doc, time));
        assert!(time_sel.matches(&doc, time));
        assert!(Selector::parse("TIME").unwrap().matches(&doc, time));
    }
}
