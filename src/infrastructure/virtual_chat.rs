//! Replay of a recorded conversation as a virtualized chat view.
//!
//! Renders the markup a Teams chat pane produces: messages grouped by
//! consecutive sender, author and time on the group head, only the groups
//! near the viewport present in the tree, and older history loaded a page at
//! a time whenever the list is scrolled to the very top.

use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{AppError, DomTree, Result, ScrollSurface};

use super::document::{Document, NodeId};

/// Height of a group's author/time header.
const HEADER_HEIGHT: f64 = 26.0;
/// Height of one line of message text.
const LINE_HEIGHT: f64 = 22.0;
/// Vertical padding of a message row.
const ROW_PADDING: f64 = 12.0;
/// Height of the reaction bar under a message.
const REACTION_HEIGHT: f64 = 20.0;
/// Characters per rendered line.
const LINE_CHARS: usize = 48;

/// Viewport geometry and history paging.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportConfig {
    /// Visible height of the message list.
    #[serde(default = "default_height")]
    pub height: f64,
    /// Extra distance above and below the viewport that stays rendered.
    #[serde(default = "default_overscan")]
    pub overscan: f64,
    /// Messages loaded per history page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            height: default_height(),
            overscan: default_overscan(),
            page_size: default_page_size(),
        }
    }
}

const fn default_height() -> f64 {
    600.0
}

const fn default_overscan() -> f64 {
    300.0
}

const fn default_page_size() -> usize {
    10
}

/// Reaction summary shown under a message.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureReaction {
    pub kind: String,
    pub count: u32,
}

/// One recorded message.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureMessage {
    pub sender: String,
    pub datetime: String,
    pub content: String,
    #[serde(default)]
    pub reactions: Vec<FixtureReaction>,
}

/// A recorded conversation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatFixture {
    #[serde(default)]
    pub chat_name: Option<String>,
    #[serde(default)]
    pub document_title: Option<String>,
    #[serde(default)]
    pub viewport: ViewportConfig,
    pub messages: Vec<FixtureMessage>,
}

#[derive(Debug, Clone)]
struct GroupLayout {
    top: f64,
    height: f64,
    messages: Range<usize>,
}

/// A [`ScrollSurface`] replaying a [`ChatFixture`].
#[derive(Debug, Clone)]
pub struct VirtualizedChat {
    fixture: ChatFixture,
    loaded_from: usize,
    groups: Vec<GroupLayout>,
    offset: f64,
    doc: Document,
    container: NodeId,
}

impl VirtualizedChat {
    /// Builds the view scrolled to the newest message.
    ///
    /// # Errors
    /// Returns `InvalidData` for a non-positive viewport or empty pages.
    pub fn new(fixture: ChatFixture) -> Result<Self> {
        if fixture.viewport.height <= 0.0 || fixture.viewport.overscan < 0.0 {
            return Err(AppError::InvalidData {
                message: "viewport height must be positive and overscan non-negative".into(),
            });
        }
        if fixture.viewport.page_size == 0 {
            return Err(AppError::InvalidData {
                message: "viewport pageSize must be at least 1".into(),
            });
        }

        let loaded_from = fixture
            .messages
            .len()
            .saturating_sub(fixture.viewport.page_size);
        let placeholder = Document::new("body");
        let container = placeholder.root_id();

        let mut chat = Self {
            fixture,
            loaded_from,
            groups: Vec::new(),
            offset: 0.0,
            doc: placeholder,
            container,
        };
        chat.relayout();
        chat.offset = chat.max_offset();
        chat.render();

        tracing::debug!(
            messages = chat.fixture.messages.len(),
            loaded = chat.loaded_messages(),
            "Virtualized chat ready"
        );
        Ok(chat)
    }

    /// Parses a JSON fixture.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the fixture invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: ChatFixture = serde_json::from_str(json).map_err(AppError::json_parse)?;
        Self::new(fixture)
    }

    /// Loads a JSON fixture file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Failed to read {}", path.display()), e))?;
        Self::from_json(&json)
    }

    /// Messages currently loaded into the list (rendered or not).
    #[must_use]
    pub fn loaded_messages(&self) -> usize {
        self.fixture.messages.len() - self.loaded_from
    }

    fn message_height(message: &FixtureMessage) -> f64 {
        let lines = message.content.chars().count().div_ceil(LINE_CHARS).max(1);
        let reactions = if message.reactions.is_empty() {
            0.0
        } else {
            REACTION_HEIGHT
        };
        #[allow(clippy::cast_precision_loss)]
        let text = lines as f64 * LINE_HEIGHT;
        text + ROW_PADDING + reactions
    }

    fn relayout(&mut self) {
        let messages = &self.fixture.messages;
        let mut groups: Vec<GroupLayout> = Vec::new();
        let mut top = 0.0;

        for i in self.loaded_from..messages.len() {
            let height = Self::message_height(&messages[i]);
            let continues = i > self.loaded_from && messages[i - 1].sender == messages[i].sender;
            match groups.last_mut() {
                Some(group) if continues => {
                    group.height += height;
                    group.messages.end = i + 1;
                }
                _ => {
                    if let Some(prev) = groups.last() {
                        top = prev.top + prev.height;
                    }
                    groups.push(GroupLayout {
                        top,
                        height: HEADER_HEIGHT + height,
                        messages: i..i + 1,
                    });
                }
            }
        }

        self.groups = groups;
    }

    fn total_height(&self) -> f64 {
        self.groups.last().map_or(0.0, |g| g.top + g.height)
    }

    fn max_offset(&self) -> f64 {
        (self.total_height() - self.fixture.viewport.height).max(0.0)
    }

    /// Prepends the next page of older history, keeping the view anchored.
    fn load_older_page(&mut self) {
        let before = self.total_height();
        self.loaded_from = self
            .loaded_from
            .saturating_sub(self.fixture.viewport.page_size);
        self.relayout();
        self.offset += self.total_height() - before;

        tracing::debug!(
            loaded = self.loaded_messages(),
            offset = self.offset,
            "Loaded older history"
        );
    }

    fn render(&mut self) {
        let mut doc = Document::new("body");
        if let Some(title) = &self.fixture.document_title {
            doc.set_title(title.clone());
        }

        let root = doc.root_id();
        let header = doc.append(root, "header", &[], None);
        if let Some(name) = &self.fixture.chat_name {
            doc.append(header, "span", &[("data-tid", "chat-title")], Some(name.as_str()));
        }
        let container = doc.append(
            root,
            "div",
            &[
                ("data-tid", "message-pane-list-container"),
                ("class", "fui-ChatMessageList"),
            ],
            None,
        );

        let low = self.offset - self.fixture.viewport.overscan;
        let high = self.offset + self.fixture.viewport.height + self.fixture.viewport.overscan;

        for group in &self.groups {
            if group.top >= high || group.top + group.height <= low {
                continue;
            }

            let group_node = doc.append(container, "div", &[("data-tid", "chat-pane-item")], None);
            for i in group.messages.clone() {
                let message = &self.fixture.messages[i];
                let row = doc.append(group_node, "div", &[("class", "fui-ChatItem")], None);

                if i == group.messages.start {
                    let head = doc.append(row, "div", &[("class", "fui-ChatMessage__header")], None);
                    doc.append(
                        head,
                        "span",
                        &[("data-tid", "message-author-name")],
                        Some(message.sender.as_str()),
                    );
                }
                doc.append(row, "time", &[("datetime", message.datetime.as_str())], None);

                let body = doc.append(row, "div", &[("data-tid", "chat-pane-message")], None);
                doc.append(body, "div", &[], Some(message.content.as_str()));
                if !message.reactions.is_empty() {
                    let summary = message
                        .reactions
                        .iter()
                        .map(|r| {
                            let noun = if r.count == 1 { "reaction" } else { "reactions" };
                            format!("{} {} {noun}.", r.count, r.kind)
                        })
                        .collect::<Vec<_>>()
                        .join(" ");
                    doc.append(body, "div", &[("role", "toolbar")], Some(summary.as_str()));
                }
            }
        }

        self.doc = doc;
        self.container = container;
    }
}

impl DomTree for VirtualizedChat {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.doc.root()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.doc.children(node)
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.doc.previous_sibling(node)
    }

    fn tag(&self, node: NodeId) -> &str {
        self.doc.tag(node)
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.doc.attr(node, name)
    }

    fn rendered_text(&self, node: NodeId) -> String {
        self.doc.rendered_text(node)
    }

    fn document_title(&self) -> Option<&str> {
        self.doc.document_title()
    }
}

impl ScrollSurface for VirtualizedChat {
    fn scroll_top(&self, node: NodeId) -> f64 {
        if node == self.container {
            self.offset
        } else {
            0.0
        }
    }

    fn set_scroll_top(&mut self, node: NodeId, offset: f64) {
        if node != self.container {
            return;
        }

        self.offset = offset.clamp(0.0, self.max_offset());
        if self.offset <= 0.0 && self.loaded_from > 0 {
            self.load_older_page();
        }
        self.render();
    }

    fn scroll_height(&self, node: NodeId) -> f64 {
        if node == self.container {
            self.total_height().max(self.fixture.viewport.height)
        } else {
            0.0
        }
    }

    fn client_height(&self, node: NodeId) -> f64 {
        if node == self.container {
            self.fixture.viewport.height
        } else {
            0.0
        }
    }

    fn overflows_y(&self, node: NodeId) -> bool {
        node == self.container
    }
}
