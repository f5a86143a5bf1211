//! In-memory element tree.
//!
//! An arena of elements addressed by [`NodeId`]. Each element may carry its
//! own text, rendered before its children.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::{AppError, DomTree, Result};

/// Handle of an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Serialized element: `{tag, attrs, text, children}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<ElementSnapshot>,
}

/// A captured page: title plus element tree.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub title: Option<String>,
    pub root: ElementSnapshot,
}

/// Elements that start on their own line when rendered.
const BLOCK_TAGS: &[&str] = &[
    "div", "p", "li", "ul", "ol", "section", "article", "header", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "br", "blockquote", "pre",
];

/// Arena-backed element tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    title: Option<String>,
}

impl Document {
    /// Creates a document with a single root element.
    #[must_use]
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![NodeData {
                tag: root_tag.to_ascii_lowercase(),
                attrs: Vec::new(),
                text: None,
                parent: None,
                children: Vec::new(),
            }],
            title: None,
        }
    }

    /// The root element.
    #[must_use]
    pub const fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// Sets the page title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Appends a new element as the last child of `parent`.
    pub fn append(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: Option<&str>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            text: text.map(str::to_string),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Rebuilds a document from a captured page.
    #[must_use]
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        let mut doc = Self::new(&snapshot.root.tag);
        if let Some(title) = &snapshot.title {
            doc.set_title(title.clone());
        }
        let root = doc.root_id();
        doc.nodes[0].attrs = snapshot
            .root
            .attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        doc.nodes[0].text.clone_from(&snapshot.root.text);
        for child in &snapshot.root.children {
            doc.append_snapshot(root, child);
        }
        doc
    }

    /// Parses a JSON page snapshot.
    ///
    /// # Errors
    /// Returns error if the JSON does not describe a page.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: PageSnapshot = serde_json::from_str(json).map_err(AppError::json_parse)?;
        Ok(Self::from_snapshot(&snapshot))
    }

    fn append_snapshot(&mut self, parent: NodeId, element: &ElementSnapshot) {
        let attrs: Vec<(&str, &str)> = element
            .attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let id = self.append(parent, &element.tag, &attrs, element.text.as_deref());
        for child in &element.children {
            self.append_snapshot(id, child);
        }
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        let block = BLOCK_TAGS.contains(&node.tag.as_str());

        if block && !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        if let Some(text) = &node.text {
            out.push_str(text);
        }
        for child in &node.children {
            self.collect_text(*child, out);
        }
        if block && !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
    }
}

impl DomTree for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root_id()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = &self.node(self.node(node).parent?).children;
        let index = siblings.iter().position(|c| *c == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    fn tag(&self, node: NodeId) -> &str {
        &self.node(node).tag
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn rendered_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out.trim_end_matches('\n').to_string()
    }

    fn document_title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}
