//! Abstract view of the chat page.
//!
//! The collection pipeline only ever talks to these traits. Anything that can
//! answer structural queries about a tree of elements (and, for collection,
//! scroll a container) can be exported from.

use std::fmt::Debug;

/// Predicate deciding whether a node carries some structural marker.
pub trait NodeMatcher {
    /// Returns true when `node` matches.
    fn matches<T: DomTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool;
}

/// Read access to an element tree.
///
/// Handles are only meaningful for the snapshot they were obtained from,
/// except for the scroll container (see [`ScrollSurface`]).
pub trait DomTree {
    /// Element handle.
    type Node: Copy + Eq + Debug;

    /// The document element.
    fn root(&self) -> Self::Node;

    /// Parent element, `None` at the root.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Child elements in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// The element sibling immediately before `node`.
    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Lower-case tag name.
    fn tag(&self, node: Self::Node) -> &str;

    /// Attribute value, if present.
    fn attr(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Full rendered text of the element and its subtree.
    fn rendered_text(&self, node: Self::Node) -> String;

    /// The page title, when the surface knows one.
    fn document_title(&self) -> Option<&str> {
        None
    }

    /// First descendant of `node` (excluding `node`) in document order that
    /// matches.
    fn find_descendant<M: NodeMatcher + ?Sized>(
        &self,
        node: Self::Node,
        matcher: &M,
    ) -> Option<Self::Node> {
        let mut stack: Vec<Self::Node> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            if matcher.matches(self, current) {
                return Some(current);
            }
            stack.extend(self.children(current).into_iter().rev());
        }
        None
    }

    /// Every element of the document that matches, in document order.
    fn query_all<M: NodeMatcher + ?Sized>(&self, matcher: &M) -> Vec<Self::Node> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(current) = stack.pop() {
            if matcher.matches(self, current) {
                found.push(current);
            }
            stack.extend(self.children(current).into_iter().rev());
        }
        found
    }

    /// First element of the document that matches.
    fn query<M: NodeMatcher + ?Sized>(&self, matcher: &M) -> Option<Self::Node> {
        let root = self.root();
        if matcher.matches(self, root) {
            return Some(root);
        }
        self.find_descendant(root, matcher)
    }

    /// Whether `node` has a matching descendant.
    fn contains_match<M: NodeMatcher + ?Sized>(&self, node: Self::Node, matcher: &M) -> bool {
        self.find_descendant(node, matcher).is_some()
    }
}

/// A tree whose elements can be scrolled vertically.
///
/// Scrolling may re-render the tree (virtualization): message nodes appear
/// and disappear between calls. Implementations keep the handle of a
/// scrollable container valid across such re-renders.
pub trait ScrollSurface: DomTree {
    /// Current vertical scroll offset of `node`.
    fn scroll_top(&self, node: Self::Node) -> f64;

    /// Requests a new scroll offset; implementations clamp to the valid range.
    fn set_scroll_top(&mut self, node: Self::Node, offset: f64);

    /// Total height of the scrollable content.
    fn scroll_height(&self, node: Self::Node) -> f64;

    /// Height of the visible area.
    fn client_height(&self, node: Self::Node) -> f64;

    /// Whether the element's vertical overflow is `auto` or `scroll`.
    fn overflows_y(&self, node: Self::Node) -> bool;

    /// Scrollable and actually taller than its viewport.
    fn is_vertically_scrollable(&self, node: Self::Node) -> bool {
        self.overflows_y(node) && self.scroll_height(node) > self.client_height(node)
    }
}
