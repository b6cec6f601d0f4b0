// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, queries, focus.

use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::selector::{Selector, SelectorError};
use crate::types::{ElementData, NodeFlags, NodeId, NodeKind};

/// A document tree.
///
/// The tree always owns a single [`NodeKind::Document`] root created by
/// [`Tree::new`]. Nodes are addressed by generational [`NodeId`]s; removing a
/// node makes every id into its subtree stale.
///
/// Focus is interior state so it can be moved by native actions while the
/// tree is shared.
///
/// ## Example
///
/// ```rust
/// use understory_dom_tree::{ElementData, Tree};
///
/// let mut tree = Tree::new();
/// let body = tree.insert_element(tree.document(), ElementData::new("body"));
/// let button = tree.insert_element(body, ElementData::new("button").with_class("ok").focusable());
///
/// assert_eq!(tree.parent_of(button), Some(body));
/// assert_eq!(tree.query_selector_all(tree.document(), "body > .ok").unwrap(), vec![button]);
/// assert!(tree.focus(button));
/// assert_eq!(tree.focused(), Some(button));
/// ```
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    document: NodeId,
    focused: Cell<Option<NodeId>>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("focused", &self.focused.get())
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Tree {
    /// Create a tree holding only the document root.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            document: NodeId::new(0, 0),
            focused: Cell::new(None),
        };
        tree.document = tree.alloc(NodeKind::Document);
        tree
    }

    /// The document root.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Insert an element as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn insert_element(&mut self, parent: NodeId, data: ElementData) -> NodeId {
        self.insert(parent, NodeKind::Element(data))
    }

    /// Insert a text node as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn insert_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.insert(parent, NodeKind::Text(text.into()))
    }

    /// Insert a comment node as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn insert_comment(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.insert(parent, NodeKind::Comment(text.into()))
    }

    /// Insert a node that is not attached to the document.
    ///
    /// Detached nodes are their own roots until passed to [`Tree::append`].
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        assert!(
            !matches!(kind, NodeKind::Document),
            "a tree has exactly one document node"
        );
        self.alloc(kind)
    }

    /// Move `id` (and its subtree) to the end of `parent`'s children.
    ///
    /// Does nothing if either id is stale, if `id` is the document, or if
    /// `parent` lies inside `id`'s subtree.
    pub fn append(&mut self, parent: NodeId, id: NodeId) {
        if !self.is_alive(id) || !self.is_alive(parent) || id == self.document {
            return;
        }
        if self.ancestors_inclusive(parent).any(|a| a == id) {
            return;
        }
        if let Some(old) = self.node(id).parent {
            self.unlink_parent(id, old);
        }
        self.link_parent(id, parent);
    }

    /// Remove a node (and its subtree) from the tree.
    ///
    /// The document root cannot be removed. Focus is cleared if the focused
    /// node was inside the removed subtree.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) || id == self.document {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free_subtree(child);
        }
        if self.focused.get() == Some(id) {
            self.focused.set(None);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Returns the node kind if the identifier is live.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node_opt(id).map(|n| &n.kind)
    }

    /// Returns the element payload if `id` is a live element.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.kind(id).and_then(NodeKind::as_element)
    }

    /// Returns the element payload mutably if `id` is a live element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_opt_mut(id)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Returns true if `id` is a live element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Iterate `id` and then its ancestors up to the root.
    pub fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.is_alive(id).then_some(id);
        core::iter::successors(first, |&n| self.parent_of(n))
    }

    /// Get the next node in depth-first (document) order.
    ///
    /// Returns `None` if no next node exists or if the current node is stale.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if !self.is_alive(current) {
            return None;
        }
        if let Some(&first_child) = self.node(current).children.first() {
            return Some(first_child);
        }
        let mut node = current;
        while let Some(parent) = self.parent_of(node) {
            if let Some(next_sibling) = self.next_sibling(node) {
                return Some(next_sibling);
            }
            node = parent;
        }
        None
    }

    /// Iterate the strict descendants of `scope` in document order.
    pub fn descendants(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.children_of(scope).first().copied();
        core::iter::from_fn(move || {
            let current = next?;
            next = self
                .next_depth_first(current)
                .filter(|&n| n != scope && self.is_descendant(n, scope));
            Some(current)
        })
    }

    /// Returns the flags of an element if the identifier is live.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.element(id).map(|el| el.flags)
    }

    /// Test an element against a parsed selector.
    ///
    /// Non-element nodes never match.
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        selector.matches_with(el, || {
            self.ancestors_inclusive(id)
                .skip(1)
                .filter_map(|a| self.element(a))
                .collect()
        })
    }

    /// Parse `selector` and test an element against it.
    pub fn matches_str(&self, id: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.matches(id, &selector))
    }

    /// Elements inside `scope` (exclusive) matching `selector`, in document order.
    pub fn query_selector_all(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .filter(|&n| self.matches(n, &selector))
            .collect())
    }

    /// The currently focused element, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused.get()
    }

    /// Native focus: move focus to `id` if it is a focusable, enabled element.
    ///
    /// Returns true if focus moved (or was already on `id`).
    pub fn focus(&self, id: NodeId) -> bool {
        let focusable = self.flags(id).is_some_and(|f| {
            f.contains(NodeFlags::FOCUSABLE) && !f.contains(NodeFlags::DISABLED)
        });
        if focusable {
            self.focused.set(Some(id));
        }
        focusable
    }

    /// Native blur: clear focus if it is on `id`.
    ///
    /// Returns true if `id` was focused.
    pub fn blur(&self, id: NodeId) -> bool {
        let was_focused = self.focused.get() == Some(id);
        if was_focused {
            self.focused.set(None);
        }
        was_focused
    }

    // --- internals ---

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, kind)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    fn insert(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        assert!(self.is_alive(parent), "dangling parent NodeId");
        let id = self.alloc(kind);
        self.link_parent(id, parent);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos + 1).copied()
    }

    fn is_descendant(&self, node: NodeId, scope: NodeId) -> bool {
        self.ancestors_inclusive(node).any(|a| a == scope)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }
}

impl Node {
    fn new(generation: u32, kind: NodeKind) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// `html > .parent > .event > .child > .grandchild`, plus `input.event-focus` under `.parent`.
    fn fixture() -> (Tree, [NodeId; 6]) {
        let mut tree = Tree::new();
        let html = tree.insert_element(tree.document(), ElementData::new("html"));
        let parent = tree.insert_element(html, ElementData::new("div").with_class("parent"));
        let event = tree.insert_element(parent, ElementData::new("div").with_class("event"));
        let child = tree.insert_element(event, ElementData::new("div").with_class("child"));
        let grandchild =
            tree.insert_element(child, ElementData::new("div").with_class("grandchild"));
        let input = tree.insert_element(
            parent,
            ElementData::new("input")
                .with_class("event-focus")
                .focusable(),
        );
        (tree, [html, parent, event, child, grandchild, input])
    }

    #[test]
    fn document_is_not_an_element() {
        let (tree, [html, ..]) = fixture();
        assert!(!tree.is_element(tree.document()));
        assert!(tree.is_element(html));
        assert_eq!(tree.parent_of(html), Some(tree.document()));
        assert_eq!(tree.parent_of(tree.document()), None);
    }

    #[test]
    fn text_and_comment_nodes_are_not_elements() {
        let (mut tree, [_, parent, ..]) = fixture();
        let text = tree.insert_text(parent, ".css");
        let comment = tree.insert_comment(parent, "note");
        assert!(!tree.is_element(text));
        assert!(!tree.is_element(comment));
        assert!(!tree.matches_str(text, "*").unwrap());
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let (mut tree, [_, _, event, child, grandchild, _]) = fixture();
        tree.remove(child);
        assert!(!tree.is_alive(child));
        assert!(!tree.is_alive(grandchild));
        assert!(tree.children_of(event).is_empty());
        let fresh = tree.insert_element(event, ElementData::new("span"));
        assert!(tree.is_alive(fresh));
        assert_ne!(fresh, child);
        assert_ne!(fresh, grandchild);
        assert_eq!(tree.parent_of(child), None);
    }

    #[test]
    fn document_cannot_be_removed() {
        let (mut tree, _) = fixture();
        tree.remove(tree.document());
        assert!(tree.is_alive(tree.document()));
    }

    #[test]
    fn depth_first_traversal_in_document_order() {
        let (tree, [html, parent, event, child, grandchild, input]) = fixture();
        let order: Vec<_> = tree.descendants(tree.document()).collect();
        assert_eq!(order, vec![html, parent, event, child, grandchild, input]);
        let scoped: Vec<_> = tree.descendants(event).collect();
        assert_eq!(scoped, vec![child, grandchild]);
        assert_eq!(tree.next_depth_first(grandchild), Some(input));
        assert_eq!(tree.next_depth_first(input), None);
    }

    #[test]
    fn query_selector_all_with_combinators() {
        let (tree, [_, _, event, child, grandchild, input]) = fixture();
        let doc = tree.document();
        assert_eq!(tree.query_selector_all(doc, ".event").unwrap(), vec![event]);
        assert_eq!(
            tree.query_selector_all(doc, ".parent div").unwrap(),
            vec![event, child, grandchild]
        );
        assert_eq!(
            tree.query_selector_all(doc, ".parent > *").unwrap(),
            vec![event, input]
        );
        assert_eq!(tree.query_selector_all(event, ".event").unwrap(), vec![]);
        assert!(tree.query_selector_all(doc, "div >").is_err());
    }

    #[test]
    fn append_moves_subtree_and_refuses_cycles() {
        let (mut tree, [html, parent, event, child, ..]) = fixture();
        tree.append(child, parent);
        assert_eq!(tree.parent_of(parent), Some(html));
        tree.append(html, child);
        assert_eq!(tree.parent_of(child), Some(html));
        assert!(!tree.children_of(event).contains(&child));

        let detached = tree.create(NodeKind::Element(ElementData::new("p")));
        assert_eq!(tree.parent_of(detached), None);
        tree.append(event, detached);
        assert_eq!(tree.parent_of(detached), Some(event));
    }

    #[test]
    fn focus_requires_focusable_enabled_element() {
        let (mut tree, [_, parent, .., input]) = fixture();
        assert!(!tree.focus(parent));
        assert_eq!(tree.focused(), None);
        assert!(tree.focus(input));
        assert_eq!(tree.focused(), Some(input));
        assert!(!tree.blur(parent));
        assert!(tree.blur(input));
        assert_eq!(tree.focused(), None);

        tree.element_mut(input).unwrap().flags |= NodeFlags::DISABLED;
        assert!(!tree.focus(input));
    }

    #[test]
    fn removing_focused_node_clears_focus() {
        let (mut tree, [_, parent, .., input]) = fixture();
        assert!(tree.focus(input));
        tree.remove(parent);
        assert_eq!(tree.focused(), None);
    }
}
