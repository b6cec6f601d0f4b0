// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter for Understory DOM Tree.
//!
//! ## Feature
//!
//! Enable with `dom_tree_adapter`.
//!
//! ## Notes
//!
//! - Delegation selectors are parsed on every match test. A selector that fails to
//!   parse matches nothing and is logged at `trace` level.
//! - `focus` and `blur` map to [`Tree::focus`] and [`Tree::blur`]. Whether they run
//!   at all is decided by the [`EventTable`](crate::EventTable) of the [`Events`] instance.

use understory_dom_tree::{NodeId, SelectorError, Tree};

use crate::events::Events;
use crate::selection::Selection;
use crate::types::EventTree;

impl EventTree for Tree {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_of(node)
    }

    fn is_element(&self, node: NodeId) -> bool {
        Self::is_element(self, node)
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        self.matches_str(node, selector).unwrap_or_else(|err| {
            tracing::trace!(selector, %err, "unparseable delegation selector");
            false
        })
    }

    fn native_action(&self, node: NodeId, name: &str) -> bool {
        match name {
            "focus" => self.focus(node),
            "blur" => self.blur(node),
            _ => false,
        }
    }
}

/// Select the elements under `tree`'s document that match `selector`, in document order.
///
/// ```
/// use understory_delegate::adapters::dom_tree::select;
/// use understory_delegate::Events;
/// use understory_dom_tree::{ElementData, Tree};
///
/// let mut tree = Tree::new();
/// let list = tree.insert_element(tree.document(), ElementData::new("ul"));
/// tree.insert_element(list, ElementData::new("li").with_class("item"));
/// tree.insert_element(list, ElementData::new("li").with_class("item"));
///
/// let events: Events<_> = Events::new();
/// assert_eq!(select(&events, &tree, ".item").unwrap().len(), 2);
/// assert!(select(&events, &tree, "li >").is_err());
/// ```
pub fn select<'t, D>(
    events: &Events<NodeId, D>,
    tree: &'t Tree,
    selector: &str,
) -> Result<Selection<'t, Tree, D>, SelectorError> {
    let nodes = tree.query_selector_all(tree.document(), selector)?;
    Ok(events.select(tree, nodes))
}
