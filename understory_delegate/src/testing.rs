// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small fixed tree for unit tests.
//!
//! ```text
//! document (not an element)
//! └── html
//!     └── div.parent
//!         ├── div.event
//!         │   ├── div.child
//!         │   │   └── div.grandchild
//!         │   └── "text" (not an element)
//!         └── input.event-focus   (native focus/blur)
//! ```
//!
//! Selectors understood by [`Fixture::matches`]: `*`, a tag name, or a chain of
//! `.class` tokens; `,` separates alternatives.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::types::EventTree;

#[derive(Debug)]
struct FixtureNode {
    parent: Option<usize>,
    /// `None` for non-element nodes.
    tag: Option<&'static str>,
    classes: &'static [&'static str],
}

#[derive(Debug)]
pub(crate) struct Fixture {
    nodes: Vec<FixtureNode>,
    natives: Vec<(usize, &'static str)>,
    /// Every `native_action` request, in order.
    pub(crate) native_calls: Rc<RefCell<Vec<(usize, String)>>>,
    pub(crate) document: usize,
    pub(crate) html: usize,
    pub(crate) parent: usize,
    pub(crate) event: usize,
    pub(crate) child: usize,
    pub(crate) grandchild: usize,
    pub(crate) input: usize,
    pub(crate) text: usize,
}

impl Fixture {
    pub(crate) fn cash() -> Self {
        let mut nodes = Vec::new();
        let mut add = |parent: Option<usize>,
                       tag: Option<&'static str>,
                       classes: &'static [&'static str]| {
            nodes.push(FixtureNode {
                parent,
                tag,
                classes,
            });
            nodes.len() - 1
        };
        let document = add(None, None, &[]);
        let html = add(Some(document), Some("html"), &[]);
        let parent = add(Some(html), Some("div"), &["parent"]);
        let event = add(Some(parent), Some("div"), &["event"]);
        let child = add(Some(event), Some("div"), &["child"]);
        let grandchild = add(Some(child), Some("div"), &["grandchild"]);
        let text = add(Some(event), None, &[]);
        let input = add(Some(parent), Some("input"), &["event-focus"]);
        Self {
            nodes,
            natives: Vec::from([(input, "focus"), (input, "blur")]),
            native_calls: Rc::default(),
            document,
            html,
            parent,
            event,
            child,
            grandchild,
            input,
            text,
        }
    }

    fn matches_one(&self, node: &FixtureNode, selector: &str) -> bool {
        match selector {
            "" => false,
            "*" => true,
            sel if sel.starts_with('.') => sel[1..]
                .split('.')
                .all(|class| !class.is_empty() && node.classes.contains(&class)),
            tag => node.tag == Some(tag),
        }
    }
}

impl EventTree for Fixture {
    type Node = usize;

    fn parent(&self, node: usize) -> Option<usize> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    fn is_element(&self, node: usize) -> bool {
        self.nodes.get(node).is_some_and(|n| n.tag.is_some())
    }

    fn matches(&self, node: usize, selector: &str) -> bool {
        let Some(n) = self.nodes.get(node).filter(|n| n.tag.is_some()) else {
            return false;
        };
        selector
            .split(',')
            .any(|alt| self.matches_one(n, alt.trim()))
    }

    fn native_action(&self, node: usize, name: &str) -> bool {
        self.native_calls.borrow_mut().push((node, name.into()));
        self.natives
            .iter()
            .any(|&(n, native)| n == node && native == name)
    }
}
