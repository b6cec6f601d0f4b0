// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dom_tree --heading-base-level=0

//! Understory DOM Tree: an addressable document tree for event routing and tests.
//!
//! - Represents a document of element, text, and comment nodes under a single document root.
//! - Answers the questions an event engine asks of its host: parent traversal, "is this an
//!   element", and "does this element match a selector".
//! - Provides the native actions that have platform side effects: [`Tree::focus`] and [`Tree::blur`].
//!
//! ## Not a browser
//!
//! There is no HTML parser, no styling, and no layout. Build documents with
//! [`Tree::insert_element`] and friends. Selector support covers compound selectors
//! (`tag`, `.class`, `#id`, `[attr]`, `[attr=value]`), descendant and child combinators,
//! and selector lists; see [`Selector`].
//!
//! ## API overview
//!
//! - [`Tree`]: container managing nodes and focus.
//! - [`NodeId`]: generational handle of a node.
//! - [`NodeKind`] / [`ElementData`]: node payloads.
//! - [`NodeFlags`]: focusable and disabled controls.
//! - [`Selector`] / [`SelectorError`]: parsed selector lists.
//!
//! Key operations:
//! - [`Tree::insert_element`](Tree::insert_element) / [`Tree::insert_text`](Tree::insert_text) → [`NodeId`]
//! - [`Tree::remove`](Tree::remove) and [`Tree::append`](Tree::append)
//! - [`Tree::parent_of`](Tree::parent_of), [`Tree::children_of`](Tree::children_of),
//!   [`Tree::ancestors_inclusive`](Tree::ancestors_inclusive), [`Tree::descendants`](Tree::descendants)
//! - [`Tree::matches`](Tree::matches) and [`Tree::query_selector_all`](Tree::query_selector_all)
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod selector;
mod tree;
mod types;

pub use selector::{Selector, SelectorError};
pub use tree::Tree;
pub use types::{ElementData, NodeFlags, NodeId, NodeKind};
