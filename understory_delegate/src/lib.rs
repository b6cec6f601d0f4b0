// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_delegate --heading-base-level=0

//! Understory Delegate: namespaced, delegated event listeners over a host node tree.
//!
//! This crate is the event layer of a document-style UI. It owns a per-node
//! listener registry and a deterministic dispatch walk. The host supplies the tree
//! through the [`EventTree`] trait: parent lookup, an element check, and a selector test.
//!
//! ## Concepts
//!
//! - Specifiers: `click.menu.item` is the bare name `click` with namespaces `menu` and
//!   `item`. Triggering fires a listener iff the trigger's namespaces are a subset of
//!   the listener's. See [`specifier`].
//! - Delegation: a listener with a selector fires once for each matching element from
//!   the target up to and including the node it is registered on, with `current_target`
//!   set to the match. See [`delegate`].
//! - Bubbling: dispatch runs the target's listeners, then walks element ancestors.
//!   Returning [`Outcome::Stop`] halts the walk after the current level. Some names never
//!   bubble, and some have a native triggerer the host runs first. See [`EventTable`].
//! - One-shot listeners are removed before their first invocation.
//! - Readiness: callbacks queued until the host signals it is ready, each run in
//!   isolation. See [`ready`].
//!
//! ## API overview
//!
//! - [`Events`]: cheap-clone handle owning registry, table and readiness gate.
//!   - [`Events::attach`] / [`Events::detach`] / [`Events::detach_all`] with [`Listen`] and [`Detach`].
//!   - [`Events::dispatch`] → where propagation stopped, if it did.
//!   - [`Events::ready`] / [`Events::signal_ready`] / [`Events::tick`].
//! - [`Selection`]: chainable `on` / `one` / `off` / `trigger` over a set of nodes, skipping non-elements.
//! - [`Event`]: what a [`Handler`] sees during one invocation.
//!
//! ## Minimal example
//!
//! ```
//! use understory_delegate::{Events, EventTree, Handler, Listen, Outcome};
//!
//! // 0 is the root; 1 and 2 are its children; 3 is a child of 2.
//! struct Doc;
//! impl EventTree for Doc {
//!     type Node = u32;
//!     fn parent(&self, n: u32) -> Option<u32> {
//!         match n { 0 => None, 3 => Some(2), _ => Some(0) }
//!     }
//!     fn is_element(&self, _: u32) -> bool { true }
//!     fn matches(&self, n: u32, sel: &str) -> bool { sel == ".button" && n == 2 }
//! }
//!
//! let events: Events<u32> = Events::new();
//! let clicks = std::rc::Rc::new(std::cell::Cell::new(0));
//! let c = clicks.clone();
//! let on_button: Handler<u32> = Handler::new(move |ev| {
//!     assert_eq!(ev.current_target(), 2);
//!     c.set(c.get() + 1);
//!     Outcome::Stop
//! });
//!
//! events.attach(0, "click.toolbar", Listen::new().delegate(".button"), Some(&on_button), false);
//! assert_eq!(events.dispatch(&Doc, 3, "click", None), Some(0));
//! assert_eq!(events.dispatch(&Doc, 1, "click", None), None);
//! assert_eq!(clicks.get(), 1);
//!
//! events.select(&Doc, [0]).off(".toolbar");
//! assert_eq!(events.listener_count(0), 0);
//! ```
//!
//! ## Features
//!
//! - `std`: catches panics in readiness callbacks and enables `std` in dependencies.
//! - `dom_tree_adapter`: implements [`EventTree`] for `understory_dom_tree::Tree`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod adapters;
pub mod delegate;
mod dispatcher;
mod events;
pub mod ready;
mod registry;
mod selection;
pub mod specifier;
pub mod table;
pub mod types;

#[cfg(test)]
mod testing;

pub use events::Events;
pub use ready::{BoxError, DrainReport, ReadyError, ReadyGate};
pub use registry::{Detach, Listen, SelectorFilter};
pub use selection::Selection;
pub use specifier::{EventSpec, Namespaces};
pub use table::{EventTable, EventTraits};
pub use types::{Event, EventTree, Handler, Outcome, Phase};
