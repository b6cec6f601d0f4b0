// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chainable collection API over a set of nodes.
//!
//! A [`Selection`] is built once from a tree and a node list. Non-element members
//! are dropped at that point, so every operation below silently skips them.
//! Each operation applies to every remaining member in order and returns the
//! selection for chaining.
//!
//! ```
//! use understory_delegate::{Events, EventTree, Handler};
//! use std::{cell::Cell, rc::Rc};
//!
//! struct Flat;
//! impl EventTree for Flat {
//!     type Node = u8;
//!     fn parent(&self, _: u8) -> Option<u8> { None }
//!     fn is_element(&self, n: u8) -> bool { n != 0 }
//!     fn matches(&self, _: u8, _: &str) -> bool { false }
//! }
//!
//! let events: Events<u8> = Events::new();
//! let count = Rc::new(Cell::new(0));
//! let c = count.clone();
//! let h = Handler::observe(move |_| c.set(c.get() + 1));
//!
//! // Node 0 is not an element and is skipped.
//! events
//!     .select(&Flat, [0, 1, 2])
//!     .on("a b", Some(&h))
//!     .trigger("a")
//!     .trigger("b")
//!     .off("a")
//!     .trigger("a");
//! assert_eq!(count.get(), 4);
//! ```

use smallvec::SmallVec;

use crate::events::Events;
use crate::registry::{Detach, Listen};
use crate::types::{EventTree, Handler};

/// A filtered, ordered set of element nodes bound to an [`Events`] instance.
pub struct Selection<'t, T: EventTree, D = ()> {
    events: Events<T::Node, D>,
    tree: &'t T,
    nodes: SmallVec<[T::Node; 4]>,
}

impl<T: EventTree, D> core::fmt::Debug for Selection<'_, T, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Selection")
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

impl<'t, T: EventTree, D> Selection<'t, T, D> {
    /// Select `nodes` in `tree`, dropping non-elements.
    pub fn new(
        events: Events<T::Node, D>,
        tree: &'t T,
        nodes: impl IntoIterator<Item = T::Node>,
    ) -> Self {
        let mut skipped = 0_usize;
        let nodes = nodes
            .into_iter()
            .filter(|&n| {
                let keep = tree.is_element(n);
                skipped += usize::from(!keep);
                keep
            })
            .collect();
        if skipped > 0 {
            tracing::trace!(skipped, "dropped non-element members from selection");
        }
        Self {
            events,
            tree,
            nodes,
        }
    }

    /// The element members, in selection order.
    pub fn nodes(&self) -> &[T::Node] {
        &self.nodes
    }

    /// Number of element members.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no element members remain.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The engine handle this selection operates on.
    pub fn events(&self) -> &Events<T::Node, D> {
        &self.events
    }

    /// Attach a direct listener for each specifier in `names`.
    pub fn on(&self, names: &str, handler: Option<&Handler<T::Node, D>>) -> &Self
    where
        D: Clone,
    {
        self.attach(names, &Listen::new(), handler, false)
    }

    /// Attach with options (delegation selector, bound data).
    pub fn on_with(
        &self,
        names: &str,
        opts: Listen<D>,
        handler: Option<&Handler<T::Node, D>>,
    ) -> &Self
    where
        D: Clone,
    {
        self.attach(names, &opts, handler, false)
    }

    /// Attach several `(names, handler)` pairs sharing one set of options.
    pub fn on_map(&self, map: &[(&str, Handler<T::Node, D>)], opts: Listen<D>) -> &Self
    where
        D: Clone,
    {
        for (names, handler) in map {
            self.attach(names, &opts, Some(handler), false);
        }
        self
    }

    /// Like [`on`](Self::on), but each record is removed before its first invocation.
    pub fn one(&self, names: &str, handler: Option<&Handler<T::Node, D>>) -> &Self
    where
        D: Clone,
    {
        self.attach(names, &Listen::new(), handler, true)
    }

    /// Like [`on_with`](Self::on_with), with one-shot records.
    pub fn one_with(
        &self,
        names: &str,
        opts: Listen<D>,
        handler: Option<&Handler<T::Node, D>>,
    ) -> &Self
    where
        D: Clone,
    {
        self.attach(names, &opts, handler, true)
    }

    fn attach(
        &self,
        names: &str,
        opts: &Listen<D>,
        handler: Option<&Handler<T::Node, D>>,
        one_shot: bool,
    ) -> &Self
    where
        D: Clone,
    {
        let events = &self.events;
        for &node in &self.nodes {
            events.attach(node, names, opts.clone(), handler, one_shot);
        }
        self
    }

    /// Detach direct listeners matching `names`; namespace-only specifiers
    /// such as `.ns` also remove delegated listeners.
    pub fn off(&self, names: &str) -> &Self {
        self.off_with(Some(names), &Detach::new())
    }

    /// Remove every listener from every member.
    pub fn off_all(&self) -> &Self {
        for &node in &self.nodes {
            self.events.detach_all(node);
        }
        self
    }

    /// Detach listeners registered with `handler` for `names`.
    ///
    /// A missing handler is a no-op.
    pub fn off_handler(&self, names: &str, handler: Option<&Handler<T::Node, D>>) -> &Self {
        match handler {
            Some(handler) => self.off_with(Some(names), &Detach::new().handler(handler)),
            None => {
                tracing::trace!(names, "ignoring detach without handler");
                self
            }
        }
    }

    /// Detach with an explicit query. `None` applies the query to every name.
    pub fn off_with(&self, names: Option<&str>, query: &Detach<T::Node, D>) -> &Self {
        for &node in &self.nodes {
            self.events.detach(node, names, query);
        }
        self
    }

    /// Detach each `(names, handler)` pair, narrowed by `query`'s selector filter.
    pub fn off_map(
        &self,
        map: &[(&str, Handler<T::Node, D>)],
        query: &Detach<T::Node, D>,
    ) -> &Self {
        for (names, handler) in map {
            self.off_with(Some(*names), &query.clone().handler(handler));
        }
        self
    }

    /// Trigger `name` on each member in turn.
    pub fn trigger(&self, name: &str) -> &Self {
        for &node in &self.nodes {
            self.events.dispatch(self.tree, node, name, None);
        }
        self
    }

    /// Trigger `name` on each member, passing `detail` to every listener.
    pub fn trigger_with(&self, name: &str, detail: &D) -> &Self {
        for &node in &self.nodes {
            self.events.dispatch(self.tree, node, name, Some(detail));
        }
        self
    }
}
