// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine handle: registry, event table and readiness gate for one document.
//!
//! [`Events`] is a cheap-to-clone handle. Clones share state, so a listener can
//! capture a clone and attach, detach or trigger from inside a dispatch.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::fmt::Debug;
use core::hash::Hash;

use crate::dispatcher;
use crate::ready::{self, BoxError, DrainReport, ReadyGate};
use crate::registry::{Detach, Listen, Registry};
use crate::selection::Selection;
use crate::specifier::EventSpec;
use crate::table::EventTable;
use crate::types::{EventTree, Handler};

struct Shared<K, D> {
    registry: RefCell<Registry<K, D>>,
    table: EventTable,
    ready: RefCell<ReadyGate<Events<K, D>>>,
}

/// Listener registry, event table and readiness gate for one document.
///
/// Hosts keep a single `Events` (and its clones) per document. The readiness
/// gate lives in the instance, so two independently created instances signal
/// and drain independently.
///
/// ```
/// use understory_delegate::{Events, EventTree, Handler, Listen};
///
/// struct Line;
/// impl EventTree for Line {
///     type Node = u32;
///     fn parent(&self, n: u32) -> Option<u32> { n.checked_sub(1) }
///     fn is_element(&self, _: u32) -> bool { true }
///     fn matches(&self, n: u32, sel: &str) -> bool { sel == "*" && n > 0 }
/// }
///
/// let events: Events<u32> = Events::new();
/// let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
/// let sink = log.clone();
/// let h: Handler<u32> = Handler::observe(move |ev| sink.borrow_mut().push(ev.current_target()));
///
/// events.attach(0, "click", Listen::new().delegate("*"), Some(&h), false);
/// events.attach(0, "click", Listen::new(), Some(&h), false);
/// events.dispatch(&Line, 2, "click", None);
/// assert_eq!(*log.borrow(), [0, 2, 1]);
/// ```
pub struct Events<K, D = ()> {
    shared: Rc<Shared<K, D>>,
}

impl<K, D> Clone for Events<K, D> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<K, D> Debug for Events<K, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("table", &self.shared.table)
            .field("ready", &self.shared.ready)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash + Debug, D> Default for Events<K, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash + Debug, D> Events<K, D> {
    /// Default event table; the readiness gate has not fired.
    pub fn new() -> Self {
        Self::build(EventTable::default(), ReadyGate::new())
    }

    /// Custom event table; the readiness gate has not fired.
    pub fn with_table(table: EventTable) -> Self {
        Self::build(table, ReadyGate::new())
    }

    /// Default event table; the readiness gate starts fired if `ready` is true.
    ///
    /// Hosts that are already interactive when the engine is created pass `true`.
    pub fn with_ready(ready: bool) -> Self {
        Self::with_table_and_ready(EventTable::default(), ready)
    }

    /// Custom event table; the readiness gate starts fired if `ready` is true.
    pub fn with_table_and_ready(table: EventTable, ready: bool) -> Self {
        let gate = if ready {
            ReadyGate::fired()
        } else {
            ReadyGate::new()
        };
        Self::build(table, gate)
    }

    fn build(table: EventTable, gate: ReadyGate<Self>) -> Self {
        Self {
            shared: Rc::new(Shared {
                registry: RefCell::new(Registry::default()),
                table,
                ready: RefCell::new(gate),
            }),
        }
    }

    /// The event table this instance consults.
    pub fn table(&self) -> &EventTable {
        &self.shared.table
    }

    /// Whether two handles share state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Attach `handler` on `node` for each whitespace-separated specifier in `names`.
    ///
    /// Records are appended in the order the names are listed. Namespace-only
    /// specifiers and a missing handler are ignored. Returns the number of records created.
    pub fn attach(
        &self,
        node: K,
        names: &str,
        opts: Listen<D>,
        handler: Option<&Handler<K, D>>,
        one_shot: bool,
    ) -> usize
    where
        D: Clone,
    {
        let Some(handler) = handler else {
            tracing::trace!(?node, names, "ignoring attach without handler");
            return 0;
        };
        let mut registry = self.shared.registry.borrow_mut();
        let created = EventSpec::parse_list(names)
            .filter(|spec| {
                registry.attach(
                    node,
                    spec,
                    opts.selector(),
                    opts.bound_data().cloned(),
                    handler,
                    one_shot,
                )
            })
            .count();
        tracing::trace!(?node, names, selector = opts.selector(), one_shot, created, "attach");
        created
    }

    /// Detach records on `node`.
    ///
    /// With `names` set, each whitespace-separated specifier is applied in turn
    /// (see [`Detach`] for the matching rules). With `names` unset the query
    /// applies to every name; an unfiltered query therefore clears the node.
    /// Returns the number of records removed.
    pub fn detach(&self, node: K, names: Option<&str>, query: &Detach<K, D>) -> usize {
        let mut registry = self.shared.registry.borrow_mut();
        let removed = match names {
            Some(names) => EventSpec::parse_list(names)
                .map(|spec| registry.detach(node, &spec, query))
                .sum(),
            None => registry.detach(node, &EventSpec::parse(""), query),
        };
        tracing::trace!(?node, names, removed, "detach");
        removed
    }

    /// Remove every record on `node`. Returns the number removed.
    pub fn detach_all(&self, node: K) -> usize {
        let removed = self.shared.registry.borrow_mut().detach_all(node);
        tracing::trace!(?node, removed, "detach all");
        removed
    }

    /// Trigger `name` (a single specifier, namespaces allowed) at `target`.
    ///
    /// `detail` is visible to every listener as [`Event::detail`](crate::types::Event::detail),
    /// and as [`Event::data`](crate::types::Event::data) for listeners without bound data.
    /// Returns the node at whose level propagation was halted, if any.
    pub fn dispatch<T>(&self, tree: &T, target: K, name: &str, detail: Option<&D>) -> Option<K>
    where
        T: EventTree<Node = K>,
    {
        dispatcher::dispatch(
            &self.shared.registry,
            &self.shared.table,
            tree,
            target,
            &EventSpec::parse(name),
            detail,
        )
    }

    /// Number of records on `node`.
    pub fn listener_count(&self, node: K) -> usize {
        self.shared.registry.borrow().count(node)
    }

    /// Whether `node` currently holds a registry entry.
    pub fn has_registry(&self, node: K) -> bool {
        self.shared.registry.borrow().has_entry(node)
    }

    /// Build a [`Selection`] over `nodes` in `tree`. Non-elements are dropped.
    pub fn select<'t, T>(
        &self,
        tree: &'t T,
        nodes: impl IntoIterator<Item = K>,
    ) -> Selection<'t, T, D>
    where
        T: EventTree<Node = K>,
    {
        Selection::new(self.clone(), tree, nodes)
    }

    /// Register a readiness callback. It receives this handle.
    ///
    /// Before [`signal_ready`](Self::signal_ready) the callback is queued. Afterwards
    /// it is scheduled for the next [`tick`](Self::tick) and never runs synchronously.
    pub fn ready(&self, callback: impl FnOnce(&Self) -> Result<(), BoxError> + 'static) {
        self.shared.ready.borrow_mut().on_ready(callback);
    }

    /// Whether the readiness signal has fired.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.borrow().has_fired()
    }

    /// Deliver the host's one-time readiness signal and drain queued callbacks.
    ///
    /// Later calls do nothing. Callback failures are isolated and reported.
    pub fn signal_ready(&self) -> DrainReport {
        let batch = self.shared.ready.borrow_mut().take_signal();
        match batch {
            Some(batch) => ready::drain(batch, self),
            None => DrainReport::default(),
        }
    }

    /// Run readiness callbacks scheduled after the signal fired, until none remain.
    pub fn tick(&self) -> DrainReport {
        let mut report = DrainReport::default();
        loop {
            let batch = self.shared.ready.borrow_mut().take_scheduled();
            if batch.is_empty() {
                return report;
            }
            let drained = ready::drain(batch, self);
            report.invoked += drained.invoked;
            report.failures.extend(drained.failures);
        }
    }
}
