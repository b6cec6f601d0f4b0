// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry: per-node, per-name ordered listener records.
//!
//! ## Storage
//!
//! - A node has no registry entry until its first listener is attached, and
//!   loses it when its last listener is removed.
//! - Within a node, records are grouped by bare name and kept in registration order.
//! - Records are shared (`Rc`) so dispatch can iterate a snapshot while listeners
//!   attach and detach.
//!
//! ## Removal rules
//!
//! A record is removed by a [`Detach`] query when all of the following hold:
//!
//! - Name: the query's bare name equals the record's, or the query has no bare name.
//! - Namespaces: the query's namespaces are a subset of the record's.
//! - Selector: per [`SelectorFilter`]. When no filter is given, named queries
//!   only remove direct (non-delegated) records and namespace-only queries
//!   remove records regardless of selector.
//! - Handler: if a handler is given, the record's handler has the same identity.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::specifier::{EventSpec, Namespaces};
use crate::types::Handler;

/// One registered listener. Immutable once stored.
pub(crate) struct ListenerRecord<K, D> {
    pub(crate) namespaces: Namespaces,
    /// Declared-order namespace string, computed once.
    pub(crate) declared_namespace: Box<str>,
    pub(crate) selector: Option<Box<str>>,
    pub(crate) data: Option<D>,
    pub(crate) handler: Handler<K, D>,
    pub(crate) one_shot: bool,
}

impl<K, D> Debug for ListenerRecord<K, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("namespaces", &self.namespaces)
            .field("selector", &self.selector)
            .field("one_shot", &self.one_shot)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

pub(crate) type Record<K, D> = Rc<ListenerRecord<K, D>>;

/// Records for one node and one bare name, snapshotted for a dispatch level.
pub(crate) type Snapshot<K, D> = SmallVec<[Record<K, D>; 4]>;

/// Options for attaching listeners.
///
/// ```
/// use understory_delegate::Listen;
///
/// let opts: Listen<u32> = Listen::new().delegate(".item").data(7);
/// assert_eq!(opts.selector(), Some(".item"));
/// assert_eq!(opts.bound_data(), Some(&7));
/// ```
#[derive(Clone, Debug)]
pub struct Listen<D> {
    selector: Option<Box<str>>,
    data: Option<D>,
}

impl<D> Default for Listen<D> {
    fn default() -> Self {
        Self {
            selector: None,
            data: None,
        }
    }
}

impl<D> Listen<D> {
    /// Direct listener without bound data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegate to descendants matching `selector`.
    pub fn delegate(mut self, selector: &str) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Bind data delivered to the listener as [`Event::data`](crate::types::Event::data).
    pub fn data(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }

    /// The delegation selector, if any.
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// The bound data, if any.
    pub fn bound_data(&self) -> Option<&D> {
        self.data.as_ref()
    }
}

/// How a [`Detach`] query treats delegation selectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorFilter {
    /// Only records without a delegation selector.
    Direct,
    /// Only records delegated with exactly this selector.
    Exact(Box<str>),
    /// Records with or without any selector.
    Any,
}

impl SelectorFilter {
    fn admits(&self, selector: Option<&str>) -> bool {
        match self {
            Self::Direct => selector.is_none(),
            Self::Exact(want) => selector == Some(&**want),
            Self::Any => true,
        }
    }
}

/// Filters for detaching listeners.
///
/// ```
/// use understory_delegate::{Detach, Handler, Outcome, SelectorFilter};
///
/// let h: Handler<u32> = Handler::new(|_| Outcome::Continue);
/// let query = Detach::new().delegated(".item").handler(&h);
/// assert_eq!(query.selector_filter(), Some(&SelectorFilter::Exact(".item".into())));
/// ```
#[derive(Debug)]
pub struct Detach<K, D> {
    selector: Option<SelectorFilter>,
    handler: Option<Handler<K, D>>,
}

impl<K, D> Default for Detach<K, D> {
    fn default() -> Self {
        Self {
            selector: None,
            handler: None,
        }
    }
}

impl<K, D> Clone for Detach<K, D> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<K, D> Detach<K, D> {
    /// No filters beyond the specifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only remove records delegated with exactly `selector`.
    pub fn delegated(mut self, selector: &str) -> Self {
        self.selector = Some(SelectorFilter::Exact(selector.into()));
        self
    }

    /// Only remove direct records.
    pub fn direct(mut self) -> Self {
        self.selector = Some(SelectorFilter::Direct);
        self
    }

    /// Remove records regardless of delegation selector.
    pub fn any_selector(mut self) -> Self {
        self.selector = Some(SelectorFilter::Any);
        self
    }

    /// Only remove records registered with this handler.
    pub fn handler(mut self, handler: &Handler<K, D>) -> Self {
        self.handler = Some(handler.clone());
        self
    }

    /// The explicit selector filter, if one was set.
    pub fn selector_filter(&self) -> Option<&SelectorFilter> {
        self.selector.as_ref()
    }

    fn admits(&self, spec: &EventSpec, record: &ListenerRecord<K, D>) -> bool {
        let selector_ok = match &self.selector {
            Some(filter) => filter.admits(record.selector.as_deref()),
            None if spec.is_valid() => record.selector.is_none(),
            None => true,
        };
        selector_ok
            && record.namespaces.contains_all(spec.namespaces())
            && self
                .handler
                .as_ref()
                .is_none_or(|h| h.ptr_eq(&record.handler))
    }
}

type NameMap<K, D> = HashMap<Box<str>, SmallVec<[Record<K, D>; 2]>>;

/// Per-node listener storage.
pub(crate) struct Registry<K, D> {
    nodes: HashMap<K, NameMap<K, D>>,
}

impl<K, D> Default for Registry<K, D> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug, D> Registry<K, D> {
    /// Append a record for a valid specifier. Invalid specifiers are ignored.
    pub(crate) fn attach(
        &mut self,
        node: K,
        spec: &EventSpec,
        selector: Option<&str>,
        data: Option<D>,
        handler: &Handler<K, D>,
        one_shot: bool,
    ) -> bool {
        if !spec.is_valid() {
            tracing::trace!(?node, %spec, "ignoring namespace-only specifier on attach");
            return false;
        }
        let record = Rc::new(ListenerRecord {
            namespaces: spec.namespaces().clone(),
            declared_namespace: spec.namespaces().declared().into_boxed_str(),
            selector: selector.map(Box::from),
            data,
            handler: handler.clone(),
            one_shot,
        });
        self.nodes
            .entry(node)
            .or_default()
            .entry(spec.name().into())
            .or_default()
            .push(record);
        true
    }

    /// Remove every record matching `spec` and `query`. Returns how many were removed.
    pub(crate) fn detach(&mut self, node: K, spec: &EventSpec, query: &Detach<K, D>) -> usize {
        let Some(names) = self.nodes.get_mut(&node) else {
            return 0;
        };
        let mut removed = 0;
        names.retain(|name, records| {
            if spec.is_valid() && **name != *spec.name() {
                return true;
            }
            let before = records.len();
            records.retain(|r| !query.admits(spec, r));
            removed += before - records.len();
            !records.is_empty()
        });
        if names.is_empty() {
            self.nodes.remove(&node);
        }
        removed
    }

    /// Remove every record on `node`. Returns how many were removed.
    pub(crate) fn detach_all(&mut self, node: K) -> usize {
        self.nodes
            .remove(&node)
            .map(|names| names.values().map(|records| records.len()).sum())
            .unwrap_or(0)
    }

    /// Copy out the current records for `node` and `name`.
    pub(crate) fn snapshot(&self, node: K, name: &str) -> Snapshot<K, D> {
        self.nodes
            .get(&node)
            .and_then(|names| names.get(name))
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove `record` if it is still registered. Returns true if it was.
    ///
    /// Used to retire one-shot records before their handler runs.
    pub(crate) fn claim(&mut self, node: K, name: &str, record: &Record<K, D>) -> bool {
        let Some(names) = self.nodes.get_mut(&node) else {
            return false;
        };
        let Some(records) = names.get_mut(name) else {
            return false;
        };
        let Some(pos) = records.iter().position(|r| Rc::ptr_eq(r, record)) else {
            return false;
        };
        records.remove(pos);
        if records.is_empty() {
            names.remove(name);
            if names.is_empty() {
                self.nodes.remove(&node);
            }
        }
        true
    }

    /// Number of records on `node`.
    pub(crate) fn count(&self, node: K) -> usize {
        self.nodes
            .get(&node)
            .map(|names| names.values().map(|records| records.len()).sum())
            .unwrap_or(0)
    }

    /// Whether `node` currently holds a registry entry.
    pub(crate) fn has_entry(&self, node: K) -> bool {
        self.nodes.contains_key(&node)
    }
}
