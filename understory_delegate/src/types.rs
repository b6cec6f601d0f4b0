// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: the host tree capability, handlers, and the per-invocation event view.

use alloc::rc::Rc;
use core::fmt::Debug;
use core::hash::Hash;

/// What the engine needs from the host's node tree.
///
/// Implement this for your document type. The engine never mutates the tree;
/// native actions that have side effects (moving focus) are expected to use
/// interior state on the host side.
pub trait EventTree {
    /// Node handle.
    type Node: Copy + Eq + Hash + Debug;

    /// Parent of `node`, or `None` at the root.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Whether `node` is an element. Non-elements never hold or receive listeners.
    fn is_element(&self, node: Self::Node) -> bool;

    /// Selector test. A selector the host cannot parse simply does not match.
    fn matches(&self, node: Self::Node, selector: &str) -> bool;

    /// Run the host's native triggerer for `name` on `node`, if it has one.
    ///
    /// Returns true if a native triggerer ran. It must not dispatch back into
    /// the engine; registered listeners are invoked by the engine itself.
    fn native_action(&self, node: Self::Node, name: &str) -> bool {
        let _ = (node, name);
        false
    }
}

/// Outcome of a listener invocation.
///
/// `Stop` halts propagation to ancestors once every listener at the current
/// level has run; it never skips later listeners on the same node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Keep propagating.
    #[default]
    Continue,
    /// Do not propagate past the current level.
    Stop,
}

/// Dispatch phase a listener is invoked in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// At the node the event was triggered on.
    Target,
    /// At an ancestor of the target, including delegated invocations.
    Bubble,
}

/// The event as seen by one listener invocation.
#[derive(Debug)]
pub struct Event<'a, K, D> {
    pub(crate) name: &'a str,
    pub(crate) namespace: &'a str,
    pub(crate) listener_namespace: &'a str,
    pub(crate) target: K,
    pub(crate) current_target: K,
    pub(crate) delegate_target: K,
    pub(crate) phase: Phase,
    pub(crate) bubbles: bool,
    pub(crate) data: Option<&'a D>,
    pub(crate) detail: Option<&'a D>,
    pub(crate) propagation_stopped: bool,
}

impl<'a, K: Copy, D> Event<'a, K, D> {
    /// Bare event name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Namespaces the event was triggered with, sorted and `.`-joined (empty if none).
    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    /// Namespaces of the invoked listener, in the order they were declared.
    pub fn listener_namespace(&self) -> &'a str {
        self.listener_namespace
    }

    /// The node the event was triggered on. Constant for the whole dispatch.
    pub fn target(&self) -> K {
        self.target
    }

    /// The node this invocation is for.
    ///
    /// For delegated listeners this is the matched descendant, not the node
    /// holding the registration.
    pub fn current_target(&self) -> K {
        self.current_target
    }

    /// The node holding the listener registration.
    pub fn delegate_target(&self) -> K {
        self.delegate_target
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether this event name bubbles.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Data bound at registration, falling back to the trigger's data.
    pub fn data(&self) -> Option<&'a D> {
        self.data.or(self.detail)
    }

    /// Data passed to the trigger call, if any.
    pub fn detail(&self) -> Option<&'a D> {
        self.detail
    }

    /// Halt propagation to ancestors; same as returning [`Outcome::Stop`].
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether this invocation asked to halt propagation.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

type HandlerFn<K, D> = dyn Fn(&mut Event<'_, K, D>) -> Outcome;

/// A shared listener callback with identity.
///
/// Clones share identity; two handlers built from separate closures never
/// compare equal, even if the closures are identical. Removal by handler uses
/// this identity.
///
/// ```
/// use understory_delegate::{Handler, Outcome};
///
/// let h: Handler<u32> = Handler::new(|_| Outcome::Continue);
/// let same = h.clone();
/// let other: Handler<u32> = Handler::new(|_| Outcome::Continue);
/// assert!(h.ptr_eq(&same));
/// assert!(!h.ptr_eq(&other));
/// ```
pub struct Handler<K, D = ()>(Rc<HandlerFn<K, D>>);

impl<K, D> Handler<K, D> {
    /// Wrap a callback.
    pub fn new(f: impl Fn(&mut Event<'_, K, D>) -> Outcome + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wrap a callback that never halts propagation.
    pub fn observe(f: impl Fn(&Event<'_, K, D>) + 'static) -> Self {
        Self::new(move |ev| {
            f(ev);
            Outcome::Continue
        })
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn call(&self, event: &mut Event<'_, K, D>) -> Outcome {
        (self.0)(event)
    }
}

impl<K, D> Clone for Handler<K, D> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<K, D> Debug for Handler<K, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Handler")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
