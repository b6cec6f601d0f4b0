// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch engine: walk target → ancestors and invoke matching listeners.
//!
//! ## Semantics
//!
//! A trigger runs these steps:
//!
//! 1. If the name is native (see [`EventTable`]) the host's native triggerer runs first,
//!    so platform side effects such as moving focus happen. Registered listeners still
//!    run synthetically afterwards.
//! 2. Target level: the target's own listeners whose namespaces satisfy the trigger,
//!    in registration order. A delegated listener on the target runs only if the
//!    target itself matches its selector.
//! 3. Bubble levels (bubbling names only): for each element ancestor, nearest first,
//!    its direct listeners with `current_target` = the ancestor, then its delegated
//!    listeners, once per matching node on the path (the ancestor included) with
//!    `current_target` = that node.
//!
//! A listener returning [`Outcome::Stop`] (or calling
//! [`Event::stop_propagation`](crate::types::Event::stop_propagation)) halts
//! propagation, but only between levels: every remaining listener at the current
//! level still runs. There is no equivalent of `stopImmediatePropagation`.
//!
//! Each level iterates a snapshot of its records, so listeners may attach or detach
//! on any node mid-dispatch. One-shot records are removed from the registry right
//! before their handler runs and are skipped if they are already gone, so a one-shot
//! handler runs at most once even when it re-triggers the same event.
//!
//! Panics raised by listeners propagate to the caller. No registry borrow is held
//! while a listener runs.

use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::delegate::resolve_matches;
use crate::registry::{Record, Registry};
use crate::specifier::{EventSpec, Namespaces};
use crate::table::{EventTable, EventTraits};
use crate::types::{Event, EventTree, Outcome, Phase};

/// Dispatch `spec` at `target`.
///
/// Returns the node at whose level propagation was halted, or `None` if the
/// walk completed (or never started because the target or specifier was rejected).
pub(crate) fn dispatch<T: EventTree, D>(
    registry: &RefCell<Registry<T::Node, D>>,
    table: &EventTable,
    tree: &T,
    target: T::Node,
    spec: &EventSpec,
    detail: Option<&D>,
) -> Option<T::Node> {
    if !spec.is_valid() {
        tracing::trace!(?target, %spec, "ignoring namespace-only trigger");
        return None;
    }
    if !tree.is_element(target) {
        tracing::trace!(?target, %spec, "ignoring trigger on non-element");
        return None;
    }
    let name = spec.name();
    let traits = table.traits(name);
    if traits.contains(EventTraits::NATIVE) && tree.native_action(target, name) {
        tracing::debug!(?target, name, "ran native triggerer");
    }

    let namespace: String = spec.namespaces().canonical();
    let walk = Walk {
        registry,
        tree,
        name,
        query: spec.namespaces(),
        namespace: &namespace,
        target,
        bubbles: !traits.contains(EventTraits::NON_BUBBLING),
        detail,
    };
    tracing::trace!(?target, %spec, bubbles = walk.bubbles, "dispatch");

    if walk.level(target, Phase::Target) {
        return Some(target);
    }
    if !walk.bubbles {
        return None;
    }
    let mut current = tree.parent(target);
    while let Some(node) = current {
        // Non-elements are passed through without receiving dispatch.
        if tree.is_element(node) && walk.level(node, Phase::Bubble) {
            return Some(node);
        }
        current = tree.parent(node);
    }
    None
}

struct Walk<'a, T: EventTree, D> {
    registry: &'a RefCell<Registry<T::Node, D>>,
    tree: &'a T,
    name: &'a str,
    query: &'a Namespaces,
    namespace: &'a str,
    target: T::Node,
    bubbles: bool,
    detail: Option<&'a D>,
}

impl<T: EventTree, D> Walk<'_, T, D> {
    /// Run every listener at `node`'s level. Returns true if propagation must halt.
    fn level(&self, node: T::Node, phase: Phase) -> bool {
        let snapshot = self.registry.borrow().snapshot(node, self.name);
        let mut halt = false;
        let satisfied = snapshot
            .iter()
            .filter(|record| record.namespaces.contains_all(self.query));
        if phase == Phase::Target {
            for record in satisfied {
                halt |= self.run_record(node, record, phase);
            }
            return halt;
        }
        let (direct, delegated): (Vec<_>, Vec<_>) =
            satisfied.partition(|record| record.selector.is_none());
        for record in direct.into_iter().chain(delegated) {
            halt |= self.run_record(node, record, phase);
        }
        halt
    }

    /// Invoke `record` once if it is direct, or once per delegated match.
    fn run_record(&self, node: T::Node, record: &Record<T::Node, D>, phase: Phase) -> bool {
        let Some(selector) = record.selector.as_deref() else {
            return self.invoke(node, record, node, phase);
        };
        let mut halt = false;
        for matched in resolve_matches(self.tree, node, self.target, selector) {
            halt |= self.invoke(node, record, matched, phase);
        }
        halt
    }

    fn invoke(
        &self,
        holder: T::Node,
        record: &Record<T::Node, D>,
        current_target: T::Node,
        phase: Phase,
    ) -> bool {
        if record.one_shot {
            let claimed = self.registry.borrow_mut().claim(holder, self.name, record);
            if !claimed {
                return false;
            }
        }
        let mut event = Event {
            name: self.name,
            namespace: self.namespace,
            listener_namespace: &record.declared_namespace,
            target: self.target,
            current_target,
            delegate_target: holder,
            phase,
            bubbles: self.bubbles,
            data: record.data.as_ref(),
            detail: self.detail,
            propagation_stopped: false,
        };
        let outcome = record.handler.call(&mut event);
        outcome == Outcome::Stop || event.propagation_stopped
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::testing::Fixture;
    use crate::{Events, Handler, Listen, Outcome, Phase};

    type Log = Rc<RefCell<Vec<(&'static str, usize, usize, Phase)>>>;

    /// Handler that logs (label, current_target, delegate_target, phase) and returns `outcome`.
    fn logger(log: &Log, label: &'static str, outcome: Outcome) -> Handler<usize> {
        let log = log.clone();
        Handler::new(move |ev| {
            let entry = (label, ev.current_target(), ev.delegate_target(), ev.phase());
            log.borrow_mut().push(entry);
            outcome
        })
    }

    /// Attach a direct listener on `node` that logs under `label`.
    fn direct(events: &Events<usize>, log: &Log, node: usize, label: &'static str, out: Outcome) {
        let h = logger(log, label, out);
        events.attach(node, "foo", Listen::new(), Some(&h), false);
    }

    fn labels(log: &Log) -> Vec<&'static str> {
        log.borrow().iter().map(|e| e.0).collect()
    }

    #[test]
    fn target_then_ancestors_in_order() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        direct(&events, &log, f.html, "html", Outcome::Continue);
        direct(&events, &log, f.event, "event", Outcome::Continue);
        direct(&events, &log, f.parent, "parent", Outcome::Continue);

        assert_eq!(events.dispatch(&f, f.child, "foo", None), None);
        assert_eq!(
            *log.borrow(),
            vec![
                ("event", f.event, f.event, Phase::Bubble),
                ("parent", f.parent, f.parent, Phase::Bubble),
                ("html", f.html, f.html, Phase::Bubble),
            ]
        );
    }

    #[test]
    fn stop_finishes_the_level_then_halts() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        direct(&events, &log, f.parent, "p1", Outcome::Stop);
        direct(&events, &log, f.parent, "p2", Outcome::Stop);
        direct(&events, &log, f.event, "e1", Outcome::Stop);
        direct(&events, &log, f.event, "e2", Outcome::Continue);

        assert_eq!(events.dispatch(&f, f.event, "foo", None), Some(f.event));
        assert_eq!(labels(&log), ["e1", "e2"]);
    }

    #[test]
    fn stop_propagation_on_event_halts_too() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let stopper: Handler<usize> = Handler::new(|ev| {
            ev.stop_propagation();
            Outcome::Continue
        });
        events.attach(f.event, "foo", Listen::new(), Some(&stopper), false);
        direct(&events, &log, f.parent, "parent", Outcome::Continue);
        assert_eq!(events.dispatch(&f, f.event, "foo", None), Some(f.event));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn direct_listeners_run_before_delegated_ones_at_a_level() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let delegated = logger(&log, "delegated", Outcome::Continue);
        let plain = logger(&log, "direct", Outcome::Continue);
        let opts = Listen::new().delegate(".event");
        events.attach(f.parent, "click", opts, Some(&delegated), false);
        events.attach(f.parent, "click", Listen::new(), Some(&plain), false);

        events.dispatch(&f, f.grandchild, "click", None);
        assert_eq!(
            *log.borrow(),
            vec![
                ("direct", f.parent, f.parent, Phase::Bubble),
                ("delegated", f.event, f.parent, Phase::Bubble),
            ]
        );
    }

    #[test]
    fn delegated_listener_fires_once_per_matching_node() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let h = logger(&log, "div", Outcome::Continue);
        let opts = Listen::new().delegate("div");
        events.attach(f.parent, "click", opts, Some(&h), false);

        events.dispatch(&f, f.grandchild, "click", None);
        let targets: Vec<_> = log.borrow().iter().map(|e| e.1).collect();
        // `.parent` is itself a div, so it matches last.
        assert_eq!(targets, [f.grandchild, f.child, f.event, f.parent]);
    }

    #[test]
    fn delegated_listener_on_matching_target_is_invoked() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let matching = logger(&log, "self", Outcome::Continue);
        let other = logger(&log, "other", Outcome::Continue);
        let own = Listen::new().delegate(".event");
        let below = Listen::new().delegate(".child");
        events.attach(f.event, "foo", own, Some(&matching), false);
        events.attach(f.event, "foo", below, Some(&other), false);

        events.dispatch(&f, f.event, "foo", None);
        let expected = vec![("self", f.event, f.event, Phase::Target)];
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn target_level_keeps_registration_order_across_delegation() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let delegated = logger(&log, "delegated", Outcome::Continue);
        direct(&events, &log, f.event, "first", Outcome::Continue);
        let opts = Listen::new().delegate(".event");
        events.attach(f.event, "foo", opts, Some(&delegated), false);
        direct(&events, &log, f.event, "last", Outcome::Continue);

        events.dispatch(&f, f.event, "foo", None);
        assert_eq!(labels(&log), ["first", "delegated", "last"]);
    }

    #[test]
    fn non_bubbling_names_stay_at_target() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let on_parent = logger(&log, "parent", Outcome::Continue);
        let on_input = logger(&log, "input", Outcome::Continue);
        for name in ["focus", "blur", "mouseenter", "mouseleave"] {
            events.attach(f.parent, name, Listen::new(), Some(&on_parent), false);
            events.attach(f.input, name, Listen::new(), Some(&on_input), false);
            events.dispatch(&f, f.input, name, None);
        }
        assert_eq!(labels(&log), ["input"; 4]);
    }

    #[test]
    fn native_triggerer_runs_before_listeners() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let seen = order.clone();
        let natives = f.native_calls.clone();
        let h: Handler<usize> = Handler::observe(move |_| {
            seen.borrow_mut().push(natives.borrow().len());
        });
        events.attach(f.input, "focus", Listen::new(), Some(&h), false);
        events.dispatch(&f, f.input, "focus", None);
        // The listener saw the native call already recorded.
        assert_eq!(*order.borrow(), [1]);
        assert_eq!(
            f.native_calls.borrow().as_slice(),
            &[(f.input, String::from("focus"))]
        );
    }

    #[test]
    fn native_triggerer_only_for_native_names() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        events.dispatch(&f, f.input, "click", None);
        events.dispatch(&f, f.event, "focus", None);
        // `event` has no native focus, but the host is still asked.
        assert_eq!(
            f.native_calls.borrow().as_slice(),
            &[(f.event, String::from("focus"))]
        );
    }

    #[test]
    fn non_element_ancestors_are_skipped() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        direct(&events, &log, f.document, "document", Outcome::Continue);
        direct(&events, &log, f.html, "html", Outcome::Continue);
        events.dispatch(&f, f.event, "foo", None);
        assert_eq!(labels(&log), ["html"]);
    }

    #[test]
    fn detach_during_dispatch_does_not_disturb_the_level() {
        let f = Rc::new(Fixture::cash());
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let later = logger(&log, "later", Outcome::Continue);
        let remover = {
            let events = events.clone();
            let event = f.event;
            Handler::observe(move |_| {
                events.detach_all(event);
            })
        };
        events.attach(f.event, "foo", Listen::new(), Some(&remover), false);
        events.attach(f.event, "foo", Listen::new(), Some(&later), false);

        events.dispatch(&*f, f.event, "foo", None);
        // The snapshot still ran the later listener.
        assert_eq!(log.borrow().len(), 1);
        events.dispatch(&*f, f.event, "foo", None);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn attach_during_dispatch_takes_effect_next_time() {
        let f = Fixture::cash();
        let events: Events<usize> = Events::new();
        let log = Log::default();
        let added = logger(&log, "added", Outcome::Continue);
        let adder = {
            let events = events.clone();
            let event = f.event;
            Handler::observe(move |_| {
                events.attach(event, "foo", Listen::new(), Some(&added), false);
            })
        };
        events.attach(f.event, "foo", Listen::new(), Some(&adder), true);

        events.dispatch(&f, f.event, "foo", None);
        assert!(log.borrow().is_empty());
        events.dispatch(&f, f.event, "foo", None);
        assert_eq!(log.borrow().len(), 1);
    }
}
