// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-name event traits: whether a name bubbles and whether it has a native triggerer.
//!
//! The table is consulted once per trigger call. Names absent from the table
//! bubble and have no native triggerer.
//!
//! ```
//! use understory_delegate::table::{EventTable, EventTraits};
//!
//! let table = EventTable::default().with("submit", EventTraits::NATIVE);
//! assert!(!table.bubbles("focus"));
//! assert!(table.is_native("focus"));
//! assert!(table.bubbles("submit") && table.is_native("submit"));
//! assert!(table.bubbles("click") && !table.is_native("click"));
//! ```

use alloc::boxed::Box;

use hashbrown::HashMap;

bitflags::bitflags! {
    /// Traits of an event name.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventTraits: u8 {
        /// Dispatch stops after the target phase, regardless of listener outcomes.
        const NON_BUBBLING = 0b0000_0001;
        /// The host may expose a native triggerer for this name (see
        /// [`EventTree::native_action`](crate::types::EventTree::native_action)).
        const NATIVE       = 0b0000_0010;
    }
}

/// Names that never bubble and have no native triggerer in the default table.
pub const NON_BUBBLING_NAMES: [&str; 4] =
    ["mouseenter", "mouseleave", "pointerenter", "pointerleave"];

/// Names with a native triggerer in the default table. They do not bubble either.
pub const NATIVE_FOCUS_NAMES: [&str; 2] = ["focus", "blur"];

/// Lookup table from bare event name to [`EventTraits`].
#[derive(Clone, Debug)]
pub struct EventTable {
    entries: HashMap<Box<str>, EventTraits>,
}

impl Default for EventTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for name in NATIVE_FOCUS_NAMES {
            table = table.with(name, EventTraits::NATIVE | EventTraits::NON_BUBBLING);
        }
        for name in NON_BUBBLING_NAMES {
            table = table.with(name, EventTraits::NON_BUBBLING);
        }
        table
    }
}

impl EventTable {
    /// A table where every name bubbles and none is native.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Set the traits for `name`, replacing any previous entry.
    pub fn with(mut self, name: &str, traits: EventTraits) -> Self {
        self.entries.insert(name.into(), traits);
        self
    }

    /// Traits for `name`; empty if the name is not listed.
    pub fn traits(&self, name: &str) -> EventTraits {
        self.entries.get(name).copied().unwrap_or_default()
    }

    /// Whether `name` enters the bubble phase.
    pub fn bubbles(&self, name: &str) -> bool {
        !self.traits(name).contains(EventTraits::NON_BUBBLING)
    }

    /// Whether `name` has a native triggerer.
    pub fn is_native(&self, name: &str) -> bool {
        self.traits(name).contains(EventTraits::NATIVE)
    }
}
