// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document tree: node identifiers, flags, and node payloads.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use smallvec::SmallVec;

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Per-element interaction flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Element can receive focus through its native `focus` action.
        const FOCUSABLE = 0b0000_0001;
        /// Element is disabled; native actions are refused.
        const DISABLED  = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Element payload: tag name, id, class list, attributes, and flags.
///
/// Tag names are compared case-insensitively and stored lowercased.
///
/// ```rust
/// use understory_dom_tree::ElementData;
///
/// let input = ElementData::new("INPUT").with_class("event-focus").focusable();
/// assert_eq!(input.tag(), "input");
/// assert!(input.has_class("event-focus"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementData {
    tag: Box<str>,
    id: Option<Box<str>>,
    classes: SmallVec<[Box<str>; 2]>,
    attributes: Vec<(Box<str>, Box<str>)>,
    /// Interaction flags.
    pub flags: NodeFlags,
}

impl ElementData {
    /// Create an element payload with the given tag name.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase().into_boxed_str(),
            ..Self::default()
        }
    }

    /// Set the element id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one or more whitespace-separated classes; duplicates are ignored.
    pub fn with_class(mut self, classes: &str) -> Self {
        for class in classes.split_ascii_whitespace() {
            if !self.has_class(class) {
                self.classes.push(class.into());
            }
        }
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| &**n == name) {
            slot.1 = value.into();
        } else {
            self.attributes.push((name.into(), value.into()));
        }
        self
    }

    /// Mark the element as focusable.
    pub fn focusable(mut self) -> Self {
        self.flags |= NodeFlags::FOCUSABLE;
        self
    }

    /// Lowercased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Element id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Class list in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &str> + '_ {
        self.classes.iter().map(|c| &**c)
    }

    /// Returns true if the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| &**c == class)
    }

    /// Attribute value, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| &**v)
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Exactly one per tree; never an element.
    Document,
    /// An element.
    Element(ElementData),
    /// A text node.
    Text(String),
    /// A comment node.
    Comment(String),
}

impl NodeKind {
    /// Returns the element payload for element nodes.
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }
}
