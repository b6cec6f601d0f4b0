// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event specifiers: bare names and namespace tags.
//!
//! A specifier is written `name.ns1.ns2`. The bare name is everything before the
//! first `.`; the remaining `.`-separated tokens form the namespace set.
//!
//! - Empty tokens are dropped (`foo..ns` has the single namespace `ns`).
//! - Duplicate tokens collapse.
//! - Declaration order is kept for display, but matching is order-independent.
//!
//! A specifier with an empty bare name (for example `.ns1`) parses, but it is
//! never registered or triggered; it is only meaningful as a removal query.
//!
//! ```
//! use understory_delegate::specifier::EventSpec;
//!
//! let listener = EventSpec::parse("foo.ns2.ns1");
//! let query = EventSpec::parse("foo.ns1");
//! assert_eq!(listener.name(), "foo");
//! assert_eq!(listener.namespaces().declared(), "ns2.ns1");
//! assert_eq!(listener.namespaces().canonical(), "ns1.ns2");
//! assert!(listener.namespaces().contains_all(query.namespaces()));
//! ```

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

/// Delimiter between the bare name and each namespace tag.
pub const NAMESPACE_DELIMITER: char = '.';

/// An order-independent set of namespace tags that remembers declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespaces {
    tags: SmallVec<[Box<str>; 2]>,
}

impl Namespaces {
    /// Collect tags, dropping empty tokens and duplicates.
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out = Self::default();
        for tag in tags {
            if !tag.is_empty() && !out.contains(tag) {
                out.tags.push(tag.into());
            }
        }
        out
    }

    /// Returns true if no tags are present.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Tags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(|t| &**t)
    }

    /// Returns true if `tag` is present.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| &**t == tag)
    }

    /// Subset test: every tag of `query` is present in `self`.
    ///
    /// An empty query is satisfied by any set.
    pub fn contains_all(&self, query: &Self) -> bool {
        query.iter().all(|tag| self.contains(tag))
    }

    /// Tags joined with `.` in declaration order.
    pub fn declared(&self) -> String {
        join(self.iter())
    }

    /// Tags joined with `.` in sorted order; equal sets yield equal strings.
    pub fn canonical(&self) -> String {
        let mut sorted: Vec<&str> = self.iter().collect();
        sorted.sort_unstable();
        join(sorted)
    }
}

fn join<'a>(tags: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, tag) in tags.into_iter().enumerate() {
        if i > 0 {
            out.push(NAMESPACE_DELIMITER);
        }
        out.push_str(tag);
    }
    out
}

/// `true` iff every tag of `query` is present in `candidate`.
///
/// This is the single rule used both for triggering (query = trigger namespaces,
/// candidate = listener namespaces) and for removal.
pub fn matches(candidate: &Namespaces, query: &Namespaces) -> bool {
    candidate.contains_all(query)
}

/// A parsed event specifier: bare name plus namespaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSpec {
    name: Box<str>,
    namespaces: Namespaces,
}

impl EventSpec {
    /// Parse a single specifier such as `click` or `click.menu.item`.
    pub fn parse(specifier: &str) -> Self {
        let mut parts = specifier.split(NAMESPACE_DELIMITER);
        let name = parts.next().unwrap_or_default();
        Self {
            name: name.into(),
            namespaces: Namespaces::from_tags(parts),
        }
    }

    /// Parse a whitespace-separated list of specifiers, keeping their order.
    ///
    /// ```
    /// use understory_delegate::specifier::EventSpec;
    ///
    /// let names: Vec<_> = EventSpec::parse_list("foo  bar.ns1")
    ///     .map(|s| s.name().to_owned())
    ///     .collect();
    /// assert_eq!(names, ["foo", "bar"]);
    /// ```
    pub fn parse_list(specifiers: &str) -> impl Iterator<Item = Self> + '_ {
        specifiers.split_whitespace().map(Self::parse)
    }

    /// The bare event name (may be empty for namespace-only specifiers).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace set.
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// A specifier can be registered or triggered only if its bare name is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Display for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for tag in self.namespaces.iter() {
            write!(f, "{NAMESPACE_DELIMITER}{tag}")?;
        }
        Ok(())
    }
}
