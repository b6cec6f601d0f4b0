// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegation resolver.
//!
//! A delegated listener registered on node `R` with selector `S` fires once for
//! every element on the path from the dispatch target up to and including `R`
//! that matches `S`. Matches are reported nearest first, and each becomes the
//! `current_target` of its invocation.

use smallvec::SmallVec;

use crate::types::EventTree;

/// Matched descendants for one delegated registration, nearest first.
pub type Matches<N> = SmallVec<[N; 4]>;

/// Walk from `target` up to `registered` (inclusive) collecting elements that match `selector`.
///
/// Returns no matches when `target` is neither `registered` nor one of its
/// descendants. Non-element nodes on the path are skipped but do not end the walk.
///
/// ```
/// use understory_delegate::delegate::resolve_matches;
/// use understory_delegate::EventTree;
///
/// // 0 <- 1 <- 2 <- 3, where odd nodes match ".odd".
/// struct Chain;
/// impl EventTree for Chain {
///     type Node = u32;
///     fn parent(&self, n: u32) -> Option<u32> { n.checked_sub(1) }
///     fn is_element(&self, _: u32) -> bool { true }
///     fn matches(&self, n: u32, sel: &str) -> bool { sel == ".odd" && n % 2 == 1 }
/// }
///
/// assert_eq!(resolve_matches(&Chain, 0, 3, ".odd").as_slice(), &[3, 1]);
/// assert_eq!(resolve_matches(&Chain, 1, 1, ".odd").as_slice(), &[1]);
/// assert!(resolve_matches(&Chain, 2, 2, ".odd").is_empty());
/// ```
pub fn resolve_matches<T: EventTree>(
    tree: &T,
    registered: T::Node,
    target: T::Node,
    selector: &str,
) -> Matches<T::Node> {
    let mut matches = Matches::new();
    let mut current = Some(target);
    while let Some(node) = current {
        if tree.is_element(node) && tree.matches(node, selector) {
            matches.push(node);
        }
        if node == registered {
            return matches;
        }
        current = tree.parent(node);
    }
    // Ran off the root without meeting `registered`: not a descendant.
    Matches::new()
}
