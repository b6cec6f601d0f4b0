// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to integrate with other Understory crates.
//!
//! Each adapter is gated behind a feature flag so the engine stays dependency-light by default.
//!
//! ## Available Adapters
//!
//! - [`dom_tree`] (`dom_tree_adapter` feature): implements [`EventTree`](crate::EventTree) for
//!   [`understory_dom_tree::Tree`], with native `focus`/`blur` triggerers and selector-based
//!   [`Selection`](crate::Selection) construction.

#[cfg(feature = "dom_tree_adapter")]
pub mod dom_tree;
