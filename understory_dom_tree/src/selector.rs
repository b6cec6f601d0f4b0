// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector parsing and matching.
//!
//! Supported grammar:
//!
//! - Compound selectors: `*`, `tag`, `.class`, `#id`, `[attr]`, `[attr=value]` (value may be quoted).
//! - Combinators: descendant (whitespace) and child (`>`).
//! - Selector lists separated by `,`.
//!
//! Pseudo-classes and sibling combinators are not supported and fail to parse.

use alloc::boxed::Box;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::types::ElementData;

/// Error returned by [`Selector::parse`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The input was empty or only whitespace.
    #[error("selector is empty")]
    Empty,
    /// A character that cannot start or continue a selector.
    #[error("unexpected character {found:?} at byte {at}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Byte offset in the input.
        at: usize,
    },
    /// The input ended where a name or value was required.
    #[error("unexpected end of selector at byte {at}")]
    UnexpectedEnd {
        /// Byte offset in the input.
        at: usize,
    },
    /// A combinator with nothing on its right-hand side.
    #[error("combinator at byte {at} has no selector after it")]
    DanglingCombinator {
        /// Byte offset of the combinator.
        at: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<Box<str>>,
    ids: SmallVec<[Box<str>; 1]>,
    classes: SmallVec<[Box<str>; 2]>,
    attributes: SmallVec<[(Box<str>, Option<Box<str>>); 1]>,
}

impl Compound {
    fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag
            && **tag != *el.tag()
        {
            return false;
        }
        self.ids.iter().all(|id| el.id() == Some(&**id))
            && self.classes.iter().all(|c| el.has_class(c))
            && self
                .attributes
                .iter()
                .all(|(name, value)| match (el.attribute(name), value) {
                    (Some(_), None) => true,
                    (Some(actual), Some(expected)) => actual == &**expected,
                    (None, _) => false,
                })
    }
}

/// One comma-separated alternative: compounds left to right, joined by combinators.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

/// A parsed selector list.
///
/// ```rust
/// use understory_dom_tree::Selector;
///
/// assert!(Selector::parse(".parent > .event, input[type=text]").is_ok());
/// assert!(Selector::parse("div >").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut p = Parser { src: input, pos: 0 };
        let mut alternatives = Vec::new();
        loop {
            p.skip_ws();
            alternatives.push(p.complex()?);
            p.skip_ws();
            match p.peek() {
                None => break,
                Some(',') => p.bump(),
                Some(found) => return Err(SelectorError::UnexpectedChar { found, at: p.pos }),
            }
        }
        Ok(Self { alternatives })
    }

    /// Match against an element, consulting `ancestors` for combinators.
    ///
    /// `ancestors` yields the element payloads of the node's element ancestors, nearest first.
    pub(crate) fn matches_with<'a, A>(&self, el: &ElementData, ancestors: A) -> bool
    where
        A: Fn() -> Vec<&'a ElementData>,
    {
        self.alternatives.iter().any(|complex| {
            let last = complex.compounds.len() - 1;
            if !complex.compounds[last].matches(el) {
                return false;
            }
            if last == 0 {
                return true;
            }
            let chain = ancestors();
            matches_ancestors(complex, last, &chain)
        })
    }
}

/// Match `compounds[..i]` against `chain` (nearest ancestor first), given that
/// `compounds[i]` already matched the element just below `chain[0]`.
fn matches_ancestors(complex: &Complex, i: usize, chain: &[&ElementData]) -> bool {
    let want = i - 1;
    match complex.combinators[want] {
        Combinator::Child => {
            let Some(parent) = chain.first() else {
                return false;
            };
            complex.compounds[want].matches(parent)
                && (want == 0 || matches_ancestors(complex, want, &chain[1..]))
        }
        Combinator::Descendant => (0..chain.len()).any(|k| {
            complex.compounds[want].matches(chain[k])
                && (want == 0 || matches_ancestors(complex, want, &chain[k + 1..]))
        }),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace; returns true if any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::UnexpectedChar {
                found,
                at: self.pos,
            },
            None => SelectorError::UnexpectedEnd { at: self.pos },
        }
    }

    fn name(&mut self) -> Result<Box<str>, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        Ok(self.src[start..self.pos].into())
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = alloc::vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let at = self.pos;
            let combinator = match self.peek() {
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                None | Some(',') => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if matches!(self.peek(), None | Some(',')) {
                return Err(SelectorError::DanglingCombinator { at });
            }
            compounds.push(self.compound()?);
            combinators.push(combinator);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => self.bump(),
            Some(c) if is_name_char(c) => {
                compound.tag = Some(self.name()?.to_ascii_lowercase().into_boxed_str());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.name()?);
                }
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.name()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<(Box<str>, Option<Box<str>>), SelectorError> {
        self.skip_ws();
        let name = self.name()?;
        self.skip_ws();
        let value = if self.peek() == Some('=') {
            self.bump();
            self.skip_ws();
            let value = match self.peek() {
                Some(quote @ ('"' | '\'')) => {
                    self.bump();
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != quote) {
                        self.bump();
                    }
                    if self.peek().is_none() {
                        return Err(self.unexpected());
                    }
                    let value: Box<str> = self.src[start..self.pos].into();
                    self.bump();
                    value
                }
                _ => self.name()?,
            };
            self.skip_ws();
            Some(value)
        } else {
            None
        };
        if self.peek() != Some(']') {
            return Err(self.unexpected());
        }
        self.bump();
        Ok((name, value))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn el(tag: &str, classes: &str) -> ElementData {
        ElementData::new(tag).with_class(classes)
    }

    #[test]
    fn compound_requires_every_part() {
        let sel = Selector::parse("div.a.b#main[role=button]").unwrap();
        let full = el("div", "a b")
            .with_id("main")
            .with_attribute("role", "button");
        assert!(sel.matches_with(&full, Vec::new));
        let missing_class = el("div", "a").with_id("main").with_attribute("role", "button");
        assert!(!sel.matches_with(&missing_class, Vec::new));
        let wrong_value = el("div", "a b")
            .with_id("main")
            .with_attribute("role", "link");
        assert!(!sel.matches_with(&wrong_value, Vec::new));
    }

    #[test]
    fn tags_are_case_insensitive() {
        let sel = Selector::parse("INPUT").unwrap();
        assert!(sel.matches_with(&el("input", ""), Vec::new));
    }

    #[test]
    fn list_matches_any_alternative() {
        let sel = Selector::parse(".x, .y").unwrap();
        assert!(sel.matches_with(&el("div", "y"), Vec::new));
        assert!(!sel.matches_with(&el("div", "z"), Vec::new));
    }

    #[test]
    fn descendant_skips_intermediate_ancestors() {
        let sel = Selector::parse(".parent .child").unwrap();
        let child = el("div", "child");
        let event = el("div", "event");
        let parent = el("div", "parent");
        assert!(sel.matches_with(&child, || vec![&event, &parent]));
        assert!(!sel.matches_with(&child, || vec![&event]));
    }

    #[test]
    fn child_requires_direct_parent() {
        let sel = Selector::parse(".parent > .child").unwrap();
        let child = el("div", "child");
        let event = el("div", "event");
        let parent = el("div", "parent");
        assert!(!sel.matches_with(&child, || vec![&event, &parent]));
        assert!(sel.matches_with(&child, || vec![&parent]));
    }

    #[test]
    fn mixed_combinators_backtrack() {
        // `.a > .b .c`: some ancestor `.b` of `.c` whose parent is `.a`.
        let sel = Selector::parse(".a > .b .c").unwrap();
        let c = el("span", "c");
        let inner_b = el("div", "b");
        let outer_b = el("div", "b");
        let a = el("div", "a");
        assert!(sel.matches_with(&c, || vec![&inner_b, &outer_b, &a]));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert_eq!(
            Selector::parse("div >"),
            Err(SelectorError::DanglingCombinator { at: 4 })
        );
        assert_eq!(
            Selector::parse(".a:hover"),
            Err(SelectorError::UnexpectedChar { found: ':', at: 2 })
        );
        assert_eq!(
            Selector::parse("[type=\"text"),
            Err(SelectorError::UnexpectedEnd { at: 11 })
        );
        assert!(Selector::parse(".").is_err());
        assert!(Selector::parse("a,,b").is_err());
    }
}
