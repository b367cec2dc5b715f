// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child registry: the ordered collection of children and its insertion policy.
//!
//! ## Overview
//!
//! [`ChildRegistry`] owns the children a container may show. Order is defined by
//! the active [`InsertionPolicy`], not by insertion time.
//! Lookups return the first match in the current order; absence is `None`.
//!
//! ## Identity
//!
//! Children are equal when their identifiers are equal (see [`Child`]).
//! [`ChildRegistry::find_by_screen`] is the one lookup that compares screen
//! handles by identity instead.
//!
//! ## Minimal example
//!
//! ```
//! use std::rc::Rc;
//! use understory_container::registry::{ChildRegistry, InsertionPolicy, TraversalDirection};
//! use understory_container::types::{Child, Screen};
//!
//! struct Blank;
//! impl Screen for Blank {
//!     fn begin_appearance_transition(&self, _appearing: bool, _animated: bool) {}
//!     fn end_appearance_transition(&self) {}
//! }
//!
//! let mut registry = ChildRegistry::with_policy(
//!     Vec::new(),
//!     InsertionPolicy::sorted(|a: &Child<Blank>, b: &Child<Blank>| a.id().cmp(b.id())),
//! );
//! registry.insert(Child::new("b", Rc::new(Blank)));
//! registry.insert(Child::new("a", Rc::new(Blank)));
//!
//! let a = registry.first().unwrap().clone();
//! assert_eq!(a.id().as_str(), "a");
//! let next = registry.neighbor(TraversalDirection::Following, &a).unwrap();
//! assert_eq!(next.id().as_str(), "b");
//! ```

use alloc::collections::BTreeSet;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::types::{Child, ChildId};

/// Comparator carried by [`InsertionPolicy::Sorted`].
pub type ChildOrder<S> = Rc<dyn Fn(&Child<S>, &Child<S>) -> Ordering>;

/// Strategy carried by [`InsertionPolicy::Custom`].
pub type InsertWith<S> = Rc<dyn Fn(Vec<Child<S>>, Child<S>) -> Vec<Child<S>>>;

/// How a registry computes its new order when a child is inserted.
///
/// Applied by [`ChildRegistry::insert`].
pub enum InsertionPolicy<S: ?Sized> {
    /// Insert at the front. Does not deduplicate.
    Prepend,
    /// Insert at the front, then drop any later entry sharing the new child's identifier.
    PrependUnique,
    /// Append, then stable-sort by the comparator.
    Sorted(ChildOrder<S>),
    /// Arbitrary strategy over `(existing, new)`.
    Custom(InsertWith<S>),
}

impl<S: ?Sized> InsertionPolicy<S> {
    /// Sorted insertion with the given comparator.
    pub fn sorted(cmp: impl Fn(&Child<S>, &Child<S>) -> Ordering + 'static) -> Self {
        Self::Sorted(Rc::new(cmp))
    }

    /// Custom insertion strategy.
    pub fn custom(f: impl Fn(Vec<Child<S>>, Child<S>) -> Vec<Child<S>> + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Compute the collection that results from inserting `new` into `existing`.
    pub fn apply(&self, existing: Vec<Child<S>>, new: Child<S>) -> Vec<Child<S>> {
        match self {
            Self::Prepend => prepend(existing, new),
            Self::PrependUnique => {
                let mut out = prepend(existing, new);
                let mut seen: BTreeSet<ChildId> = BTreeSet::new();
                out.retain(|c| seen.insert(c.id().clone()));
                out
            }
            Self::Sorted(cmp) => {
                let mut out = existing;
                out.push(new);
                // `sort_by` is stable.
                out.sort_by(|a, b| cmp(a, b));
                out
            }
            Self::Custom(f) => f(existing, new),
        }
    }
}

fn prepend<S: ?Sized>(mut existing: Vec<Child<S>>, new: Child<S>) -> Vec<Child<S>> {
    existing.insert(0, new);
    existing
}

impl<S: ?Sized> Default for InsertionPolicy<S> {
    fn default() -> Self {
        Self::Prepend
    }
}

impl<S: ?Sized> Clone for InsertionPolicy<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Prepend => Self::Prepend,
            Self::PrependUnique => Self::PrependUnique,
            Self::Sorted(cmp) => Self::Sorted(Rc::clone(cmp)),
            Self::Custom(f) => Self::Custom(Rc::clone(f)),
        }
    }
}

impl<S: ?Sized> core::fmt::Debug for InsertionPolicy<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Prepend => f.write_str("Prepend"),
            Self::PrependUnique => f.write_str("PrependUnique"),
            Self::Sorted(_) => f.write_str("Sorted(..)"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Direction for [`ChildRegistry::neighbor`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TraversalDirection {
    /// The child after `from` in registry order.
    Following,
    /// The child before `from` in registry order.
    Preceding,
}

impl TraversalDirection {
    /// Find the neighbor of `from` in `children`.
    ///
    /// Returns `None` when `from` is absent (by identifier) or the neighbor would fall
    /// outside the collection.
    pub fn neighbor<'a, S: ?Sized>(
        self,
        children: &'a [Child<S>],
        from: &Child<S>,
    ) -> Option<&'a Child<S>> {
        let idx = children.iter().position(|c| c == from)?;
        let target = match self {
            Self::Following => idx.checked_add(1)?,
            Self::Preceding => idx.checked_sub(1)?,
        };
        children.get(target)
    }
}

/// Ordered collection of children with a pluggable [`InsertionPolicy`].
///
/// Mutated only through [`insert`](Self::insert), [`remove`](Self::remove) and
/// [`remove_where`](Self::remove_where).
pub struct ChildRegistry<S: ?Sized> {
    children: Vec<Child<S>>,
    insertion_policy: InsertionPolicy<S>,
}

impl<S: ?Sized> Default for ChildRegistry<S> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<S: ?Sized> core::fmt::Debug for ChildRegistry<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChildRegistry")
            .field("children", &self.children)
            .field("insertion_policy", &self.insertion_policy)
            .finish()
    }
}

impl<S: ?Sized> ChildRegistry<S> {
    /// Create a registry holding `children` in the given order, with the default policy.
    pub fn new(children: Vec<Child<S>>) -> Self {
        Self::with_policy(children, InsertionPolicy::default())
    }

    /// Create a registry holding `children` in the given order.
    ///
    /// The initial order is taken as is; the policy applies to later inserts only.
    pub fn with_policy(children: Vec<Child<S>>, insertion_policy: InsertionPolicy<S>) -> Self {
        Self {
            children,
            insertion_policy,
        }
    }

    /// The children in registry order.
    pub fn children(&self) -> &[Child<S>] {
        &self.children
    }

    /// Iterate children in registry order.
    pub fn iter(&self) -> core::slice::Iter<'_, Child<S>> {
        self.children.iter()
    }

    /// The first child, if any.
    pub fn first(&self) -> Option<&Child<S>> {
        self.children.first()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The active insertion policy.
    pub fn insertion_policy(&self) -> &InsertionPolicy<S> {
        &self.insertion_policy
    }

    /// Replace the insertion policy. Existing children are not reordered.
    pub fn set_insertion_policy(&mut self, policy: InsertionPolicy<S>) {
        self.insertion_policy = policy;
    }

    /// Whether a child with the same identifier is present.
    pub fn contains(&self, child: &Child<S>) -> bool {
        self.children.contains(child)
    }

    /// First child with identifier `id`.
    pub fn find(&self, id: &ChildId) -> Option<&Child<S>> {
        self.find_where(|c| c.id() == id)
    }

    /// First child holding exactly `screen`, compared by handle identity.
    pub fn find_by_screen(&self, screen: &Rc<S>) -> Option<&Child<S>> {
        self.find_where(|c| c.holds(screen))
    }

    /// First child matching `predicate`.
    pub fn find_where(&self, predicate: impl FnMut(&&Child<S>) -> bool) -> Option<&Child<S>> {
        self.children.iter().find(predicate)
    }

    /// The neighbor of `child` in `direction`; see [`TraversalDirection::neighbor`].
    pub fn neighbor(&self, direction: TraversalDirection, child: &Child<S>) -> Option<&Child<S>> {
        direction.neighbor(&self.children, child)
    }

    /// Index of the first child equal to `child`.
    pub fn index_of(&self, child: &Child<S>) -> Option<usize> {
        self.index_where(|c| c == child)
    }

    /// Index of the first child matching `predicate`.
    pub fn index_where(&self, predicate: impl FnMut(&Child<S>) -> bool) -> Option<usize> {
        self.children.iter().position(predicate)
    }

    /// Insert `child` according to the insertion policy.
    pub fn insert(&mut self, child: Child<S>) {
        log::trace!(
            "inserting child {} with {:?}",
            child.id(),
            self.insertion_policy
        );
        let existing = core::mem::take(&mut self.children);
        self.children = self.insertion_policy.apply(existing, child);
    }

    /// Remove every child sharing `child`'s identifier.
    pub fn remove(&mut self, child: &Child<S>) {
        let id = child.id().clone();
        self.remove_where(|c| *c.id() == id);
    }

    /// Remove every child matching `predicate`.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Child<S>) -> bool) {
        let before = self.children.len();
        self.children.retain(|c| !predicate(c));
        log::trace!("removed {} children", before - self.children.len());
    }
}
