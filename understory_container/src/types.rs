// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the container: child identifiers, children, and the screen protocol.
//!
//! ## Overview
//!
//! A [`Child`] pairs a stable [`ChildId`] with a shared handle to a [`Screen`].
//! Identity of a child is its identifier alone; the screen handle is carried along
//! but never consulted for equality or hashing.
//! These types are stored by the [`registry`](crate::registry) and moved between
//! visible and hidden by the [`Container`](crate::container::Container).

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::string::String;
use core::hash::{Hash, Hasher};

use kurbo::Rect;

/// Stable key identifying a child.
///
/// Two identifiers are equal when their strings are equal.
///
/// ```
/// use understory_container::types::ChildId;
///
/// const HOME: ChildId = ChildId::new("home");
/// assert_eq!(HOME, ChildId::from("home"));
/// assert_ne!(HOME, ChildId::from(String::from("settings")));
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ChildId(Cow<'static, str>);

impl ChildId {
    /// Create an identifier from a static string.
    pub const fn new(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// The identifier's string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ChildId {
    fn from(id: &'static str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChildId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl core::fmt::Display for ChildId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle hooks of a child screen, called by the container.
///
/// The container never renders. It tells the screen when it is about to appear or
/// disappear, when it joins or leaves the container's child hierarchy, and (on a
/// first load only) where to mount its view. During animated transitions the
/// [`Animator`](crate::transition::Animator) is responsible for mounting the
/// destination's view.
///
/// All methods take `&self`; screens are shared handles owned by the host's UI tree
/// and use interior mutability for their own state.
///
/// Call order, per transition from `a` to `b`:
/// 1. `a.begin_appearance_transition(false, ..)`, `b.begin_appearance_transition(true, ..)`
/// 2. `b.attach_to_parent()`
/// 3. on success: `a.will_detach_from_parent()`, `a.unmount_view()`, `a.detach_from_parent()`;
///    on cancel the same three calls go to `b` instead
/// 4. `b.end_appearance_transition()`, `a.end_appearance_transition()`
pub trait Screen {
    /// The screen is about to appear (`appearing == true`) or disappear.
    fn begin_appearance_transition(&self, appearing: bool, animated: bool);

    /// The appearance change started by the last
    /// [`begin_appearance_transition`](Self::begin_appearance_transition) is over.
    fn end_appearance_transition(&self);

    /// The screen was added to the container's child hierarchy.
    fn attach_to_parent(&self) {}

    /// The screen is about to be removed from the container's child hierarchy.
    fn will_detach_from_parent(&self) {}

    /// The screen was removed from the container's child hierarchy.
    fn detach_from_parent(&self) {}

    /// Insert the screen's visual representation into the container region at `frame`.
    fn mount_view(&self, _frame: Rect) {}

    /// Remove the screen's visual representation from wherever it is mounted.
    fn unmount_view(&self) {}
}

/// A keyed child screen.
///
/// Equality and hashing depend only on [`Child::id`]: two children with the same
/// identifier and different screens compare equal. Inserting two such children
/// into one registry is unsupported unless the registry uses
/// [`InsertionPolicy::PrependUnique`](crate::registry::InsertionPolicy::PrependUnique).
///
/// ```
/// use std::rc::Rc;
/// use understory_container::types::{Child, Screen};
///
/// struct Blank;
/// impl Screen for Blank {
///     fn begin_appearance_transition(&self, _appearing: bool, _animated: bool) {}
///     fn end_appearance_transition(&self) {}
/// }
///
/// let a = Child::new("a", Rc::new(Blank));
/// let also_a = Child::new("a", Rc::new(Blank));
/// assert_eq!(a, also_a);
/// assert!(!Rc::ptr_eq(a.screen(), also_a.screen()));
/// ```
pub struct Child<S: ?Sized = dyn Screen> {
    id: ChildId,
    screen: Rc<S>,
}

impl<S: ?Sized> Child<S> {
    /// Create a child from an identifier and a screen handle.
    pub fn new(id: impl Into<ChildId>, screen: Rc<S>) -> Self {
        Self {
            id: id.into(),
            screen,
        }
    }

    /// The child's identifier.
    pub fn id(&self) -> &ChildId {
        &self.id
    }

    /// The child's screen handle.
    pub fn screen(&self) -> &Rc<S> {
        &self.screen
    }

    /// Whether this child holds exactly `screen` (handle identity, not value equality).
    pub fn holds(&self, screen: &Rc<S>) -> bool {
        Rc::ptr_eq(&self.screen, screen)
    }
}

impl<S: ?Sized> Clone for Child<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            screen: Rc::clone(&self.screen),
        }
    }
}

impl<S: ?Sized> PartialEq for Child<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S: ?Sized> Eq for Child<S> {}

impl<S: ?Sized> Hash for Child<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<S: ?Sized> core::fmt::Debug for Child<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Child")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::BuildHasher;

    struct Blank;
    impl Screen for Blank {
        fn begin_appearance_transition(&self, _appearing: bool, _animated: bool) {}
        fn end_appearance_transition(&self) {}
    }

    // FNV-1a, enough to compare hashes without std's RandomState.
    struct Fnv(u64);
    impl Default for Fnv {
        fn default() -> Self {
            Self(0xcbf2_9ce4_8422_2325)
        }
    }
    impl Hasher for Fnv {
        fn finish(&self) -> u64 {
            self.0
        }
        fn write(&mut self, bytes: &[u8]) {
            for b in bytes {
                self.0 ^= u64::from(*b);
                self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
            }
        }
    }

    struct FnvBuild;
    impl BuildHasher for FnvBuild {
        type Hasher = Fnv;
        fn build_hasher(&self) -> Fnv {
            Fnv::default()
        }
    }

    #[test]
    fn ids_from_same_string_are_equal_and_hash_equal() {
        let a = ChildId::new("a");
        let b = ChildId::from(String::from("a"));
        assert_eq!(a, b);
        assert_eq!(FnvBuild.hash_one(&a), FnvBuild.hash_one(&b));
    }

    #[test]
    fn ids_from_different_strings_differ() {
        let a = ChildId::new("a");
        let b = ChildId::new("b");
        assert_ne!(a, b);
        assert_ne!(FnvBuild.hash_one(&a), FnvBuild.hash_one(&b));
    }

    #[test]
    fn child_identity_is_its_id() {
        let screen: Rc<Blank> = Rc::new(Blank);
        let a = Child::new("a", Rc::clone(&screen));
        let a_other_screen = Child::new("a", Rc::new(Blank));
        let b_same_screen = Child::new("b", screen);

        assert_eq!(a, a_other_screen);
        assert_eq!(FnvBuild.hash_one(&a), FnvBuild.hash_one(&a_other_screen));
        assert_ne!(a, b_same_screen);
    }

    #[test]
    fn holds_compares_handles_not_ids() {
        let screen: Rc<Blank> = Rc::new(Blank);
        let a = Child::new("a", Rc::clone(&screen));
        assert!(a.holds(&screen));
        assert!(!a.holds(&Rc::new(Blank)));
    }

    #[test]
    fn trait_object_children() {
        let a: Child = Child::new("a", Rc::new(Blank) as Rc<dyn Screen>);
        assert_eq!(a.id().as_str(), "a");
    }
}
