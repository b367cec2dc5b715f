// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Post-transition policies: registry cleanup after each finished transition.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::registry::ChildRegistry;
use crate::types::{Child, ChildId};

/// Strategy carried by [`PostTransitionPolicy::Custom`].
pub type AfterTransition<S> = Rc<dyn Fn(&mut ChildRegistry<S>, &Child<S>)>;

/// What a [`Container`](crate::container::Container) does to its registry after a
/// transition finishes.
///
/// Runs right after the visible child is updated and before the delegate hears
/// [`did_finish_transitioning`](crate::container::ContainerDelegate::did_finish_transitioning).
pub enum PostTransitionPolicy<S: ?Sized> {
    /// Leave the registry alone.
    None,
    /// Remove every child other than the visible one, except those listed.
    RemoveAllNonVisible {
        /// Identifiers kept regardless of visibility.
        except: Vec<ChildId>,
    },
    /// Arbitrary cleanup given the registry and the visible child.
    Custom(AfterTransition<S>),
}

impl<S: ?Sized> PostTransitionPolicy<S> {
    /// Keep only the visible child.
    pub fn remove_all_non_visible() -> Self {
        Self::RemoveAllNonVisible { except: Vec::new() }
    }

    /// Keep the visible child and the children with the given identifiers.
    pub fn remove_all_non_visible_except(except: impl IntoIterator<Item = ChildId>) -> Self {
        Self::RemoveAllNonVisible {
            except: except.into_iter().collect(),
        }
    }

    /// Custom cleanup.
    pub fn custom(f: impl Fn(&mut ChildRegistry<S>, &Child<S>) + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }

    /// Run the policy against `registry` with `visible` as the visible child.
    pub fn apply(&self, registry: &mut ChildRegistry<S>, visible: &Child<S>) {
        match self {
            Self::None => {}
            Self::RemoveAllNonVisible { except } => {
                log::trace!("evicting non-visible children around {}", visible.id());
                registry.remove_where(|c| c != visible && !except.contains(c.id()));
            }
            Self::Custom(f) => f(registry, visible),
        }
    }
}

impl<S: ?Sized> Default for PostTransitionPolicy<S> {
    fn default() -> Self {
        Self::None
    }
}

impl<S: ?Sized> Clone for PostTransitionPolicy<S> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::RemoveAllNonVisible { except } => Self::RemoveAllNonVisible {
                except: except.clone(),
            },
            Self::Custom(f) => Self::Custom(Rc::clone(f)),
        }
    }
}

impl<S: ?Sized> core::fmt::Debug for PostTransitionPolicy<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::RemoveAllNonVisible { except } => f
                .debug_struct("RemoveAllNonVisible")
                .field("except", except)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
