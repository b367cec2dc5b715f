// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_container --heading-base-level=0

//! Understory Container: a `no_std` host for keyed child screens and the transitions between them.
//!
//! ## Overview
//!
//! A [`Container`](crate::container::Container) keeps an ordered registry of [`Child`](crate::types::Child) screens
//! and shows at most one of them at a time.
//! Moving from the visible child to another is a transition: the container validates the request, tells both
//! screens what is about to happen, hands the visual work to an animator, and cleans up once that work reports back.
//! It does not render anything itself.
//!
//! ## Pieces
//!
//! - [`types`]: [`ChildId`](crate::types::ChildId), [`Child`](crate::types::Child) and the [`Screen`](crate::types::Screen) hooks.
//! - [`registry`]: [`ChildRegistry`](crate::registry::ChildRegistry) with its pluggable
//!   [`InsertionPolicy`](crate::registry::InsertionPolicy) and neighbor lookup.
//! - [`transition`]: [`TransitionContext`](crate::transition::TransitionContext),
//!   [`TransitionCoordinator`](crate::transition::TransitionCoordinator), and the
//!   [`Animator`](crate::transition::Animator) / [`Interactor`](crate::transition::Interactor) traits.
//! - [`policy`]: [`PostTransitionPolicy`](crate::policy::PostTransitionPolicy), registry cleanup after each transition.
//! - [`container`]: the [`Container`](crate::container::Container) state machine and its
//!   [`ContainerDelegate`](crate::container::ContainerDelegate).
//!
//! ## Workflow
//!
//! 1) Build a container with its initial children and, optionally, a delegate and policies.
//! 2) Call [`surface_ready`](crate::container::Container::surface_ready) once the host region exists.
//!    The first child is mounted immediately, with no animation and no delegate hooks.
//! 3) Request transitions with [`transition_to`](crate::container::Container::transition_to) or
//!    [`transition_to_id`](crate::container::Container::transition_to_id).
//!    The delegate can veto, supply an animator or an interactor, and observe the begin and finish of each transition.
//! 4) An interactor drives progress with
//!    [`update_interactive_transition`](crate::transition::TransitionContext::update_interactive_transition),
//!    then finishes or cancels, then completes the context.
//!
//! ## Threading
//!
//! Everything here is single-threaded: children share screens through `Rc`, and the container and its
//! collaborators call each other re-entrantly through `&self`.
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use kurbo::Rect;
//! use understory_container::container::{Container, ContainerDelegate};
//! use understory_container::types::{Child, ChildId, Screen};
//!
//! struct Page;
//! impl Screen for Page {
//!     fn begin_appearance_transition(&self, _appearing: bool, _animated: bool) {}
//!     fn end_appearance_transition(&self) {}
//! }
//!
//! #[derive(Default)]
//! struct Journal(RefCell<Vec<String>>);
//! impl ContainerDelegate<Page> for Journal {
//!     fn did_finish_transitioning(
//!         &self,
//!         _container: &Container<Page>,
//!         source: &Child<Page>,
//!         destination: &Child<Page>,
//!     ) {
//!         self.0.borrow_mut().push(format!("{} -> {}", source.id(), destination.id()));
//!     }
//! }
//!
//! let journal = Rc::new(Journal::default());
//! let container = Container::with_children(vec![
//!     Child::new("inbox", Rc::new(Page)),
//!     Child::new("outbox", Rc::new(Page)),
//! ]);
//! container.set_delegate(&journal);
//! container.surface_ready(Rect::new(0.0, 0.0, 800.0, 600.0));
//!
//! let finished = Rc::new(RefCell::new(None));
//! let seen = Rc::clone(&finished);
//! container.transition_to_id(
//!     &ChildId::new("outbox"),
//!     Some(Box::new(move |ok| *seen.borrow_mut() = Some(ok))),
//! );
//!
//! assert_eq!(*finished.borrow(), Some(true));
//! assert_eq!(journal.0.borrow().as_slice(), ["inbox -> outbox"]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod container;
pub mod policy;
pub mod registry;
pub mod transition;
pub mod types;
