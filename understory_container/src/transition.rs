// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition protocol: context, coordinator, animators, and interactors.
//!
//! ## Overview
//!
//! Each transition started by a [`Container`](crate::container::Container) gets one
//! [`TransitionContext`] and one [`TransitionCoordinator`].
//!
//! - The context describes the transition (source, destination, region bounds),
//!   tracks interactive progress and cancellation, and carries the completion that
//!   hands control back to the container. The completion fires exactly once.
//! - The coordinator couples the context with the [`Animator`] and the optional
//!   [`Interactor`] driving it, and lets observers run work alongside the transition
//!   or react when an interactive gesture ends.
//!
//! ## Writing an animator
//!
//! An animator mounts the destination's view into the region, animates however it
//! likes, and finally calls [`TransitionContext::complete_transition`] with
//! `!context.transition_was_cancelled()`. The container removes the losing screen's
//! view afterwards; the animator does not have to.
//!
//! ```
//! use core::time::Duration;
//! use understory_container::transition::{Animator, TransitionContext};
//! use understory_container::types::Screen;
//!
//! struct Instant;
//!
//! impl<S: Screen + ?Sized> Animator<S> for Instant {
//!     fn duration(&self, _context: &TransitionContext<S>) -> Duration {
//!         Duration::ZERO
//!     }
//!
//!     fn animate(&self, context: &TransitionContext<S>) {
//!         context.destination().mount_view(context.final_frame());
//!         context.complete_transition(!context.transition_was_cancelled());
//!     }
//! }
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::time::Duration;

use kurbo::Rect;

use crate::types::Screen;

/// Observer callback receiving the transition context.
pub type ContextCallback<S> = Box<dyn FnOnce(&TransitionContext<S>)>;

type Completion<S> = Box<dyn FnOnce(&TransitionContext<S>, bool)>;

/// Runs the visual part of a transition.
pub trait Animator<S: ?Sized> {
    /// How long the animation takes.
    fn duration(&self, context: &TransitionContext<S>) -> Duration;

    /// Start animating. Must eventually call [`TransitionContext::complete_transition`]
    /// exactly once; the container stays transitioning until it does.
    fn animate(&self, context: &TransitionContext<S>);
}

/// Drives a transition incrementally, e.g. from a drag gesture.
pub trait Interactor<S: ?Sized> {
    /// Whether the next transition should start interactively.
    ///
    /// When this returns `false` the container calls the animator directly.
    fn wants_interactive_start(&self) -> bool {
        true
    }

    /// Take over the transition.
    ///
    /// The interactor reports progress with
    /// [`update_interactive_transition`](TransitionContext::update_interactive_transition),
    /// ends the interaction with
    /// [`finish_interactive_transition`](TransitionContext::finish_interactive_transition) or
    /// [`cancel_interactive_transition`](TransitionContext::cancel_interactive_transition),
    /// and eventually (directly or through `animator`) calls
    /// [`complete_transition`](TransitionContext::complete_transition).
    fn start_interactive_transition(
        &self,
        context: &TransitionContext<S>,
        animator: Rc<dyn Animator<S>>,
    );
}

/// Animator used when the delegate supplies none: an instantaneous swap.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultAnimator;

impl<S: Screen + ?Sized> Animator<S> for DefaultAnimator {
    fn duration(&self, _context: &TransitionContext<S>) -> Duration {
        Duration::ZERO
    }

    fn animate(&self, context: &TransitionContext<S>) {
        context.destination().mount_view(context.final_frame());
        context.complete_transition(!context.transition_was_cancelled());
    }
}

struct ContextInner<S: ?Sized> {
    source: Rc<S>,
    destination: Rc<S>,
    bounds: Rect,
    animated: Cell<bool>,
    interactive: Cell<bool>,
    interaction_ended: Cell<bool>,
    cancelled: Cell<bool>,
    completed: Cell<bool>,
    percent_complete: Cell<f64>,
    completion: RefCell<Option<Completion<S>>>,
    interaction_observers: RefCell<Vec<ContextCallback<S>>>,
}

/// Handle describing one in-flight transition.
///
/// Cloning produces another handle to the same transition, so animators and
/// interactors can keep it until they finish.
pub struct TransitionContext<S: ?Sized> {
    inner: Rc<ContextInner<S>>,
}

impl<S: ?Sized> Clone for TransitionContext<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: ?Sized> core::fmt::Debug for TransitionContext<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransitionContext")
            .field("bounds", &self.inner.bounds)
            .field("animated", &self.inner.animated.get())
            .field("interactive", &self.inner.interactive.get())
            .field("cancelled", &self.inner.cancelled.get())
            .field("completed", &self.inner.completed.get())
            .field("percent_complete", &self.inner.percent_complete.get())
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> TransitionContext<S> {
    /// Create a context for a transition from `source` to `destination` within a
    /// region of the given bounds.
    ///
    /// Containers create their own contexts; this is public so animators can be
    /// exercised in isolation.
    pub fn new(source: Rc<S>, destination: Rc<S>, bounds: Rect) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                source,
                destination,
                bounds,
                animated: Cell::new(true),
                interactive: Cell::new(false),
                interaction_ended: Cell::new(false),
                cancelled: Cell::new(false),
                completed: Cell::new(false),
                percent_complete: Cell::new(0.0),
                completion: RefCell::new(None),
                interaction_observers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn set_completion(&self, completion: Completion<S>) {
        *self.inner.completion.borrow_mut() = Some(completion);
    }

    pub(crate) fn set_animated(&self, animated: bool) {
        self.inner.animated.set(animated);
    }

    pub(crate) fn set_interactive(&self, interactive: bool) {
        self.inner.interactive.set(interactive);
    }

    /// The screen being transitioned away from.
    pub fn source(&self) -> &Rc<S> {
        &self.inner.source
    }

    /// The screen being transitioned to.
    pub fn destination(&self) -> &Rc<S> {
        &self.inner.destination
    }

    /// Bounds of the container region.
    pub fn container_bounds(&self) -> Rect {
        self.inner.bounds
    }

    /// Frame of the source before the transition: the region bounds.
    pub fn initial_frame(&self) -> Rect {
        self.inner.bounds
    }

    /// Frame the destination should occupy once the transition completes: the region bounds.
    pub fn final_frame(&self) -> Rect {
        self.inner.bounds
    }

    /// Whether the transition is expected to animate.
    ///
    /// Interactive transitions are animated. Otherwise this is set when the animator is
    /// dispatched, and is `false` for animators reporting a zero duration.
    pub fn is_animated(&self) -> bool {
        self.inner.animated.get()
    }

    /// Whether an interactor is driving the transition.
    pub fn is_interactive(&self) -> bool {
        self.inner.interactive.get()
    }

    /// Whether the interactor cancelled the transition.
    pub fn transition_was_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Whether [`complete_transition`](Self::complete_transition) has been called.
    pub fn is_completed(&self) -> bool {
        self.inner.completed.get()
    }

    /// Progress last reported by the interactor, in `0.0..=1.0`.
    pub fn percent_complete(&self) -> f64 {
        self.inner.percent_complete.get()
    }

    /// Report interactive progress. Values are clamped to `0.0..=1.0`; NaN is ignored.
    pub fn update_interactive_transition(&self, percent: f64) {
        if percent.is_nan() {
            return;
        }
        self.inner.percent_complete.set(percent.clamp(0.0, 1.0));
    }

    /// End the interaction, keeping the transition.
    pub fn finish_interactive_transition(&self) {
        self.end_interaction();
    }

    /// End the interaction and mark the transition cancelled.
    ///
    /// The container reverts to the source once the transition completes.
    pub fn cancel_interactive_transition(&self) {
        self.inner.cancelled.set(true);
        self.end_interaction();
    }

    /// Hand control back to the container.
    ///
    /// `finished` is forwarded to the caller's completion; whether the destination
    /// is kept depends only on [`transition_was_cancelled`](Self::transition_was_cancelled).
    /// Only the first call has an effect.
    pub fn complete_transition(&self, finished: bool) {
        if self.inner.completed.replace(true) {
            log::warn!("transition completed more than once; ignoring");
            return;
        }
        let completion = self.inner.completion.borrow_mut().take();
        if let Some(completion) = completion {
            completion(self, finished);
        }
    }

    fn end_interaction(&self) {
        if !self.is_interactive() || self.inner.interaction_ended.replace(true) {
            return;
        }
        let observers = core::mem::take(&mut *self.inner.interaction_observers.borrow_mut());
        for observer in observers {
            observer(self);
        }
    }

    fn on_interaction_end(&self, handler: ContextCallback<S>) {
        if !self.is_interactive() {
            return;
        }
        if self.inner.interaction_ended.get() {
            handler(self);
        } else {
            self.inner.interaction_observers.borrow_mut().push(handler);
        }
    }
}

/// Couples a [`TransitionContext`] with the animator and interactor driving it.
///
/// Available from
/// [`Container::transition_coordinator`](crate::container::Container::transition_coordinator)
/// while a transition is in flight.
pub struct TransitionCoordinator<S: ?Sized> {
    context: TransitionContext<S>,
    animator: Rc<dyn Animator<S>>,
    interactor: Option<Rc<dyn Interactor<S>>>,
    started: Cell<bool>,
    finished: Cell<bool>,
    alongside: RefCell<Vec<ContextCallback<S>>>,
    completions: RefCell<Vec<ContextCallback<S>>>,
}

impl<S: ?Sized> core::fmt::Debug for TransitionCoordinator<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransitionCoordinator")
            .field("context", &self.context)
            .field("interactive", &self.interactor.is_some())
            .field("started", &self.started.get())
            .field("finished", &self.finished.get())
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> TransitionCoordinator<S> {
    pub(crate) fn new(
        context: TransitionContext<S>,
        animator: Rc<dyn Animator<S>>,
        interactor: Option<Rc<dyn Interactor<S>>>,
    ) -> Self {
        Self {
            context,
            animator,
            interactor,
            started: Cell::new(false),
            finished: Cell::new(false),
            alongside: RefCell::new(Vec::new()),
            completions: RefCell::new(Vec::new()),
        }
    }

    /// The transition's context.
    pub fn context(&self) -> &TransitionContext<S> {
        &self.context
    }

    /// The animator running the transition.
    pub fn animator(&self) -> &Rc<dyn Animator<S>> {
        &self.animator
    }

    /// The interactor, if the delegate supplied one.
    pub fn interactor(&self) -> Option<&Rc<dyn Interactor<S>>> {
        self.interactor.as_ref()
    }

    /// Whether the transition is driven interactively.
    pub fn is_interactive(&self) -> bool {
        self.context.is_interactive()
    }

    /// Run `animation` alongside the transition and `completion` after it finalizes.
    ///
    /// `animation` runs when the animator starts, or right away if it already has.
    /// `completion` runs right away if the transition has already finalized.
    pub fn animate_alongside(
        &self,
        animation: impl FnOnce(&TransitionContext<S>) + 'static,
        completion: Option<ContextCallback<S>>,
    ) where
        S: 'static,
    {
        if self.started.get() {
            animation(&self.context);
        } else {
            self.alongside.borrow_mut().push(Box::new(animation));
        }
        if let Some(completion) = completion {
            if self.finished.get() {
                completion(&self.context);
            } else {
                self.completions.borrow_mut().push(completion);
            }
        }
    }

    /// Call `handler` when the interactive part of the transition ends.
    ///
    /// Runs right away if it has already ended. Never runs for non-interactive
    /// transitions.
    pub fn notify_when_interaction_ends(
        &self,
        handler: impl FnOnce(&TransitionContext<S>) + 'static,
    ) where
        S: 'static,
    {
        self.context.on_interaction_end(Box::new(handler));
    }

    /// Hand the transition to the interactor, or to the animator when there is no
    /// interactor or it declines an interactive start.
    pub(crate) fn dispatch(&self) {
        self.start();
        match &self.interactor {
            Some(interactor) if interactor.wants_interactive_start() => {
                self.context.set_interactive(true);
                interactor.start_interactive_transition(&self.context, Rc::clone(&self.animator));
            }
            _ => {
                let timed = !self.animator.duration(&self.context).is_zero();
                self.context.set_animated(timed);
                self.animator.animate(&self.context);
            }
        }
    }

    fn start(&self) {
        self.started.set(true);
        let pending = core::mem::take(&mut *self.alongside.borrow_mut());
        for animation in pending {
            animation(&self.context);
        }
    }

    pub(crate) fn finish(&self) {
        self.finished.set(true);
        let pending = core::mem::take(&mut *self.completions.borrow_mut());
        for completion in pending {
            completion(&self.context);
        }
    }
}
