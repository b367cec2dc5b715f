// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container: the transition state machine.
//!
//! ## Overview
//!
//! A [`Container`] owns a [`ChildRegistry`] and shows at most one child at a time.
//! Hosts request transitions; the container validates them, prepares both screens,
//! hands the visual work to an [`Animator`] (or an [`Interactor`]) and finalizes
//! once the [`TransitionContext`] completes.
//!
//! ## Phases
//!
//! [`TransitionPhase::Idle`] → [`Preparing`](TransitionPhase::Preparing) →
//! [`Animating`](TransitionPhase::Animating) → [`Finalizing`](TransitionPhase::Finalizing) → `Idle`.
//! Requests made while not idle are dropped.
//!
//! ## Request outcomes
//!
//! | situation                          | completion          |
//! |------------------------------------|---------------------|
//! | surface not ready                  | not called          |
//! | another transition in flight       | not called          |
//! | destination already visible        | `true`, immediately |
//! | nothing visible yet (first load)   | `true`, immediately |
//! | delegate vetoes                    | `false`             |
//! | transition finishes                | value passed to [`TransitionContext::complete_transition`] |
//!
//! ## Callback order for a transition from `a` to `b`
//!
//! 1. [`ContainerDelegate::should_transition`]
//! 2. `a` begins disappearing, `b` begins appearing, `b` attaches
//! 3. animator or interactor is dispatched
//! 4. [`ContainerDelegate::did_begin_transitioning`]
//! 5. once the context completes: the loser detaches, the visible child updates,
//!    `b` then `a` end their appearance transitions
//! 6. [`PostTransitionPolicy`], alongside completions,
//!    [`ContainerDelegate::did_finish_transitioning`], then the caller's completion
//!
//! Step 5 never runs before step 4, even when the animator completes synchronously.
//!
//! ## Minimal example
//!
//! ```
//! use std::rc::Rc;
//! use kurbo::Rect;
//! use understory_container::container::Container;
//! use understory_container::types::{Child, ChildId, Screen};
//!
//! struct Page;
//! impl Screen for Page {
//!     fn begin_appearance_transition(&self, _appearing: bool, _animated: bool) {}
//!     fn end_appearance_transition(&self) {}
//! }
//!
//! let container: Container<Page> = Container::with_children(vec![
//!     Child::new("home", Rc::new(Page)),
//!     Child::new("settings", Rc::new(Page)),
//! ]);
//! container.surface_ready(Rect::new(0.0, 0.0, 320.0, 480.0));
//! assert_eq!(container.visible_child().unwrap().id().as_str(), "home");
//!
//! container.transition_to_id(&ChildId::new("settings"), None);
//! assert_eq!(container.visible_child().unwrap().id().as_str(), "settings");
//! assert!(!container.is_transitioning());
//! ```

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell, RefMut};

use kurbo::Rect;

use crate::policy::PostTransitionPolicy;
use crate::registry::{ChildRegistry, InsertionPolicy};
use crate::transition::{
    Animator, DefaultAnimator, Interactor, TransitionContext, TransitionCoordinator,
};
use crate::types::{Child, ChildId, Screen};

/// Caller completion for a transition request; receives whether it finished.
pub type Completion = Box<dyn FnOnce(bool)>;

type Finalizer<S> = Box<dyn FnOnce(&Container<S>)>;

/// Where a container is in its transition lifecycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TransitionPhase {
    /// No transition in flight.
    #[default]
    Idle,
    /// Appearance signals issued, destination being attached.
    Preparing,
    /// The animator or interactor owns the transition.
    Animating,
    /// Children are being detached and the visible child updated.
    Finalizing,
}

/// Optional hooks a host uses to customize and observe transitions.
///
/// Every method has a default, so implementors override only what they need.
/// Each receives the container so it can consult the registry or the
/// [current coordinator](Container::transition_coordinator).
/// None of these hooks run for the first-load mount.
pub trait ContainerDelegate<S: ?Sized> {
    /// Animator for a transition. `None` selects [`DefaultAnimator`].
    fn animator_for(
        &self,
        _container: &Container<S>,
        _source: &Child<S>,
        _destination: &Child<S>,
    ) -> Option<Rc<dyn Animator<S>>> {
        None
    }

    /// Interactor for a transition. `None` means the animator runs directly.
    fn interactor_for(
        &self,
        _container: &Container<S>,
        _source: &Child<S>,
        _destination: &Child<S>,
    ) -> Option<Rc<dyn Interactor<S>>> {
        None
    }

    /// Whether the transition may proceed. Defaults to `true`.
    fn should_transition(
        &self,
        _container: &Container<S>,
        _source: &Child<S>,
        _destination: &Child<S>,
    ) -> bool {
        true
    }

    /// The transition has been handed to the animator or interactor.
    ///
    /// This is not a completion signal.
    fn did_begin_transitioning(
        &self,
        _container: &Container<S>,
        _source: &Child<S>,
        _destination: &Child<S>,
    ) {
    }

    /// The transition has been finalized, successfully or not.
    fn did_finish_transitioning(
        &self,
        _container: &Container<S>,
        _source: &Child<S>,
        _destination: &Child<S>,
    ) {
    }
}

struct Shared<S: ?Sized> {
    registry: RefCell<ChildRegistry<S>>,
    visible: RefCell<Option<Child<S>>>,
    phase: Cell<TransitionPhase>,
    ready: Cell<bool>,
    bounds: Cell<Rect>,
    auto_transition_on_ready: Cell<bool>,
    post_transition_policy: RefCell<PostTransitionPolicy<S>>,
    delegate: RefCell<Option<Weak<dyn ContainerDelegate<S>>>>,
    coordinator: RefCell<Option<Rc<TransitionCoordinator<S>>>>,
    // Set while the animator or interactor is being dispatched; a completion
    // arriving then is parked in `deferred` until `did_begin_transitioning` ran.
    dispatching: Cell<bool>,
    deferred: RefCell<Option<Finalizer<S>>>,
}

/// Hosts keyed child screens and moves between them.
///
/// All methods take `&self`: delegates, animators and observers may call back into
/// the container while it runs. The container never holds a borrow of its own
/// state while collaborator code runs, but guards returned by
/// [`registry`](Self::registry) and [`registry_mut`](Self::registry_mut) must
/// be dropped before requesting or completing a transition.
pub struct Container<S: ?Sized = dyn Screen> {
    shared: Rc<Shared<S>>,
}

impl<S: ?Sized> core::fmt::Debug for Container<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Container")
            .field("visible", &self.shared.visible.try_borrow().ok())
            .field("phase", &self.shared.phase.get())
            .field("ready", &self.shared.ready.get())
            .field("bounds", &self.shared.bounds.get())
            .finish_non_exhaustive()
    }
}

impl<S: Screen + ?Sized + 'static> Default for Container<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Screen + ?Sized + 'static> Container<S> {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::with_children(Vec::new())
    }

    /// Create a container whose registry holds `children` in the given order.
    pub fn with_children(children: Vec<Child<S>>) -> Self {
        Self {
            shared: Rc::new(Shared {
                registry: RefCell::new(ChildRegistry::new(children)),
                visible: RefCell::new(None),
                phase: Cell::new(TransitionPhase::Idle),
                ready: Cell::new(false),
                bounds: Cell::new(Rect::ZERO),
                auto_transition_on_ready: Cell::new(true),
                post_transition_policy: RefCell::new(PostTransitionPolicy::None),
                delegate: RefCell::new(None),
                coordinator: RefCell::new(None),
                dispatching: Cell::new(false),
                deferred: RefCell::new(None),
            }),
        }
    }

    // Configuration.

    /// Read access to the registry.
    pub fn registry(&self) -> Ref<'_, ChildRegistry<S>> {
        self.shared.registry.borrow()
    }

    /// Write access to the registry.
    ///
    /// Removing the visible child from the registry does not hide it.
    pub fn registry_mut(&self) -> RefMut<'_, ChildRegistry<S>> {
        self.shared.registry.borrow_mut()
    }

    /// The registry's insertion policy.
    pub fn insertion_policy(&self) -> InsertionPolicy<S> {
        self.registry().insertion_policy().clone()
    }

    /// Set the registry's insertion policy.
    pub fn set_insertion_policy(&self, policy: InsertionPolicy<S>) {
        self.registry_mut().set_insertion_policy(policy);
    }

    /// The policy run after each finished transition.
    pub fn post_transition_policy(&self) -> PostTransitionPolicy<S> {
        self.shared.post_transition_policy.borrow().clone()
    }

    /// Set the policy run after each finished transition. Defaults to
    /// [`PostTransitionPolicy::None`].
    pub fn set_post_transition_policy(&self, policy: PostTransitionPolicy<S>) {
        *self.shared.post_transition_policy.borrow_mut() = policy;
    }

    /// Whether [`surface_ready`](Self::surface_ready) shows the first child.
    pub fn should_auto_transition_on_ready(&self) -> bool {
        self.shared.auto_transition_on_ready.get()
    }

    /// Set whether [`surface_ready`](Self::surface_ready) shows the first child.
    /// Defaults to `true`.
    pub fn set_should_auto_transition_on_ready(&self, auto: bool) {
        self.shared.auto_transition_on_ready.set(auto);
    }

    /// Set the delegate. The container holds it weakly.
    pub fn set_delegate<D: ContainerDelegate<S> + 'static>(&self, delegate: &Rc<D>) {
        let weak: Weak<D> = Rc::downgrade(delegate);
        let weak: Weak<dyn ContainerDelegate<S>> = weak;
        *self.shared.delegate.borrow_mut() = Some(weak);
    }

    /// Remove the delegate.
    pub fn clear_delegate(&self) {
        *self.shared.delegate.borrow_mut() = None;
    }

    // Surface.

    /// Whether the host surface is ready.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.get()
    }

    /// Bounds of the container region.
    pub fn bounds(&self) -> Rect {
        self.shared.bounds.get()
    }

    /// Update the bounds of the container region.
    ///
    /// Used as the final frame of later transitions.
    pub fn set_bounds(&self, bounds: Rect) {
        self.shared.bounds.set(bounds);
    }

    /// The host surface is ready and occupies `bounds`.
    ///
    /// On the first call, shows the first registered child when
    /// [`should_auto_transition_on_ready`](Self::should_auto_transition_on_ready) is set.
    pub fn surface_ready(&self, bounds: Rect) {
        self.shared.bounds.set(bounds);
        if self.shared.ready.replace(true) {
            return;
        }
        if !self.should_auto_transition_on_ready() {
            return;
        }
        let first = self.registry().first().cloned();
        if let Some(first) = first {
            self.transition_to(first, None);
        }
    }

    // State.

    /// The visible child, if any.
    pub fn visible_child(&self) -> Option<Child<S>> {
        self.shared.visible.borrow().clone()
    }

    /// The visible child's screen, if any.
    pub fn visible_screen(&self) -> Option<Rc<S>> {
        self.shared
            .visible
            .borrow()
            .as_ref()
            .map(|c| Rc::clone(c.screen()))
    }

    /// Transition to `child`, without a completion.
    pub fn set_visible_child(&self, child: Child<S>) {
        self.transition_to(child, None);
    }

    /// Whether a transition is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.shared.phase.get() != TransitionPhase::Idle
    }

    /// The current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.shared.phase.get()
    }

    /// The coordinator of the transition in flight, if any.
    pub fn transition_coordinator(&self) -> Option<Rc<TransitionCoordinator<S>>> {
        self.shared.coordinator.borrow().clone()
    }

    // Requests.

    /// Transition to the first registered child with identifier `id`.
    ///
    /// Does nothing, and never calls `completion`, when no such child exists.
    pub fn transition_to_id(&self, id: &ChildId, completion: Option<Completion>) {
        let child = self.registry().find(id).cloned();
        match child {
            Some(child) => self.transition_to(child, completion),
            None => log::debug!("no child {id}; ignoring transition request"),
        }
    }

    /// Transition to `child`, inserting it into the registry first if absent.
    ///
    /// See the [module docs](self) for when `completion` is called.
    pub fn transition_to(&self, child: Child<S>, completion: Option<Completion>) {
        let absent = !self.registry().contains(&child);
        if absent {
            self.registry_mut().insert(child.clone());
        }
        self.perform_transition(child, completion);
    }

    fn perform_transition(&self, destination: Child<S>, completion: Option<Completion>) {
        if !self.is_ready() {
            log::warn!(
                "dropping transition to {}: surface not ready",
                destination.id()
            );
            return;
        }
        if self.is_transitioning() {
            log::warn!(
                "dropping transition to {}: already transitioning",
                destination.id()
            );
            return;
        }

        let Some(source) = self.visible_child() else {
            self.mount_first(&destination);
            finish(completion, true);
            return;
        };
        if source == destination {
            finish(completion, true);
            return;
        }

        if !self.delegate_should_transition(&source, &destination) {
            log::debug!(
                "delegate vetoed transition {} -> {}",
                source.id(),
                destination.id()
            );
            finish(completion, false);
            return;
        }

        log::debug!("transitioning {} -> {}", source.id(), destination.id());
        self.prepare(Some(&source), &destination, true);

        let context = TransitionContext::new(
            Rc::clone(source.screen()),
            Rc::clone(destination.screen()),
            self.bounds(),
        );
        let weak = Rc::downgrade(&self.shared);
        let (from, to) = (source.clone(), destination.clone());
        context.set_completion(Box::new(
            move |context: &TransitionContext<S>, finished: bool| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let container = Self { shared };
                let completed = !context.transition_was_cancelled();
                let finalize: Finalizer<S> = Box::new(move |container: &Self| {
                    container.finalize(&from, &to, completed, finished, completion);
                });
                if container.shared.dispatching.get() {
                    *container.shared.deferred.borrow_mut() = Some(finalize);
                } else {
                    finalize(&container);
                }
            },
        ));

        let animator = self.delegate_animator(&source, &destination);
        let interactor = self.delegate_interactor(&source, &destination);
        let coordinator = Rc::new(TransitionCoordinator::new(context, animator, interactor));
        *self.shared.coordinator.borrow_mut() = Some(Rc::clone(&coordinator));

        self.shared.phase.set(TransitionPhase::Animating);
        self.shared.dispatching.set(true);
        coordinator.dispatch();
        self.delegate_did_begin(&source, &destination);
        self.shared.dispatching.set(false);

        let deferred = self.shared.deferred.borrow_mut().take();
        if let Some(finalize) = deferred {
            finalize(self);
        }
    }

    /// Show `destination` when nothing is visible yet. No animator, no delegate hooks.
    fn mount_first(&self, destination: &Child<S>) {
        log::debug!("mounting first child {}", destination.id());
        self.prepare(None, destination, false);
        destination.screen().mount_view(self.bounds());
        self.finish_transitioning(None, destination, true);
    }

    fn prepare(&self, source: Option<&Child<S>>, destination: &Child<S>, animated: bool) {
        self.shared.phase.set(TransitionPhase::Preparing);
        if let Some(source) = source {
            source.screen().begin_appearance_transition(false, animated);
        }
        destination
            .screen()
            .begin_appearance_transition(true, animated);
        destination.screen().attach_to_parent();
    }

    fn finish_transitioning(
        &self,
        source: Option<&Child<S>>,
        destination: &Child<S>,
        completed: bool,
    ) {
        self.shared.phase.set(TransitionPhase::Finalizing);
        if completed {
            if let Some(source) = source {
                detach(source);
            }
            *self.shared.visible.borrow_mut() = Some(destination.clone());
        } else {
            detach(destination);
            *self.shared.visible.borrow_mut() = source.cloned();
        }

        destination.screen().end_appearance_transition();
        if let Some(source) = source {
            source.screen().end_appearance_transition();
        }

        self.shared.phase.set(TransitionPhase::Idle);
    }

    fn finalize(
        &self,
        source: &Child<S>,
        destination: &Child<S>,
        completed: bool,
        finished: bool,
        completion: Option<Completion>,
    ) {
        log::debug!(
            "finished {} -> {} ({})",
            source.id(),
            destination.id(),
            if completed { "completed" } else { "cancelled" }
        );
        self.finish_transitioning(Some(source), destination, completed);
        let coordinator = self.shared.coordinator.borrow_mut().take();

        if let Some(visible) = self.visible_child() {
            let policy = self.post_transition_policy();
            policy.apply(&mut self.registry_mut(), &visible);
        }
        if let Some(coordinator) = coordinator {
            coordinator.finish();
        }

        self.delegate_did_finish(source, destination);
        finish(completion, finished);
    }

    // Delegate dispatch, with defaults when no delegate is set.

    fn delegate(&self) -> Option<Rc<dyn ContainerDelegate<S>>> {
        self.shared.delegate.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn delegate_should_transition(&self, source: &Child<S>, destination: &Child<S>) -> bool {
        self.delegate()
            .is_none_or(|d| d.should_transition(self, source, destination))
    }

    fn delegate_animator(&self, source: &Child<S>, destination: &Child<S>) -> Rc<dyn Animator<S>> {
        self.delegate()
            .and_then(|d| d.animator_for(self, source, destination))
            .unwrap_or_else(|| Rc::new(DefaultAnimator) as Rc<dyn Animator<S>>)
    }

    fn delegate_interactor(
        &self,
        source: &Child<S>,
        destination: &Child<S>,
    ) -> Option<Rc<dyn Interactor<S>>> {
        self.delegate()
            .and_then(|d| d.interactor_for(self, source, destination))
    }

    fn delegate_did_begin(&self, source: &Child<S>, destination: &Child<S>) {
        if let Some(d) = self.delegate() {
            d.did_begin_transitioning(self, source, destination);
        }
    }

    fn delegate_did_finish(&self, source: &Child<S>, destination: &Child<S>) {
        if let Some(d) = self.delegate() {
            d.did_finish_transitioning(self, source, destination);
        }
    }
}

fn detach<S: Screen + ?Sized>(child: &Child<S>) {
    let screen = child.screen();
    screen.will_detach_from_parent();
    screen.unmount_view();
    screen.detach_from_parent();
}

fn finish(completion: Option<Completion>, finished: bool) {
    if let Some(completion) = completion {
        completion(finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    use crate::transition::ContextCallback;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 320.0, 480.0);

    #[derive(Clone, Debug, PartialEq)]
    enum Ev {
        Begin(&'static str, bool, bool),
        End(&'static str),
        Attach(&'static str),
        WillDetach(&'static str),
        Unmount(&'static str),
        Detach(&'static str),
        Mount(&'static str, Rect),
        Should(ChildId, ChildId),
        DidBegin(ChildId, ChildId),
        DidFinish(ChildId, ChildId),
        Policy(ChildId),
        Alongside,
        AlongsideDone,
        InteractionEnded,
        Done(bool),
    }

    type Log = Rc<RefCell<Vec<Ev>>>;

    struct Probe {
        name: &'static str,
        log: Log,
    }

    impl Screen for Probe {
        fn begin_appearance_transition(&self, appearing: bool, animated: bool) {
            self.log
                .borrow_mut()
                .push(Ev::Begin(self.name, appearing, animated));
        }
        fn end_appearance_transition(&self) {
            self.log.borrow_mut().push(Ev::End(self.name));
        }
        fn attach_to_parent(&self) {
            self.log.borrow_mut().push(Ev::Attach(self.name));
        }
        fn will_detach_from_parent(&self) {
            self.log.borrow_mut().push(Ev::WillDetach(self.name));
        }
        fn detach_from_parent(&self) {
            self.log.borrow_mut().push(Ev::Detach(self.name));
        }
        fn mount_view(&self, frame: Rect) {
            self.log.borrow_mut().push(Ev::Mount(self.name, frame));
        }
        fn unmount_view(&self) {
            self.log.borrow_mut().push(Ev::Unmount(self.name));
        }
    }

    fn probe(log: &Log, name: &'static str) -> Child<Probe> {
        Child::new(
            name,
            Rc::new(Probe {
                name,
                log: Rc::clone(log),
            }),
        )
    }

    fn done(log: &Log) -> Option<Completion> {
        let log = Rc::clone(log);
        Some(Box::new(move |finished| log.borrow_mut().push(Ev::Done(finished))))
    }

    #[derive(Default)]
    struct Recorder {
        log: Log,
        veto: Cell<bool>,
        animator: RefCell<Option<Rc<dyn Animator<Probe>>>>,
        interactor: RefCell<Option<Rc<dyn Interactor<Probe>>>>,
        observe_coordinator: Cell<bool>,
    }

    impl ContainerDelegate<Probe> for Recorder {
        fn animator_for(
            &self,
            _container: &Container<Probe>,
            _source: &Child<Probe>,
            _destination: &Child<Probe>,
        ) -> Option<Rc<dyn Animator<Probe>>> {
            self.animator.borrow().clone()
        }

        fn interactor_for(
            &self,
            _container: &Container<Probe>,
            _source: &Child<Probe>,
            _destination: &Child<Probe>,
        ) -> Option<Rc<dyn Interactor<Probe>>> {
            self.interactor.borrow().clone()
        }

        fn should_transition(
            &self,
            container: &Container<Probe>,
            source: &Child<Probe>,
            destination: &Child<Probe>,
        ) -> bool {
            assert!(!container.is_transitioning());
            self.log
                .borrow_mut()
                .push(Ev::Should(source.id().clone(), destination.id().clone()));
            !self.veto.get()
        }

        fn did_begin_transitioning(
            &self,
            container: &Container<Probe>,
            source: &Child<Probe>,
            destination: &Child<Probe>,
        ) {
            assert!(container.is_transitioning());
            self.log
                .borrow_mut()
                .push(Ev::DidBegin(source.id().clone(), destination.id().clone()));
            if self.observe_coordinator.get() {
                let coordinator = container.transition_coordinator().unwrap();
                let (l1, l2, l3) = (
                    Rc::clone(&self.log),
                    Rc::clone(&self.log),
                    Rc::clone(&self.log),
                );
                let after: ContextCallback<Probe> = Box::new(move |_| {
                    l2.borrow_mut().push(Ev::AlongsideDone);
                });
                coordinator.animate_alongside(
                    move |_| l1.borrow_mut().push(Ev::Alongside),
                    Some(after),
                );
                coordinator.notify_when_interaction_ends(move |_| {
                    l3.borrow_mut().push(Ev::InteractionEnded);
                });
            }
        }

        fn did_finish_transitioning(
            &self,
            container: &Container<Probe>,
            source: &Child<Probe>,
            destination: &Child<Probe>,
        ) {
            assert!(!container.is_transitioning());
            assert!(container.transition_coordinator().is_none());
            self.log
                .borrow_mut()
                .push(Ev::DidFinish(source.id().clone(), destination.id().clone()));
        }
    }

    /// Keeps the context so the test decides when the transition completes.
    #[derive(Default)]
    struct Held(RefCell<Option<TransitionContext<Probe>>>);

    impl Held {
        fn take(&self) -> TransitionContext<Probe> {
            self.0.borrow_mut().take().unwrap()
        }
    }

    impl Animator<Probe> for Held {
        fn duration(&self, _context: &TransitionContext<Probe>) -> core::time::Duration {
            core::time::Duration::from_millis(300)
        }
        fn animate(&self, context: &TransitionContext<Probe>) {
            context.destination().mount_view(context.final_frame());
            *self.0.borrow_mut() = Some(context.clone());
        }
    }

    impl Interactor<Probe> for Held {
        fn start_interactive_transition(
            &self,
            context: &TransitionContext<Probe>,
            _animator: Rc<dyn Animator<Probe>>,
        ) {
            *self.0.borrow_mut() = Some(context.clone());
        }
    }

    /// Settles the gesture right away by handing off to the animator it is given.
    struct HandOff {
        cancel: bool,
    }

    impl Interactor<Probe> for HandOff {
        fn start_interactive_transition(
            &self,
            context: &TransitionContext<Probe>,
            animator: Rc<dyn Animator<Probe>>,
        ) {
            context.update_interactive_transition(if self.cancel { 0.2 } else { 0.8 });
            if self.cancel {
                context.cancel_interactive_transition();
            } else {
                context.finish_interactive_transition();
            }
            animator.animate(context);
        }
    }

    /// Container showing `x` out of `[x, y]` (plus `extra`), with an empty log.
    fn showing_x(log: &Log, extra: &[&'static str]) -> Container<Probe> {
        let mut children = vec![probe(log, "x"), probe(log, "y")];
        children.extend(extra.iter().map(|name| probe(log, *name)));
        let container = Container::with_children(children);
        container.surface_ready(BOUNDS);
        log.borrow_mut().clear();
        container
    }

    fn visible_id(container: &Container<Probe>) -> Option<ChildId> {
        container.visible_child().map(|c| c.id().clone())
    }

    #[test]
    fn first_load_mounts_without_delegate_hooks() {
        let log: Log = Rc::default();
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            ..Default::default()
        });
        let container = Container::with_children(vec![probe(&log, "x"), probe(&log, "y")]);
        container.set_delegate(&delegate);
        assert!(container.should_auto_transition_on_ready());

        container.surface_ready(BOUNDS);

        assert_eq!(visible_id(&container), Some(ChildId::new("x")));
        assert_eq!(
            *log.borrow(),
            vec![
                Ev::Begin("x", true, false),
                Ev::Attach("x"),
                Ev::Mount("x", BOUNDS),
                Ev::End("x"),
            ]
        );
        assert_eq!(container.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn auto_transition_can_be_disabled() {
        let log: Log = Rc::default();
        let container = Container::with_children(vec![probe(&log, "x")]);
        container.set_should_auto_transition_on_ready(false);
        container.surface_ready(BOUNDS);
        assert!(container.visible_child().is_none());
        assert!(log.borrow().is_empty());
        assert!(container.is_ready());
    }

    #[test]
    fn request_before_ready_is_dropped_silently() {
        let log: Log = Rc::default();
        let container: Container<Probe> = Container::new();
        container.transition_to(probe(&log, "x"), done(&log));
        assert!(log.borrow().is_empty());
        assert!(container.visible_child().is_none());
        // The child is still registered.
        assert_eq!(container.registry().len(), 1);
    }

    #[test]
    fn first_load_reports_success() {
        let log: Log = Rc::default();
        let container: Container<Probe> = Container::new();
        container.surface_ready(BOUNDS);
        container.transition_to(probe(&log, "x"), done(&log));
        assert_eq!(visible_id(&container), Some(ChildId::new("x")));
        assert_eq!(log.borrow().last(), Some(&Ev::Done(true)));
    }

    #[test]
    fn already_visible_completes_true_without_side_effects() {
        let log: Log = Rc::default();
        let container = showing_x(&log, &[]);
        let x = container.visible_child().unwrap();
        container.transition_to(x, done(&log));
        assert_eq!(*log.borrow(), vec![Ev::Done(true)]);
    }

    #[test]
    fn normal_transition_order() {
        let log: Log = Rc::default();
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            ..Default::default()
        });
        let container = showing_x(&log, &[]);
        container.set_delegate(&delegate);

        container.transition_to_id(&ChildId::new("y"), done(&log));

        let (x, y) = (ChildId::new("x"), ChildId::new("y"));
        assert_eq!(
            *log.borrow(),
            vec![
                Ev::Should(x.clone(), y.clone()),
                Ev::Begin("x", false, true),
                Ev::Begin("y", true, true),
                Ev::Attach("y"),
                Ev::Mount("y", BOUNDS),
                Ev::DidBegin(x.clone(), y.clone()),
                Ev::WillDetach("x"),
                Ev::Unmount("x"),
                Ev::Detach("x"),
                Ev::End("y"),
                Ev::End("x"),
                Ev::DidFinish(x, y),
                Ev::Done(true),
            ]
        );
        assert_eq!(visible_id(&container), Some(ChildId::new("y")));
        assert!(!container.is_transitioning());
    }

    #[test]
    fn veto_reports_false_and_changes_nothing() {
        let log: Log = Rc::default();
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            veto: Cell::new(true),
            ..Default::default()
        });
        let container = showing_x(&log, &[]);
        container.set_delegate(&delegate);

        container.transition_to_id(&ChildId::new("y"), done(&log));

        assert_eq!(
            *log.borrow(),
            vec![
                Ev::Should(ChildId::new("x"), ChildId::new("y")),
                Ev::Done(false)
            ]
        );
        assert_eq!(visible_id(&container), Some(ChildId::new("x")));
        assert_eq!(container.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn asynchronous_animator_keeps_container_busy() {
        let log: Log = Rc::default();
        let held = Rc::new(Held::default());
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            ..Default::default()
        });
        *delegate.animator.borrow_mut() = Some(held.clone() as _);
        let container = showing_x(&log, &["z"]);
        container.set_delegate(&delegate);

        container.transition_to_id(&ChildId::new("y"), done(&log));
        assert!(container.is_transitioning());
        assert_eq!(container.phase(), TransitionPhase::Animating);
        assert_eq!(visible_id(&container), Some(ChildId::new("x")));
        let coordinator = container.transition_coordinator().unwrap();
        assert_eq!(
            coordinator.animator().duration(coordinator.context()),
            core::time::Duration::from_millis(300)
        );

        // A second request while busy is dropped, completion and all.
        let dropped: Log = Rc::default();
        container.transition_to_id(&ChildId::new("z"), done(&dropped));
        assert!(dropped.borrow().is_empty());

        held.take().complete_transition(true);
        assert_eq!(visible_id(&container), Some(ChildId::new("y")));
        assert!(!container.is_transitioning());
        assert!(dropped.borrow().is_empty());
        assert_eq!(log.borrow().last(), Some(&Ev::Done(true)));
    }

    #[test]
    fn interactive_cancel_restores_source() {
        let log: Log = Rc::default();
        let held = Rc::new(Held::default());
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            observe_coordinator: Cell::new(true),
            ..Default::default()
        });
        *delegate.interactor.borrow_mut() = Some(held.clone() as _);
        let container = showing_x(&log, &[]);
        container.set_delegate(&delegate);

        container.transition_to_id(&ChildId::new("y"), done(&log));
        assert!(container.transition_coordinator().unwrap().is_interactive());
        log.borrow_mut().clear();

        let context = held.take();
        context.update_interactive_transition(0.25);
        context.cancel_interactive_transition();
        context.complete_transition(false);

        let (x, y) = (ChildId::new("x"), ChildId::new("y"));
        assert_eq!(
            *log.borrow(),
            vec![
                Ev::InteractionEnded,
                Ev::WillDetach("y"),
                Ev::Unmount("y"),
                Ev::Detach("y"),
                Ev::End("y"),
                Ev::End("x"),
                Ev::AlongsideDone,
                Ev::DidFinish(x, y),
                Ev::Done(false),
            ]
        );
        assert_eq!(visible_id(&container), Some(ChildId::new("x")));
    }

    #[test]
    fn interactive_finish_keeps_destination() {
        let log: Log = Rc::default();
        let held = Rc::new(Held::default());
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            ..Default::default()
        });
        *delegate.interactor.borrow_mut() = Some(held.clone() as _);
        let container = showing_x(&log, &[]);
        container.set_delegate(&delegate);

        let y = container.registry().children()[1].clone();
        container.set_visible_child(y);
        let context = held.take();
        context.update_interactive_transition(0.9);
        context.finish_interactive_transition();
        context.complete_transition(true);

        assert_eq!(visible_id(&container), Some(ChildId::new("y")));
        assert!(log.borrow().contains(&Ev::Detach("x")));
        assert!(!log.borrow().contains(&Ev::Detach("y")));
    }

    #[test]
    fn interactor_handing_off_to_default_animator_reports_outcome() {
        for (cancel, kept, finished) in [(true, "x", false), (false, "y", true)] {
            let log: Log = Rc::default();
            let delegate = Rc::new(Recorder {
                log: Rc::clone(&log),
                ..Default::default()
            });
            *delegate.interactor.borrow_mut() = Some(Rc::new(HandOff { cancel }) as _);
            let container = showing_x(&log, &[]);
            container.set_delegate(&delegate);

            container.transition_to_id(&ChildId::new("y"), done(&log));

            assert_eq!(visible_id(&container), Some(ChildId::new(kept)));
            assert_eq!(log.borrow().last(), Some(&Ev::Done(finished)));
            assert!(!container.is_transitioning());
        }
    }

    #[test]
    fn alongside_animation_runs_with_synchronous_animator() {
        let log: Log = Rc::default();
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            observe_coordinator: Cell::new(true),
            ..Default::default()
        });
        let container = showing_x(&log, &[]);
        container.set_delegate(&delegate);

        container.transition_to_id(&ChildId::new("y"), None);

        let events = log.borrow();
        let pos = |ev: &Ev| events.iter().position(|e| e == ev).unwrap();
        let (x, y) = (ChildId::new("x"), ChildId::new("y"));
        assert!(pos(&Ev::DidBegin(x.clone(), y.clone())) < pos(&Ev::Alongside));
        assert!(pos(&Ev::Alongside) < pos(&Ev::End("y")));
        assert!(pos(&Ev::AlongsideDone) < pos(&Ev::DidFinish(x, y)));
        // Not interactive, so no interaction-ended notification.
        assert!(!events.contains(&Ev::InteractionEnded));
    }

    #[test]
    fn post_transition_policy_runs_before_did_finish() {
        let log: Log = Rc::default();
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            ..Default::default()
        });
        let container = showing_x(&log, &["z"]);
        container.set_delegate(&delegate);
        let policy_log = Rc::clone(&log);
        container.set_post_transition_policy(PostTransitionPolicy::custom(
            move |_: &mut ChildRegistry<Probe>, visible: &Child<Probe>| {
                policy_log
                    .borrow_mut()
                    .push(Ev::Policy(visible.id().clone()));
            },
        ));

        container.transition_to_id(&ChildId::new("y"), done(&log));

        let tail: Vec<Ev> = log.borrow().iter().rev().take(3).rev().cloned().collect();
        assert_eq!(
            tail,
            vec![
                Ev::Policy(ChildId::new("y")),
                Ev::DidFinish(ChildId::new("x"), ChildId::new("y")),
                Ev::Done(true),
            ]
        );
    }

    #[test]
    fn remove_all_non_visible_honors_exceptions() {
        let log: Log = Rc::default();
        let container = showing_x(&log, &["z"]);
        container.transition_to_id(&ChildId::new("y"), None);
        let keep_y = PostTransitionPolicy::remove_all_non_visible_except([ChildId::new("y")]);
        container.set_post_transition_policy(keep_y);

        container.transition_to_id(&ChildId::new("x"), None);

        assert_eq!(visible_id(&container), Some(ChildId::new("x")));
        let registry = container.registry();
        let ids: Vec<&str> = registry.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn transition_to_unknown_id_does_nothing() {
        let log: Log = Rc::default();
        let container = showing_x(&log, &[]);
        container.transition_to_id(&ChildId::new("nope"), done(&log));
        assert!(log.borrow().is_empty());
        assert_eq!(visible_id(&container), Some(ChildId::new("x")));
    }

    #[test]
    fn new_child_is_inserted_by_policy_before_transition() {
        let log: Log = Rc::default();
        let container = showing_x(&log, &[]);
        container.transition_to(probe(&log, "z"), done(&log));
        assert_eq!(visible_id(&container), Some(ChildId::new("z")));
        assert_eq!(container.registry().index_of(&probe(&log, "z")), Some(0));
        assert!(matches!(
            container.insertion_policy(),
            InsertionPolicy::Prepend
        ));
    }

    #[test]
    fn completion_after_container_dropped_is_ignored() {
        let log: Log = Rc::default();
        let held = Rc::new(Held::default());
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            ..Default::default()
        });
        *delegate.animator.borrow_mut() = Some(held.clone() as _);
        let container = showing_x(&log, &[]);
        container.set_delegate(&delegate);
        container.transition_to_id(&ChildId::new("y"), done(&log));
        let context = held.take();
        drop(container);

        context.complete_transition(true);
        assert!(!log.borrow().contains(&Ev::Done(true)));
    }

    #[test]
    fn repeated_completion_finalizes_once() {
        let log: Log = Rc::default();
        let held = Rc::new(Held::default());
        let delegate = Rc::new(Recorder {
            log: Rc::clone(&log),
            ..Default::default()
        });
        *delegate.animator.borrow_mut() = Some(held.clone() as _);
        let container = showing_x(&log, &[]);
        container.set_delegate(&delegate);
        container.transition_to_id(&ChildId::new("y"), done(&log));

        let context = held.take();
        context.complete_transition(true);
        context.complete_transition(false);
        let dones = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Ev::Done(_)))
            .count();
        assert_eq!(dones, 1);
    }

    #[test]
    fn dropped_delegate_falls_back_to_defaults() {
        let log: Log = Rc::default();
        let container = showing_x(&log, &[]);
        {
            let delegate = Rc::new(Recorder {
                log: Rc::clone(&log),
                veto: Cell::new(true),
                ..Default::default()
            });
            container.set_delegate(&delegate);
        }
        container.transition_to_id(&ChildId::new("y"), done(&log));
        assert_eq!(visible_id(&container), Some(ChildId::new("y")));
        assert_eq!(log.borrow().last(), Some(&Ev::Done(true)));
    }
}
