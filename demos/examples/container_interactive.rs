// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactive transitions driven by a swipe.
//!
//! This example hands transitions to an interactor that replays a drag gesture.
//! A short drag is cancelled and the container stays put; a long drag commits.
//! A delegate hooks into the coordinator to run work alongside each transition.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p understory_demos --example container_interactive`

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use kurbo::Rect;
use understory_container::container::{Completion, Container, ContainerDelegate};
use understory_container::transition::{Animator, Interactor, TransitionContext};
use understory_container::types::{Child, ChildId, Screen};

struct Page {
    title: &'static str,
}

impl Screen for Page {
    fn begin_appearance_transition(&self, appearing: bool, _animated: bool) {
        let verb = if appearing { "will appear" } else { "will disappear" };
        println!("  {} {verb}", self.title);
    }

    fn end_appearance_transition(&self) {
        println!("  {} settled", self.title);
    }

    fn mount_view(&self, frame: Rect) {
        println!("  {} mounted at x = {}", self.title, frame.x0);
    }
}

/// Slides the destination in from the right edge.
struct Slide;

impl Animator<Page> for Slide {
    fn duration(&self, _context: &TransitionContext<Page>) -> Duration {
        Duration::from_millis(250)
    }

    fn animate(&self, context: &TransitionContext<Page>) {
        let end = context.final_frame();
        let start = end + kurbo::Vec2::new(end.width(), 0.0);
        context.destination().mount_view(start);
        context.destination().mount_view(end);
        context.complete_transition(!context.transition_was_cancelled());
    }
}

/// Holds the context until the gesture is replayed.
#[derive(Default)]
struct Swipe {
    context: RefCell<Option<TransitionContext<Page>>>,
}

impl Swipe {
    /// Feed drag positions (fractions of the region width); release commits past one half.
    fn replay(&self, positions: &[f64]) {
        let Some(context) = self.context.borrow_mut().take() else {
            return;
        };
        for p in positions {
            context.update_interactive_transition(*p);
            println!("  progress {:.0}%", context.percent_complete() * 100.0);
        }
        if context.percent_complete() > 0.5 {
            context.finish_interactive_transition();
            context.complete_transition(true);
        } else {
            context.cancel_interactive_transition();
            context.complete_transition(false);
        }
    }
}

impl Interactor<Page> for Swipe {
    fn start_interactive_transition(
        &self,
        context: &TransitionContext<Page>,
        _animator: Rc<dyn Animator<Page>>,
    ) {
        let frame = context.final_frame();
        let offscreen = frame + kurbo::Vec2::new(frame.width(), 0.0);
        context.destination().mount_view(offscreen);
        *self.context.borrow_mut() = Some(context.clone());
    }
}

struct Pager {
    swipe: Rc<Swipe>,
    interactive: bool,
}

impl ContainerDelegate<Page> for Pager {
    fn animator_for(
        &self,
        _container: &Container<Page>,
        _source: &Child<Page>,
        _destination: &Child<Page>,
    ) -> Option<Rc<dyn Animator<Page>>> {
        Some(Rc::new(Slide))
    }

    fn interactor_for(
        &self,
        _container: &Container<Page>,
        _source: &Child<Page>,
        _destination: &Child<Page>,
    ) -> Option<Rc<dyn Interactor<Page>>> {
        self.interactive
            .then(|| Rc::clone(&self.swipe) as Rc<dyn Interactor<Page>>)
    }

    fn did_begin_transitioning(
        &self,
        container: &Container<Page>,
        source: &Child<Page>,
        destination: &Child<Page>,
    ) {
        let Some(coordinator) = container.transition_coordinator() else {
            return;
        };
        println!(
            "  began {} -> {} ({} ms)",
            source.id(),
            destination.id(),
            coordinator
                .animator()
                .duration(coordinator.context())
                .as_millis()
        );
        coordinator.animate_alongside(
            |_| println!("  dimming title bar"),
            Some(Box::new(|context: &TransitionContext<Page>| {
                let outcome = if context.transition_was_cancelled() {
                    "cancelled"
                } else {
                    "committed"
                };
                println!("  title bar restored ({outcome})");
            })),
        );
        coordinator.notify_when_interaction_ends(|context| {
            println!("  finger lifted at {:.0}%", context.percent_complete() * 100.0);
        });
    }
}

fn main() {
    env_logger::init();

    let container = Container::with_children(vec![
        Child::new("one", Rc::new(Page { title: "page one" })),
        Child::new("two", Rc::new(Page { title: "page two" })),
        Child::new("three", Rc::new(Page { title: "page three" })),
    ]);
    let swipe = Rc::new(Swipe::default());
    let pager = Rc::new(Pager {
        swipe: Rc::clone(&swipe),
        interactive: true,
    });
    container.set_delegate(&pager);
    container.surface_ready(Rect::new(0.0, 0.0, 390.0, 844.0));

    let outcome = Rc::new(RefCell::new(Vec::new()));
    let record = |outcome: &Rc<RefCell<Vec<bool>>>| -> Option<Completion> {
        let outcome = Rc::clone(outcome);
        Some(Box::new(move |finished: bool| outcome.borrow_mut().push(finished)))
    };

    println!("short swipe towards page two:");
    container.transition_to_id(&ChildId::new("two"), record(&outcome));
    assert!(container.is_transitioning());
    swipe.replay(&[0.1, 0.2, 0.3]);
    assert!(!container.is_transitioning());
    assert_eq!(
        container.visible_child().map(|c| c.id().clone()),
        Some(ChildId::new("one"))
    );

    println!("long swipe towards page two:");
    container.transition_to_id(&ChildId::new("two"), record(&outcome));
    swipe.replay(&[0.2, 0.5, 0.8, 1.3]);
    assert_eq!(
        container.visible_child().map(|c| c.id().clone()),
        Some(ChildId::new("two"))
    );

    println!("button press towards page three:");
    let pager = Rc::new(Pager {
        swipe,
        interactive: false,
    });
    container.set_delegate(&pager);
    container.transition_to_id(&ChildId::new("three"), record(&outcome));
    assert_eq!(
        container.visible_child().map(|c| c.id().clone()),
        Some(ChildId::new("three"))
    );

    assert_eq!(*outcome.borrow(), [false, true, true]);
}
