// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tab switching with a container.
//!
//! This example keeps three tabs in a container, switches between them, lets a
//! delegate veto one switch, and evicts hidden tabs with a post-transition policy.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example container_basics`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::Rect;
use understory_container::container::{Container, ContainerDelegate};
use understory_container::policy::PostTransitionPolicy;
use understory_container::registry::{InsertionPolicy, TraversalDirection};
use understory_container::types::{Child, ChildId, Screen};

const INBOX: ChildId = ChildId::new("inbox");
const DRAFTS: ChildId = ChildId::new("drafts");
const SENT: ChildId = ChildId::new("sent");
const ARCHIVE: ChildId = ChildId::new("archive");

struct Tab {
    name: &'static str,
    visible: Cell<bool>,
}

impl Tab {
    fn child(id: ChildId, name: &'static str) -> Child<Self> {
        Child::new(
            id,
            Rc::new(Self {
                name,
                visible: Cell::new(false),
            }),
        )
    }
}

impl Screen for Tab {
    fn begin_appearance_transition(&self, appearing: bool, animated: bool) {
        println!(
            "  {:<8} {} (animated: {animated})",
            self.name,
            if appearing { "appearing" } else { "disappearing" }
        );
    }

    fn end_appearance_transition(&self) {}

    fn mount_view(&self, frame: Rect) {
        println!("  {:<8} mounted at {frame:?}", self.name);
        self.visible.set(true);
    }

    fn unmount_view(&self) {
        println!("  {:<8} unmounted", self.name);
        self.visible.set(false);
    }
}

/// Refuses to leave a tab with unsaved changes.
#[derive(Default)]
struct Guard {
    dirty: RefCell<Option<ChildId>>,
}

impl ContainerDelegate<Tab> for Guard {
    fn should_transition(
        &self,
        _container: &Container<Tab>,
        source: &Child<Tab>,
        _destination: &Child<Tab>,
    ) -> bool {
        self.dirty.borrow().as_ref() != Some(source.id())
    }

    fn did_finish_transitioning(
        &self,
        _container: &Container<Tab>,
        source: &Child<Tab>,
        destination: &Child<Tab>,
    ) {
        println!("  switched {} -> {}", source.id(), destination.id());
    }
}

fn names(container: &Container<Tab>) -> Vec<String> {
    container
        .registry()
        .iter()
        .map(|c| c.id().to_string())
        .collect()
}

fn main() {
    env_logger::init();

    let container = Container::with_children(vec![
        Tab::child(INBOX, "inbox"),
        Tab::child(DRAFTS, "drafts"),
        Tab::child(SENT, "sent"),
    ]);
    let guard = Rc::new(Guard::default());
    container.set_delegate(&guard);

    println!("surface ready:");
    container.surface_ready(Rect::new(0.0, 0.0, 640.0, 480.0));
    assert_eq!(container.visible_child().map(|c| c.id().clone()), Some(INBOX));

    println!("inbox -> drafts:");
    container.transition_to_id(&DRAFTS, None);
    assert_eq!(container.visible_child().map(|c| c.id().clone()), Some(DRAFTS));

    // Walk to the next tab in registry order.
    let next = {
        let registry = container.registry();
        registry
            .find(&DRAFTS)
            .and_then(|drafts| registry.neighbor(TraversalDirection::Following, drafts))
            .cloned()
    };
    assert_eq!(next.as_ref().map(|c| c.id().clone()), Some(SENT));

    println!("drafts has unsaved changes, drafts -> sent:");
    *guard.dirty.borrow_mut() = Some(DRAFTS);
    let vetoed = Rc::new(Cell::new(None));
    let seen = Rc::clone(&vetoed);
    if let Some(next) = next.clone() {
        container.transition_to(next, Some(Box::new(move |ok| seen.set(Some(ok)))));
    }
    assert_eq!(vetoed.get(), Some(false));
    assert_eq!(container.visible_child().map(|c| c.id().clone()), Some(DRAFTS));

    println!("saved, drafts -> sent:");
    *guard.dirty.borrow_mut() = None;
    if let Some(next) = next {
        container.set_visible_child(next);
    }
    assert_eq!(container.visible_child().map(|c| c.id().clone()), Some(SENT));

    // New tabs keep the registry sorted, and hidden tabs other than the inbox are evicted.
    container.set_insertion_policy(InsertionPolicy::sorted(|a, b| a.id().cmp(b.id())));
    container.set_post_transition_policy(PostTransitionPolicy::remove_all_non_visible_except([
        INBOX,
    ]));

    println!("sent -> archive (new tab):");
    container.transition_to(Tab::child(ARCHIVE, "archive"), None);
    assert_eq!(
        container.visible_child().map(|c| c.id().clone()),
        Some(ARCHIVE)
    );
    assert_eq!(names(&container), ["archive", "inbox"]);

    let archive = container.visible_screen();
    assert!(archive.is_some_and(|tab| tab.visible.get()));
    println!("registry: {:?}", names(&container));
}
