use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use futures::{channel::oneshot, FutureExt};
use pretty_assertions::assert_eq;
use surfnav::prelude::*;

mod common;
use common::*;

fn traced_route(path: &str, name: &'static str, journal: &Journal, veto: &Rc<Cell<bool>>) -> Route {
    let journal = journal.clone();
    let veto = veto.clone();
    Route::factory(path, move |_| {
        Some(Rc::new(TracedScreen::new(name, &journal, &veto)) as Rc<dyn Screen>)
    })
}

#[test]
fn navigates_to_routed_path() {
    let h = Harness::new();
    h.page("/a", "A");

    assert_eq!(h.visit("/a"), Ok(()));

    assert_eq!(h.app.active_path().as_deref(), Some("/a"));
    assert_eq!(h.history.current_url(), "/a");
    assert_eq!(h.history.len_back(), 1);
    assert_eq!(h.surface_content("body").as_deref(), Some("body:A"));
    assert_eq!(h.surface_content("header").as_deref(), Some("header:A"));
    assert_eq!(h.window.title(), "Default");
    assert!(!h.window.has_root_class("surfnav-loading"));
    assert_eq!(h.app.phase(), NavigationPhase::Idle);
    assert_eq!(h.events(), vec!["start /a", "end /a ok"]);

    let entry = HistoryEntry::from_state(&h.history.state().unwrap()).unwrap();
    assert_eq!(entry.path, "/a");
    assert_eq!(entry.navigate_path, "/a");
    assert!(!entry.is_form_submission);
}

#[test]
fn loading_class_is_set_while_navigating() {
    let h = Harness::new();
    h.page("/a", "A");
    h.transport.hold("/a");

    let navigation = h.app.navigate("/a", false);
    assert!(h.window.has_root_class("surfnav-loading"));
    assert!(h.app.is_navigating());

    h.scheduler.run();
    assert_eq!(h.app.phase(), NavigationPhase::Loading);
    assert!(h.window.has_root_class("surfnav-loading"));

    h.transport.release("/a");
    h.scheduler.run();
    assert_eq!(navigation.now_or_never(), Some(Ok(())));
    assert!(!h.window.has_root_class("surfnav-loading"));
    assert!(!h.app.is_navigating());
}

#[test]
fn missing_route_is_rejected() {
    let h = Harness::new();
    h.page("/a", "A");

    let navigation = h.app.navigate("/missing", false);
    assert_eq!(
        navigation.now_or_never(),
        Some(Err(NavigationError::NoRouteFound {
            path: "/missing".into()
        }))
    );
    assert_eq!(
        h.events(),
        vec!["start /missing", "end /missing no route for /missing"]
    );
    assert_eq!(h.history.len_back(), 0);
    assert!(!h.window.has_root_class("surfnav-loading"));
    assert_eq!(h.app.phase(), NavigationPhase::Failed);
}

#[test]
fn newer_navigation_cancels_pending_one() {
    let h = Harness::new();
    h.page("/a", "A");
    h.page("/b", "B");
    h.transport.hold("/a");

    let first = h.app.navigate("/a", false);
    h.scheduler.run();
    let second = h.app.navigate("/b", false);
    h.scheduler.run();

    assert_eq!(
        first.now_or_never(),
        Some(Err(NavigationError::Cancelled(CancelReason::Superseded)))
    );
    assert_eq!(second.now_or_never(), Some(Ok(())));

    assert_eq!(h.transport.aborted(), 1);
    assert_eq!(h.app.active_path().as_deref(), Some("/b"));
    assert_eq!(h.history.current_url(), "/b");
    assert_eq!(h.history.len_back(), 1);
    assert!(h.app.screen_for("/a").is_none());
    assert!(!h.window.has_root_class("surfnav-loading"));

    let events = h.events();
    assert_eq!(&events[..2], &["start /a", "start /b"]);
    assert!(events.contains(&"end /a navigation cancelled: cancel pending navigation".to_string()));
    assert!(events.contains(&"end /b ok".to_string()));
}

#[test]
fn caller_can_cancel_a_navigation() {
    let h = Harness::new();
    h.page("/a", "A");
    h.transport.hold("/a");

    let navigation = h.app.navigate("/a", false);
    h.scheduler.run();
    navigation.cancel();
    h.scheduler.run();

    assert_eq!(
        navigation.now_or_never(),
        Some(Err(NavigationError::Cancelled(CancelReason::Aborted)))
    );
    assert_eq!(h.transport.aborted(), 1);
    assert_eq!(h.app.phase(), NavigationPhase::Cancelled);
    assert!(!h.window.has_root_class("surfnav-loading"));
    assert!(h.app.screen_for("/a").is_none());
    assert_eq!(h.app.active_path(), None);
    assert_eq!(h.history.len_back(), 0);
}

#[test]
fn rejected_navigation_settles_the_one_it_superseded() {
    let h = Harness::with_history(
        MemoryHistory::with_initial_path("/").with_scroll_restoration(ScrollRestoration::Auto),
    );
    h.page("/home", "H");
    h.page("/a", "A");
    h.visit("/home").unwrap();
    h.transport.hold("/a");

    let first = h.app.navigate("/a", false);
    h.scheduler.run();
    assert_eq!(h.history.scroll_restoration(), Some(ScrollRestoration::Manual));

    let second = h.app.navigate("/missing", false);
    h.scheduler.run();
    assert_eq!(
        first.now_or_never(),
        Some(Err(NavigationError::Cancelled(CancelReason::Superseded)))
    );
    assert_eq!(
        second.now_or_never(),
        Some(Err(NavigationError::NoRouteFound {
            path: "/missing".into()
        }))
    );

    assert!(!h.window.has_root_class("surfnav-loading"));
    assert_eq!(h.history.scroll_restoration(), Some(ScrollRestoration::Auto));
    assert!(!h.app.is_navigating());
    assert_eq!(h.app.active_path().as_deref(), Some("/home"));

    h.window.set_scroll(ScrollPosition::new(0.0, 500.0));
    h.app.on_scroll();
    let entry = HistoryEntry::from_state(&h.history.state().unwrap()).unwrap();
    assert_eq!(entry.path, "/home");
    assert_eq!(entry.scroll_top, 500.0);
}

#[test]
fn cancelling_during_flip_reinstates_the_active_screen() {
    let h = Harness::new();
    let journal = Journal::default();
    let veto = Rc::new(Cell::new(false));
    let (open, gate) = oneshot::channel();
    let gate = Rc::new(RefCell::new(Some(gate)));

    h.app.add_route(traced_route("/a", "a", &journal, &veto));
    h.app.add_route(Route::factory("/b", {
        let journal = journal.clone();
        let veto = veto.clone();
        move |_| {
            let mut screen = TracedScreen::new("b", &journal, &veto);
            if let Some(gate) = gate.borrow_mut().take() {
                screen = screen.gated(gate);
            }
            Some(Rc::new(screen) as Rc<dyn Screen>)
        }
    }));
    h.app.add_route(traced_route("/c", "c", &journal, &veto));
    h.visit("/a").unwrap();

    let flipping = h.app.navigate("/b", false);
    h.scheduler.run();
    assert_eq!(h.app.phase(), NavigationPhase::Flipping);
    assert_eq!(h.history.current_url(), "/b");
    assert_eq!(h.surface_content("body").as_deref(), Some("b:body"));

    let next = h.app.navigate("/c", false);
    // the page is back on the screen that is still active
    assert_eq!(h.history.current_url(), "/a");
    assert_eq!(h.surface_content("body").as_deref(), Some("a:body"));
    assert_eq!(h.window.title(), "A");

    h.scheduler.run();
    assert_eq!(
        flipping.now_or_never(),
        Some(Err(NavigationError::Cancelled(CancelReason::Superseded)))
    );
    assert_eq!(next.now_or_never(), Some(Ok(())));
    assert_eq!(h.app.active_path().as_deref(), Some("/c"));
    assert_eq!(
        *journal.borrow(),
        vec![
            "load a",
            "activate a",
            "load b",
            "deactivate a",
            "dispose b",
            "activate a",
            "load c",
            "deactivate a",
            "activate c",
            "dispose a",
        ]
    );
    drop(open);
}

#[test]
fn navigating_to_active_path_refreshes_with_a_new_instance() {
    let h = Harness::new();
    h.page("/a", "A");

    h.visit("/a").unwrap();
    let first = h.app.active_screen().unwrap().id();

    h.visit("/a").unwrap();
    let second = h.app.active_screen().unwrap();

    assert_ne!(second.id(), first);
    // the new instance inherits the cached content and does not fetch again
    assert_eq!(second.cache().as_deref(), Some("A"));
    assert_eq!(h.transport.requests_for("/a"), 1);
    // refreshing replaces the history entry
    assert_eq!(h.history.len_back(), 1);
    assert_eq!(h.app.cached_screens(), 1);

    let body = h.app.surface("body").unwrap();
    assert!(!body.has_content(first));
    assert_eq!(body.active_screen(), Some(second.id()));
}

#[test]
fn non_cacheable_screens_are_evicted_when_left() {
    let h = Harness::new();
    let journal = Journal::default();
    let veto = Rc::new(Cell::new(false));
    h.page("/c", "C");
    h.app.add_route(traced_route("/n", "n", &journal, &veto));

    h.visit("/c").unwrap();
    let cached = h.app.active_screen().unwrap().id();

    h.visit("/n").unwrap();
    assert!(h.app.screen_for("/c").is_some());
    assert_eq!(h.window.title(), "N");

    h.visit("/c").unwrap();
    assert!(h.app.screen_for("/n").is_none());
    assert_eq!(h.app.active_screen().unwrap().id(), cached);
    assert_eq!(h.transport.requests_for("/c"), 1);
    assert_eq!(h.surface_content("body").as_deref(), Some("body:C"));

    assert_eq!(
        *journal.borrow(),
        vec!["load n", "activate n", "deactivate n", "dispose n"]
    );
}

#[test]
fn active_screen_can_veto_leaving() {
    let h = Harness::new();
    let journal = Journal::default();
    let veto = Rc::new(Cell::new(false));
    h.app.add_route(traced_route("/v", "v", &journal, &veto));
    h.page("/a", "A");

    h.visit("/v").unwrap();
    veto.set(true);

    let navigation = h.app.navigate("/a", false);
    assert_eq!(
        navigation.now_or_never(),
        Some(Err(NavigationError::Vetoed { path: "/a".into() }))
    );
    assert_eq!(h.app.active_path().as_deref(), Some("/v"));
    assert_eq!(h.transport.requests_for("/a"), 0);
    assert!(!h.window.has_root_class("surfnav-loading"));
    assert_eq!(h.app.phase(), NavigationPhase::Cancelled);
    assert_eq!(*journal.borrow(), vec!["load v", "activate v"]);
}

#[test]
fn before_navigate_filter_refuses_navigation() {
    let h = Harness::new();
    h.page("/private", "secret");
    h.app.on_before_navigate(|event| {
        if event.path == "/private" {
            Err("private".to_string())
        } else {
            Ok(())
        }
    });

    let navigation = h.app.navigate("/private", false);
    assert_eq!(
        navigation.now_or_never(),
        Some(Err(NavigationError::Cancelled(CancelReason::Filtered(
            "private".into()
        ))))
    );
    assert_eq!(
        h.events(),
        vec!["end /private navigation cancelled: refused by filter: private"]
    );
    assert_eq!(h.transport.requests_for("/private"), 0);
}

#[test]
fn unsupported_environment_refuses_silently() {
    let h = Harness::with_history(MemoryHistory::with_initial_path("/").unsupported());
    h.page("/a", "A");

    let navigation = h.app.navigate("/a", false);
    assert_eq!(
        navigation.now_or_never(),
        Some(Err(NavigationError::UnsupportedEnvironment))
    );
    assert!(h.events().is_empty());
    assert!(!h.app.on_link_activate(&LinkActivation::from_href("/a", "localhost").unwrap()));
}

#[test]
fn failed_load_evicts_the_screen() {
    let h = Harness::new();
    h.transport.reply("/broken", 500, "/broken", "oops");
    h.app.add_route(h.request_route("/broken"));

    assert_eq!(
        h.visit("/broken"),
        Err(NavigationError::Transport(TransportError::Status {
            status: 500,
            url: "/broken".into()
        }))
    );
    assert!(h.app.screen_for("/broken").is_none());
    assert_eq!(h.app.active_path(), None);
    assert_eq!(h.app.phase(), NavigationPhase::Failed);
    assert_eq!(h.history.len_back(), 0);
    assert_eq!(
        h.events(),
        vec![
            "start /broken",
            "end /broken request to /broken failed with status 500"
        ]
    );
}

#[test]
fn screen_title_wins_over_default() {
    let h = Harness::new();
    h.transport.serve("/t", "T");
    h.app
        .add_route(h.request_route_with("/t", |screen| screen.with_title("Titled")));

    h.visit("/t").unwrap();
    assert_eq!(h.window.title(), "Titled");
    assert_eq!(h.history.current().title, "Titled");
}

#[test]
fn dispatch_replaces_the_current_entry() {
    let h = Harness::with_history(MemoryHistory::with_initial_path("/a?x=1"));
    h.transport.serve("/a?x=1", "A");
    h.app.add_route(h.request_route("/a"));

    let navigation = h.app.dispatch();
    h.scheduler.run();
    assert_eq!(navigation.now_or_never(), Some(Ok(())));

    assert_eq!(h.history.len_back(), 0);
    assert_eq!(h.history.current_url(), "/a?x=1");
    assert!(HistoryEntry::from_state(&h.history.state().unwrap()).is_some());
    assert_eq!(h.app.active_path().as_deref(), Some("/a?x=1"));
}

#[test]
fn paths_are_routed_without_base_and_query() {
    let h = Harness::new();
    h.app.set_base_path("/app");
    h.transport.serve("/app/a?page=2", "A2");
    h.app.add_route(h.request_route("/a"));

    assert!(h.app.find_route("/app/a?page=2").is_some());
    assert!(!h
        .app
        .on_link_activate(&LinkActivation::from_href("/elsewhere/a", "localhost").unwrap()));

    h.visit("/app/a?page=2").unwrap();
    assert_eq!(h.history.current_url(), "/app/a?page=2");
    assert!(h.app.screen_for("/app/a?page=2#ignored").is_some());
    assert!(h.app.screen_for("/app/a?page=3").is_none());
}

#[test]
fn hash_change_on_current_path_is_not_routed() {
    let h = Harness::new();
    h.page("/a", "A");
    h.visit("/a").unwrap();

    assert!(h.app.find_route("/a#section").is_none());
    assert!(h.app.find_route("/a").is_some());

    let navigation = h.app.navigate("/a#section", false);
    assert_eq!(
        navigation.now_or_never(),
        Some(Err(NavigationError::NoRouteFound {
            path: "/a#section".into()
        }))
    );
}

#[test]
fn routes_are_tried_in_registration_order() {
    let h = Harness::new();
    let journal = Journal::default();
    let veto = Rc::new(Cell::new(false));
    let first = traced_route("/dup", "first", &journal, &veto);
    h.app
        .add_routes([first.clone(), traced_route("/dup", "second", &journal, &veto)]);

    h.visit("/dup").unwrap();
    assert_eq!(h.surface_content("body").as_deref(), Some("first:body"));

    assert!(h.app.remove_route(&first));
    assert!(!h.app.remove_route(&first));
    assert!(h.app.has_routes());
}

#[test]
fn prefetch_fills_the_cache() {
    let h = Harness::new();
    h.page("/a", "A");
    h.page("/b", "B");
    h.visit("/a").unwrap();

    let prefetch = h.app.prefetch("/b");
    h.scheduler.run();
    assert_eq!(prefetch.now_or_never(), Some(Ok(())));
    assert!(h.app.screen_for("/b").is_some());
    assert_eq!(h.app.active_path().as_deref(), Some("/a"));
    assert_eq!(h.history.len_back(), 1);

    h.visit("/b").unwrap();
    assert_eq!(h.transport.requests_for("/b"), 1);

    assert_eq!(
        h.app.prefetch("/missing").now_or_never(),
        Some(Err(NavigationError::NoRouteFound {
            path: "/missing".into()
        }))
    );
}

#[test]
fn prefetch_displaced_by_a_navigation_is_disposed() {
    let h = Harness::new();
    let journal = Journal::default();
    let veto = Rc::new(Cell::new(false));
    let (open, gate) = oneshot::channel();
    let gate = Rc::new(RefCell::new(Some(gate)));
    let instances = Rc::new(Cell::new(0));

    h.app.add_route(Route::factory("/g", {
        let journal = journal.clone();
        move |_| {
            instances.set(instances.get() + 1);
            let name = if instances.get() == 1 { "g1" } else { "g2" };
            let mut screen = TracedScreen::new(name, &journal, &veto);
            if let Some(gate) = gate.borrow_mut().take() {
                screen = screen.gated(gate);
            }
            Some(Rc::new(screen) as Rc<dyn Screen>)
        }
    }));

    let navigation = h.app.navigate("/g", false);
    h.scheduler.run();
    assert_eq!(h.app.phase(), NavigationPhase::Flipping);

    let prefetch = h.app.prefetch("/g");
    h.scheduler.run();
    assert_eq!(prefetch.now_or_never(), Some(Ok(())));

    open.send(()).unwrap();
    h.scheduler.run();
    assert_eq!(navigation.now_or_never(), Some(Ok(())));

    let active = h.app.active_screen().unwrap();
    assert_eq!(h.app.screen_for("/g").map(|screen| screen.id()), Some(active.id()));
    assert_eq!(h.app.cached_screens(), 1);
    assert!(journal.borrow().contains(&"dispose g2".to_string()));
    assert!(!journal.borrow().contains(&"dispose g1".to_string()));
}

#[test]
fn clearing_the_cache_keeps_the_active_screen() {
    let h = Harness::new();
    h.page("/a", "A");
    h.page("/b", "B");
    h.visit("/a").unwrap();
    h.visit("/b").unwrap();
    assert_eq!(h.app.cached_screens(), 2);

    h.app.clear_screens_cache();
    assert_eq!(h.app.cached_screens(), 1);
    assert!(h.app.screen_for("/b").is_some());

    let body = h.app.surface("body").unwrap();
    assert_eq!(body.active_content().as_deref(), Some("body:B"));
}

#[test]
fn dispose_cancels_and_evicts_everything() {
    let h = Harness::new();
    h.page("/a", "A");
    h.page("/b", "B");
    h.visit("/a").unwrap();
    h.transport.hold("/b");

    let navigation = h.app.navigate("/b", false);
    h.scheduler.run();
    h.app.dispose();
    h.scheduler.run();

    assert_eq!(
        navigation.now_or_never(),
        Some(Err(NavigationError::Cancelled(CancelReason::Disposed)))
    );
    assert_eq!(h.app.cached_screens(), 0);
    assert_eq!(h.app.active_path(), None);
    assert!(!h.window.has_root_class("surfnav-loading"));
    assert_eq!(h.app.surface("body").unwrap().active_screen(), None);
}

#[test]
fn end_observers_see_every_outcome_once() {
    let h = Harness::new();
    h.page("/a", "A");
    h.page("/b", "B");

    h.visit("/a").unwrap();
    h.visit("/b").unwrap();
    let _ = h.app.navigate("/nowhere", false);

    assert_eq!(
        h.events(),
        vec![
            "start /a",
            "end /a ok",
            "start /b",
            "end /b ok",
            "start /nowhere",
            "end /nowhere no route for /nowhere",
        ]
    );
}
