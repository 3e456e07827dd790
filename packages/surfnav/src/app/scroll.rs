//! Scroll and traversal handling.

use std::{cell::Cell, rc::Rc};

use futures_util::FutureExt;
use serde_json::Value;

use crate::{
    history::{HistoryEntry, ScrollRestoration},
    navigation::Navigation,
    platform::ScrollPosition,
};

use super::App;

pub(super) struct ScrollState {
    /// Whether the history exposes a native scroll restoration mode.
    pub(super) native_supported: bool,
    /// The native mode found before the first navigation turned it off.
    pub(super) saved_restoration: Cell<Option<ScrollRestoration>>,
    /// Recorded position of the entry being traversed to.
    pub(super) popstate_position: Cell<ScrollPosition>,
    /// Whether scroll events update the current entry. Off while a navigation runs.
    pub(super) capture_from_scroll_event: Cell<bool>,
    /// Set for one tick after the page load, to drop the spurious popstate some browsers fire.
    pub(super) skip_load_popstate: Cell<bool>,
}

impl ScrollState {
    pub(super) fn new(native_supported: bool) -> Self {
        Self {
            native_supported,
            saved_restoration: Cell::new(None),
            popstate_position: Cell::default(),
            capture_from_scroll_event: Cell::new(true),
            skip_load_popstate: Cell::new(false),
        }
    }
}

impl App {
    /// Handle a history traversal. `state` is the state of the entry traversed to.
    ///
    /// Entries written by this controller are navigated to again and their scroll position is
    /// restored. Foreign entries reload the page, unless only the fragment changed.
    pub fn on_popstate(&self, state: Option<Value>) -> Option<Navigation> {
        if self.inner.scroll.skip_load_popstate.get() {
            tracing::trace!("ignoring popstate fired during page load");
            return None;
        }

        let Some(entry) = state.as_ref().and_then(HistoryEntry::from_state) else {
            if self.inner.platform.window.location().hash.is_empty() {
                self.reload_page();
            } else {
                // the entry belongs to another document if the active path is not the
                // current location
                let stale = self
                    .active_path()
                    .is_some_and(|active| !self.is_path_current_browser_path(&active));
                if stale {
                    self.reload_page();
                }
                self.maybe_reposition_scroll_to_hashed_anchor();
            }
            return None;
        };

        tracing::debug!("history traversal to [{}]", entry.path);
        self.inner
            .scroll
            .popstate_position
            .set(ScrollPosition::new(entry.scroll_left, entry.scroll_top));
        if !self.inner.scroll.native_supported {
            self.lock_history_scroll_position();
        }
        Some(self.navigate(entry.path, true))
    }

    /// Handle the page load event.
    pub fn on_load(&self) {
        self.inner.scroll.skip_load_popstate.set(true);

        let inner = Rc::downgrade(&self.inner);
        let tick = self.inner.platform.scheduler.next_tick();
        self.inner.platform.scheduler.spawn_local(
            async move {
                tick.await;
                if let Some(inner) = inner.upgrade() {
                    inner.scroll.skip_load_popstate.set(false);
                }
            }
            .boxed_local(),
        );

        self.maybe_reposition_scroll_to_hashed_anchor();
    }

    /// Handle a scroll of the page: record the position in the current entry, if the controller
    /// owns it.
    pub fn on_scroll(&self) {
        if !self.inner.scroll.capture_from_scroll_event.get() {
            return;
        }

        let history = &self.inner.platform.history;
        let Some(mut entry) = history.state().as_ref().and_then(HistoryEntry::from_state) else {
            return;
        };
        let position = self.inner.platform.window.scroll_position();
        entry.scroll_top = position.y;
        entry.scroll_left = position.x;
        history.replace_state(Some(entry.to_state()), "", None);
    }

    /// Scroll to the element named by the current fragment, if there is one.
    pub fn maybe_reposition_scroll_to_hashed_anchor(&self) {
        let window = &self.inner.platform.window;
        let hash = window.location().hash;
        let Some(id) = hash.strip_prefix('#').filter(|id| !id.is_empty()) else {
            return;
        };
        if let Some(position) = window.anchor_position(id) {
            self.scroll_to(position);
        }
    }

    pub fn reload_page(&self) {
        tracing::debug!("reloading page");
        self.inner.platform.window.reload();
    }

    /// Applies the position recorded in the current entry now, and again on the next tick to win
    /// over late layout changes.
    pub(super) async fn sync_scroll_position_sync_then_async(&self) {
        let Some(entry) = self
            .inner
            .platform
            .history
            .state()
            .as_ref()
            .and_then(HistoryEntry::from_state)
        else {
            return;
        };

        let position = ScrollPosition::new(entry.scroll_left, entry.scroll_top);
        self.scroll_to(position);
        self.inner.platform.scheduler.next_tick().await;
        self.scroll_to(position);
    }

    /// Without native scroll restoration the browser may jump after a traversal; put the page
    /// back where it was on the next tick.
    fn lock_history_scroll_position(&self) {
        let Some(entry) = self
            .inner
            .platform
            .history
            .state()
            .as_ref()
            .and_then(HistoryEntry::from_state)
        else {
            return;
        };

        let position = ScrollPosition::new(entry.scroll_left, entry.scroll_top);
        let app = Rc::downgrade(&self.inner);
        let tick = self.inner.platform.scheduler.next_tick();
        self.inner.platform.scheduler.spawn_local(
            async move {
                tick.await;
                if let Some(inner) = app.upgrade() {
                    App { inner }.scroll_to(position);
                }
            }
            .boxed_local(),
        );
    }

    pub(super) fn maybe_disable_native_scroll_restoration(&self) {
        let scroll = &self.inner.scroll;
        if !scroll.native_supported {
            return;
        }
        let history = &self.inner.platform.history;
        if scroll.saved_restoration.get().is_none() {
            scroll.saved_restoration.set(history.scroll_restoration());
        }
        history.set_scroll_restoration(ScrollRestoration::Manual);
    }

    pub(super) fn maybe_restore_native_scroll_restoration(&self) {
        let scroll = &self.inner.scroll;
        if !scroll.native_supported {
            return;
        }
        if let Some(mode) = scroll.saved_restoration.take() {
            self.inner.platform.history.set_scroll_restoration(mode);
        }
    }
}
