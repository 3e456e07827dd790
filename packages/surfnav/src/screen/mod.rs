//! Screens: the units of navigable content.
//!
//! A [`Screen`] produces the content for one path, hands a fragment of it to each
//! [`Surface`], and receives lifecycle callbacks as the controller moves between screens.
//! Implementations compose a [`ScreenState`] for the bookkeeping every screen shares, and
//! override whichever hooks they need.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;

use crate::{
    error::NavigationError, history::HistoryEntry, navigation::NavigationContext,
    surface::Surface,
};

mod request;
pub use request::*;

/// Content produced by a screen. Opaque to the controller.
pub type Content = String;

/// Identifies a screen instance. Surfaces key the content they hold by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenId(u64);

impl ScreenId {
    /// A process-wide unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen_{}", self.0)
    }
}

/// The capabilities the controller needs from a navigable screen.
///
/// Only [`Screen::state`] is required. The defaults describe a screen that loads nothing, is
/// not cacheable, and hands no fragment to any surface.
#[async_trait(?Send)]
pub trait Screen {
    /// The shared bookkeeping of this screen.
    fn state(&self) -> &ScreenState;

    /// The key surfaces store this screen's content under.
    fn id(&self) -> ScreenId {
        self.state().id()
    }

    /// Produce the content for `path`.
    ///
    /// Implementations must return cached content, when there is any, without fetching it again.
    async fn load(
        &self,
        _path: &str,
        _ctx: &NavigationContext,
    ) -> Result<Content, NavigationError> {
        Ok(self.cache().unwrap_or_default())
    }

    /// The fragment destined for the surface with the given id, derived from what was loaded.
    fn surface_content(&self, _surface_id: &str) -> Option<Content> {
        None
    }

    /// Apply this screen's content to the surfaces.
    async fn flip(&self, surfaces: &[Rc<Surface>]) -> Result<(), NavigationError> {
        let id = self.id();
        for surface in surfaces {
            let content = self.surface_content(surface.id());
            tracing::trace!(
                "screen [{id}] add content to surface [{}] [{}]",
                surface.id(),
                if content.is_some() { "..." } else { "empty" }
            );
            surface.add_content(id, content, true);
        }
        Ok(())
    }

    /// Return `true` to refuse leaving this screen while it is active.
    fn before_deactivate(&self) -> bool {
        false
    }

    /// Called once when this screen stops being the active one.
    fn deactivate(&self) {}

    /// Called once when this screen becomes the active one.
    fn activate(&self) {}

    /// Called once when the controller evicts this screen.
    fn dispose(&self) {}

    /// Rewrite the path recorded in history.
    fn before_update_history_path(&self, path: &str) -> String {
        path.to_string()
    }

    /// Rewrite the state recorded in history. Returning `None` records an entry the controller
    /// will not restore, so traversing back to it reloads the page.
    fn before_update_history_state(&self, entry: HistoryEntry) -> Option<HistoryEntry> {
        Some(entry)
    }

    fn is_cacheable(&self) -> bool {
        self.state().is_cacheable()
    }

    fn add_cache(&self, content: Content) {
        self.state().add_cache(content);
    }

    fn cache(&self) -> Option<Content> {
        self.state().cache()
    }

    /// The document title while this screen is active. `None` falls back to the app default.
    fn title(&self) -> Option<String> {
        self.state().title()
    }
}

/// Bookkeeping shared by every screen: identity, cacheability, cached content and title.
pub struct ScreenState {
    id: ScreenId,
    cacheable: Cell<bool>,
    cache: RefCell<Option<Content>>,
    title: RefCell<Option<String>>,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ScreenState {
    pub fn new(cacheable: bool) -> Self {
        Self {
            id: ScreenId::next(),
            cacheable: Cell::new(cacheable),
            cache: RefCell::new(None),
            title: RefCell::new(None),
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable.get()
    }

    pub fn set_cacheable(&self, cacheable: bool) {
        self.cacheable.set(cacheable);
    }

    pub fn add_cache(&self, content: Content) {
        *self.cache.borrow_mut() = Some(content);
    }

    pub fn cache(&self) -> Option<Content> {
        self.cache.borrow().clone()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().take();
    }

    pub fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }

    pub fn set_title(&self, title: Option<String>) {
        *self.title.borrow_mut() = title;
    }
}

impl fmt::Debug for ScreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenState")
            .field("id", &self.id)
            .field("cacheable", &self.cacheable.get())
            .field("cached", &self.cache.borrow().is_some())
            .finish()
    }
}

/// The empty screen used when a route factory produces nothing.
#[derive(Debug, Default)]
pub struct BasicScreen {
    state: ScreenState,
}

impl Screen for BasicScreen {
    fn state(&self) -> &ScreenState {
        &self.state
    }
}
