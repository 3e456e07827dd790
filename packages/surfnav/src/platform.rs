//! The environment the controller runs in.
//!
//! Everything the controller needs from the outside world besides history and transport is
//! consumed through the [`Window`] and [`Scheduler`] traits. [`Platform`] bundles them with a
//! [`History`] so the controller can be built in one call.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeSet, HashMap},
    rc::Rc,
    time::Duration,
};

use futures_util::future::LocalBoxFuture;
use url::Url;

use crate::history::{History, MemoryHistory};

/// A scroll offset of the viewport, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The parts of the current URL the controller looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub hostname: String,
    /// Always starts with `/`.
    pub pathname: String,
    /// Empty or starting with `?`.
    pub search: String,
    /// Empty or starting with `#`.
    pub hash: String,
}

impl Location {
    /// Parse an absolute URL, or a path resolved against `http://{hostname}`.
    pub fn parse(url: &str, hostname: &str) -> Option<Self> {
        let base = Url::parse(&format!("http://{hostname}/")).ok()?;
        let url = base.join(url).ok()?;
        Some(Self {
            hostname: url.host_str().unwrap_or_default().to_string(),
            pathname: url.path().to_string(),
            search: url.query().map(|q| format!("?{q}")).unwrap_or_default(),
            hash: url.fragment().map(|f| format!("#{f}")).unwrap_or_default(),
        })
    }

    /// `pathname` followed by `search`.
    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }

    /// `pathname`, `search` and `hash`.
    pub fn full_path(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// The DOM and window capabilities the controller consumes.
pub trait Window {
    /// The current location.
    fn location(&self) -> Location;

    /// The current scroll offset of the page.
    fn scroll_position(&self) -> ScrollPosition;

    /// Scroll the page.
    fn scroll_to(&self, position: ScrollPosition);

    /// Set the document title.
    fn set_title(&self, title: &str);

    /// Add a class to the document element.
    fn add_root_class(&self, class: &str);

    /// Remove a class from the document element.
    fn remove_root_class(&self, class: &str);

    /// The offset of the element with the given id, if such an element exists.
    fn anchor_position(&self, id: &str) -> Option<ScrollPosition>;

    /// Reload the whole page from the server.
    fn reload(&self);
}

/// The cooperative scheduler the controller runs its tasks on.
pub trait Scheduler {
    /// Run `future` to completion on the current thread.
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);

    /// Resolve after `duration`.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;

    /// Resolve on a later turn of the event loop.
    fn next_tick(&self) -> LocalBoxFuture<'static, ()> {
        self.sleep(Duration::ZERO)
    }
}

/// The collaborators a controller needs.
#[derive(Clone)]
pub struct Platform {
    pub history: Rc<dyn History>,
    pub window: Rc<dyn Window>,
    pub scheduler: Rc<dyn Scheduler>,
}

impl Platform {
    pub fn new(
        history: Rc<dyn History>,
        window: Rc<dyn Window>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            history,
            window,
            scheduler,
        }
    }
}

/// A [`Window`] that keeps everything in memory and reads its location from a
/// [`MemoryHistory`].
pub struct HeadlessWindow {
    history: Rc<MemoryHistory>,
    hostname: String,
    scroll: Cell<ScrollPosition>,
    scroll_log: RefCell<Vec<ScrollPosition>>,
    title: RefCell<String>,
    classes: RefCell<BTreeSet<String>>,
    anchors: RefCell<HashMap<String, ScrollPosition>>,
    reloads: Cell<usize>,
    hash_override: RefCell<Option<String>>,
}

impl HeadlessWindow {
    pub fn new(history: Rc<MemoryHistory>) -> Self {
        Self {
            history,
            hostname: "localhost".to_string(),
            scroll: Cell::default(),
            scroll_log: RefCell::default(),
            title: RefCell::default(),
            classes: RefCell::default(),
            anchors: RefCell::default(),
            reloads: Cell::new(0),
            hash_override: RefCell::default(),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Register an element that [`Window::anchor_position`] can find.
    pub fn add_anchor(&self, id: impl Into<String>, position: ScrollPosition) {
        self.anchors.borrow_mut().insert(id.into(), position);
    }

    /// Force the hash reported by [`Window::location`], as after a hash-only traversal.
    pub fn set_hash(&self, hash: Option<&str>) {
        *self.hash_override.borrow_mut() = hash.map(str::to_string);
    }

    /// Simulate the user scrolling.
    pub fn set_scroll(&self, position: ScrollPosition) {
        self.scroll.set(position);
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn has_root_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }

    /// Every position passed to [`Window::scroll_to`], oldest first.
    pub fn scroll_log(&self) -> Vec<ScrollPosition> {
        self.scroll_log.borrow().clone()
    }
}

impl Window for HeadlessWindow {
    fn location(&self) -> Location {
        let mut location = Location::parse(&self.history.current_url(), &self.hostname)
            .unwrap_or_else(|| Location {
                hostname: self.hostname.clone(),
                pathname: "/".to_string(),
                ..Default::default()
            });
        if let Some(hash) = self.hash_override.borrow().as_ref() {
            location.hash = hash.clone();
        }
        location
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.scroll.get()
    }

    fn scroll_to(&self, position: ScrollPosition) {
        self.scroll.set(position);
        self.scroll_log.borrow_mut().push(position);
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }

    fn add_root_class(&self, class: &str) {
        self.classes.borrow_mut().insert(class.to_string());
    }

    fn remove_root_class(&self, class: &str) {
        self.classes.borrow_mut().remove(class);
    }

    fn anchor_position(&self, id: &str) -> Option<ScrollPosition> {
        self.anchors.borrow().get(id).copied()
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}
