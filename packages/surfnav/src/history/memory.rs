use std::cell::{Cell, RefCell};

use serde_json::Value;

use super::{History, ScrollRestoration};

/// One entry of a [`MemoryHistory`].
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryEntry {
    pub url: String,
    pub title: String,
    pub state: Option<Value>,
}

struct MemoryHistoryState {
    current: MemoryEntry,
    history: Vec<MemoryEntry>,
    future: Vec<MemoryEntry>,
}

/// A [`History`] that stores all entries in memory.
///
/// Traversal ([`go_back`](MemoryHistory::go_back) / [`go_forward`](MemoryHistory::go_forward))
/// only moves the cursor; feeding the resulting state to
/// [`App::on_popstate`](crate::app::App::on_popstate) is up to the caller, the same way a
/// browser fires `popstate` separately from moving through its stack.
pub struct MemoryHistory {
    state: RefCell<MemoryHistoryState>,
    supported: bool,
    scroll_restoration: Cell<Option<ScrollRestoration>>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::with_initial_path("/")
    }
}

impl MemoryHistory {
    /// Create a [`MemoryHistory`] whose only entry is `path`, without state.
    pub fn with_initial_path(path: impl ToString) -> Self {
        Self {
            state: MemoryHistoryState {
                current: MemoryEntry {
                    url: path.to_string(),
                    title: String::new(),
                    state: None,
                },
                history: Vec::new(),
                future: Vec::new(),
            }
            .into(),
            supported: true,
            scroll_restoration: Cell::new(None),
        }
    }

    /// Pretend the environment has no history API.
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    /// Pretend the environment supports native scroll restoration, starting in `mode`.
    pub fn with_scroll_restoration(self, mode: ScrollRestoration) -> Self {
        self.scroll_restoration.set(Some(mode));
        self
    }

    /// The current entry.
    pub fn current(&self) -> MemoryEntry {
        self.state.borrow().current.clone()
    }

    /// The URL of the current entry.
    pub fn current_url(&self) -> String {
        self.state.borrow().current.url.clone()
    }

    /// Number of entries before the current one.
    pub fn len_back(&self) -> usize {
        self.state.borrow().history.len()
    }

    pub fn can_go_back(&self) -> bool {
        !self.state.borrow().history.is_empty()
    }

    /// Move one entry back and return the state of the new current entry.
    pub fn go_back(&self) -> Option<Value> {
        let mut write = self.state.borrow_mut();
        if let Some(last) = write.history.pop() {
            let old = std::mem::replace(&mut write.current, last);
            write.future.push(old);
        }
        write.current.state.clone()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.state.borrow().future.is_empty()
    }

    /// Move one entry forward and return the state of the new current entry.
    pub fn go_forward(&self) -> Option<Value> {
        let mut write = self.state.borrow_mut();
        if let Some(next) = write.future.pop() {
            let old = std::mem::replace(&mut write.current, next);
            write.history.push(old);
        }
        write.current.state.clone()
    }
}

impl History for MemoryHistory {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn state(&self) -> Option<Value> {
        self.state.borrow().current.state.clone()
    }

    fn push_state(&self, state: Option<Value>, title: &str, url: &str) {
        let mut write = self.state.borrow_mut();
        let new = MemoryEntry {
            url: url.to_string(),
            title: title.to_string(),
            state,
        };
        let old = std::mem::replace(&mut write.current, new);
        write.history.push(old);
        write.future.clear();
    }

    fn replace_state(&self, state: Option<Value>, title: &str, url: Option<&str>) {
        let mut write = self.state.borrow_mut();
        write.current.state = state;
        write.current.title = title.to_string();
        if let Some(url) = url {
            write.current.url = url.to_string();
        }
    }

    fn scroll_restoration(&self) -> Option<ScrollRestoration> {
        self.scroll_restoration.get()
    }

    fn set_scroll_restoration(&self, mode: ScrollRestoration) {
        if self.scroll_restoration.get().is_some() {
            self.scroll_restoration.set(Some(mode));
        }
    }
}
