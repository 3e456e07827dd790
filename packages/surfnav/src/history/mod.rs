//! History integration.
//!
//! The controller relies on a [`History`] implementation to record navigations and to read the
//! state of the current entry back on traversal. Entries written by the controller are
//! [`HistoryEntry`] values serialized to JSON; anything else found in the history stack is
//! treated as foreign.
//!
//! To integrate with any kind of history, implement the [`History`] trait. A [`MemoryHistory`]
//! is provided for headless use and tests; the `web` feature provides one backed by the browser.

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod memory;
pub use memory::*;

/// The browser's own scroll restoration mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScrollRestoration {
    /// The browser restores scroll positions on traversal.
    #[default]
    Auto,
    /// The page is responsible for scroll positions.
    Manual,
}

/// An integration with some kind of navigation history.
///
/// All methods take `&self`; implementations use interior mutability, the controller is
/// single-threaded.
pub trait History {
    /// Whether the environment supports pushing and replacing states. The controller refuses to
    /// navigate when this is `false`.
    fn is_supported(&self) -> bool {
        true
    }

    /// The state attached to the current entry, if any.
    fn state(&self) -> Option<Value>;

    /// Add a new entry on top of the current one, discarding the forward stack.
    fn push_state(&self, state: Option<Value>, title: &str, url: &str);

    /// Replace the current entry. A `url` of `None` keeps the current URL.
    fn replace_state(&self, state: Option<Value>, title: &str, url: Option<&str>);

    /// The current native scroll restoration mode, or `None` when the environment has no such
    /// setting.
    fn scroll_restoration(&self) -> Option<ScrollRestoration> {
        None
    }

    /// Change the native scroll restoration mode. Ignored when unsupported.
    #[allow(unused_variables)]
    fn set_scroll_restoration(&self, mode: ScrollRestoration) {}
}

/// The state the controller stores in each history entry it creates.
///
/// Serialized as `{ "marker": true, "path": ..., "navigatePath": ..., "isFormSubmission": ...,
/// "scrollTop": ..., "scrollLeft": ... }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Always `true` for entries owned by the controller.
    pub marker: bool,
    /// The path recorded in the address bar, after redirects.
    pub path: String,
    /// The path the navigation was started with.
    pub navigate_path: String,
    /// Whether the navigation submitted a form.
    pub is_form_submission: bool,
    pub scroll_top: f64,
    pub scroll_left: f64,
}

impl HistoryEntry {
    /// A fresh entry owned by the controller, scrolled to the top left.
    pub fn new(path: impl Into<String>, navigate_path: impl Into<String>) -> Self {
        Self {
            marker: true,
            path: path.into(),
            navigate_path: navigate_path.into(),
            is_form_submission: false,
            scroll_top: 0.0,
            scroll_left: 0.0,
        }
    }

    /// Read an entry back from a raw history state.
    ///
    /// Returns `None` for states that are missing, malformed, or lack the marker.
    pub fn from_state(state: &Value) -> Option<Self> {
        let entry: Self = serde_json::from_value(state.clone()).ok()?;
        entry.marker.then_some(entry)
    }

    /// Convert into a raw history state.
    pub fn to_state(&self) -> Value {
        // A struct of strings, bools and finite floats always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Whether replaying this entry would resubmit a form without a redirect, which the
    /// controller cannot do.
    pub fn is_unreplayable_form_post(&self) -> bool {
        self.marker && self.is_form_submission && self.navigate_path == self.path
    }
}
