use serde_json::Value;
use wasm_bindgen::JsValue;

use crate::history::{History, ScrollRestoration};

/// Convert a history state to its JSON form. `null` and `undefined` have none.
pub(crate) fn state_from_js(state: &JsValue) -> Option<Value> {
    if state.is_null() || state.is_undefined() {
        return None;
    }
    let stringified = js_sys::JSON::stringify(state).ok()?;
    if stringified.is_undefined() || !stringified.is_valid_utf16() {
        return None;
    }
    let string: String = stringified.into();
    serde_json::from_str(&string).ok()
}

pub(crate) fn state_to_js(state: Option<&Value>) -> JsValue {
    let Some(state) = state else {
        return JsValue::NULL;
    };
    match serde_json::to_string(state) {
        Ok(json) => js_sys::JSON::parse(&json).unwrap_or(JsValue::NULL),
        Err(err) => {
            tracing::error!("failed to serialize history state: {err}");
            JsValue::NULL
        }
    }
}

/// A [`History`] that integrates with a browser via the
/// [History API](https://developer.mozilla.org/en-US/docs/Web/API/History_API).
pub struct WebHistory {
    history: Option<web_sys::History>,
}

impl Default for WebHistory {
    fn default() -> Self {
        let history = web_sys::window().and_then(|window| window.history().ok());
        Self { history }
    }
}

impl WebHistory {
    pub fn new(history: web_sys::History) -> Self {
        Self {
            history: Some(history),
        }
    }
}

impl History for WebHistory {
    fn is_supported(&self) -> bool {
        self.history.is_some()
    }

    fn state(&self) -> Option<Value> {
        let history = self.history.as_ref()?;
        match history.state() {
            Ok(state) => state_from_js(&state),
            Err(err) => {
                tracing::error!("failed to read history state: {err:?}");
                None
            }
        }
    }

    fn push_state(&self, state: Option<Value>, title: &str, url: &str) {
        let Some(history) = &self.history else {
            return;
        };
        let state = state_to_js(state.as_ref());
        if let Err(err) = history.push_state_with_url(&state, title, Some(url)) {
            tracing::error!("failed to push history state: {err:?}");
        }
    }

    fn replace_state(&self, state: Option<Value>, title: &str, url: Option<&str>) {
        let Some(history) = &self.history else {
            return;
        };
        let state = state_to_js(state.as_ref());
        if let Err(err) = history.replace_state_with_url(&state, title, url) {
            tracing::error!("failed to replace history state: {err:?}");
        }
    }

    fn scroll_restoration(&self) -> Option<ScrollRestoration> {
        match self.history.as_ref()?.scroll_restoration().ok()? {
            web_sys::ScrollRestoration::Manual => Some(ScrollRestoration::Manual),
            _ => Some(ScrollRestoration::Auto),
        }
    }

    fn set_scroll_restoration(&self, mode: ScrollRestoration) {
        let Some(history) = &self.history else {
            return;
        };
        let mode = match mode {
            ScrollRestoration::Auto => web_sys::ScrollRestoration::Auto,
            ScrollRestoration::Manual => web_sys::ScrollRestoration::Manual,
        };
        if let Err(err) = history.set_scroll_restoration(mode) {
            tracing::error!("failed to set scroll restoration: {err:?}");
        }
    }
}
