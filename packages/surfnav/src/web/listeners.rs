use http::Method;
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::{
    Element, Event, EventTarget, File, FormData, HtmlAnchorElement, HtmlFormElement,
    MouseEvent, PopStateEvent,
};

use crate::{
    app::{App, LinkActivation},
    platform::Location,
    transport::FormSubmission,
};

use super::history::state_from_js;

struct Listener {
    target: EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(
        target: EventTarget,
        name: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target,
            name,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.name, self.closure.as_ref().unchecked_ref());
    }
}

/// The document and window listeners driving an [`App`]. Dropping them detaches the app from the
/// page.
pub struct WebListeners {
    _listeners: Vec<Listener>,
}

/// Listen to link clicks, form submissions, traversals, scrolls and the page load, and forward
/// them to `app`.
pub fn attach(app: &App) -> Result<WebListeners, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let document: EventTarget = document.into();
    let window: EventTarget = window.into();

    let listeners = vec![
        Listener::new(document.clone(), "click", {
            let app = app.clone();
            move |event| on_click(&app, &event)
        })?,
        Listener::new(document.clone(), "submit", {
            let app = app.clone();
            move |event| on_submit(&app, &event)
        })?,
        Listener::new(document, "scroll", {
            let app = app.clone();
            move |_| app.on_scroll()
        })?,
        Listener::new(window.clone(), "popstate", {
            let app = app.clone();
            move |event| {
                let state = event
                    .dyn_ref::<PopStateEvent>()
                    .and_then(|event| state_from_js(&event.state()));
                let _ = app.on_popstate(state);
            }
        })?,
        Listener::new(window, "load", {
            let app = app.clone();
            move |_| app.on_load()
        })?,
    ];

    Ok(WebListeners {
        _listeners: listeners,
    })
}

/// The closest ancestor of the event target matching `selector`.
fn delegate_target<T: JsCast>(event: &Event, selector: &str) -> Option<T> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    match target.closest(selector) {
        Ok(found) => found?.dyn_into::<T>().ok(),
        Err(err) => {
            tracing::error!("invalid selector [{selector}]: {err:?}");
            None
        }
    }
}

fn on_click(app: &App, event: &Event) {
    if event.default_prevented() {
        return;
    }
    let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
        return;
    };
    let selector = app.config().link_selector;
    let Some(anchor) = delegate_target::<HtmlAnchorElement>(event, &selector) else {
        return;
    };

    let link = LinkActivation {
        target: Location {
            hostname: anchor.hostname(),
            pathname: anchor.pathname(),
            search: anchor.search(),
            hash: anchor.hash(),
        },
        button: mouse.button(),
        alt_key: mouse.alt_key(),
        ctrl_key: mouse.ctrl_key(),
        meta_key: mouse.meta_key(),
        shift_key: mouse.shift_key(),
    };
    if app.on_link_activate(&link) {
        event.prevent_default();
    }
}

fn on_submit(app: &App, event: &Event) {
    if event.default_prevented() {
        return;
    }
    let selector = app.config().form_selector;
    let Some(form) = delegate_target::<HtmlFormElement>(event, &selector) else {
        return;
    };

    let method = Method::from_bytes(form.method().to_uppercase().as_bytes()).unwrap_or(Method::GET);
    let mut submission = FormSubmission::new(form.action(), method);
    if let Ok(data) = FormData::new_with_form(&form) {
        if let Ok(Some(entries)) = js_sys::try_iter(&data) {
            for entry in entries.flatten() {
                let entry = js_sys::Array::from(&entry);
                let Some(name) = entry.get(0).as_string() else {
                    continue;
                };
                let value = entry.get(1);
                if let Some(value) = value.as_string() {
                    submission = submission.field(name, value);
                } else if value.dyn_ref::<File>().is_some_and(|file| file.size() > 0.0) {
                    submission = submission.file_field(name);
                }
            }
        }
    }

    if app.on_form_submit(submission) {
        event.prevent_default();
    }
}
