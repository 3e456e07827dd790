use std::time::Duration;

use futures_util::{future::LocalBoxFuture, FutureExt};
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::{
    platform::{Location, Scheduler, ScrollPosition, Window},
    screen::ScreenId,
    surface::SurfaceView,
};

/// The browser window and its document.
pub struct WebWindow {
    window: web_sys::Window,
    document: Document,
}

impl WebWindow {
    /// The current window. `None` without a window or a document.
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    fn root_class_list(&self) -> Option<web_sys::DomTokenList> {
        self.document
            .document_element()
            .map(|root| root.class_list())
    }
}

impl Window for WebWindow {
    fn location(&self) -> Location {
        let location = self.window.location();
        Location {
            hostname: location.hostname().unwrap_or_default(),
            pathname: location.pathname().unwrap_or_else(|_| String::from("/")),
            search: location.search().unwrap_or_default(),
            hash: location.hash().unwrap_or_default(),
        }
    }

    fn scroll_position(&self) -> ScrollPosition {
        ScrollPosition {
            x: self.window.scroll_x().unwrap_or_default(),
            y: self.window.scroll_y().unwrap_or_default(),
        }
    }

    fn scroll_to(&self, position: ScrollPosition) {
        self.window.scroll_to_with_x_and_y(position.x, position.y);
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }

    fn add_root_class(&self, class: &str) {
        if let Some(Err(err)) = self.root_class_list().map(|list| list.add_1(class)) {
            tracing::error!("failed to add class [{class}]: {err:?}");
        }
    }

    fn remove_root_class(&self, class: &str) {
        if let Some(Err(err)) = self.root_class_list().map(|list| list.remove_1(class)) {
            tracing::error!("failed to remove class [{class}]: {err:?}");
        }
    }

    fn anchor_position(&self, id: &str) -> Option<ScrollPosition> {
        let element = self.document.get_element_by_id(id)?;
        let element = element.dyn_ref::<HtmlElement>()?;
        Some(ScrollPosition {
            x: element.offset_left().into(),
            y: element.offset_top().into(),
        })
    }

    fn reload(&self) {
        if let Err(err) = self.window.location().reload() {
            tracing::error!("failed to reload: {err:?}");
        }
    }
}

/// Runs tasks on the browser event loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebScheduler;

impl Scheduler for WebScheduler {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(millis).boxed_local()
    }
}

/// Renders a surface into the element with the same id.
pub struct WebSurfaceView {
    id: String,
    document: Document,
}

impl WebSurfaceView {
    /// A view of the element `id` in the current document.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self {
            id: id.into(),
            document,
        })
    }
}

impl SurfaceView for WebSurfaceView {
    fn show(&self, screen_id: ScreenId, content: Option<&str>) {
        let Some(content) = content else {
            return;
        };
        match self.document.get_element_by_id(&self.id) {
            Some(element) => element.set_inner_html(content),
            None => tracing::warn!(
                "surface element [{}] not found, content of [{screen_id}] dropped",
                self.id
            ),
        }
    }
}
