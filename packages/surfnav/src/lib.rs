//! Navigation controller for single page apps.
//!
//! An [`App`] intercepts navigations, matches them against [`Route`](route::Route)s, loads a
//! [`Screen`](screen::Screen) for the destination and swaps its content into the page's
//! [`Surface`](surface::Surface)s, keeping the browser history and scroll position consistent.
//!
//! The controller is independent of the DOM: it talks to its environment through the
//! [`History`](history::History), [`Window`](platform::Window), [`Scheduler`](platform::Scheduler)
//! and [`Transport`](transport::Transport) traits. [`MemoryHistory`](history::MemoryHistory) and
//! [`HeadlessWindow`](platform::HeadlessWindow) run it without a browser; the `web` feature
//! provides the browser implementations.

pub mod app;
pub mod config;
pub mod error;
pub mod history;
pub mod navigation;
pub mod path;
pub mod platform;
pub mod route;
pub mod screen;
pub mod surface;
pub mod transport;

#[cfg(feature = "web")]
pub mod web;

pub use app::{App, LinkActivation};
pub use config::AppConfig;
pub use error::{CancelReason, NavigationError, TransportError};

/// A collection of useful items most applications might need.
pub mod prelude {
    pub use crate::app::{App, LinkActivation};
    pub use crate::config::AppConfig;
    pub use crate::error::{CancelReason, NavigationError, TransportError};
    pub use crate::history::{History, HistoryEntry, MemoryHistory, ScrollRestoration};
    pub use crate::navigation::{
        EndNavigate, NavigateEvent, NavigateRequest, Navigation, NavigationContext,
        NavigationPhase,
    };
    pub use crate::platform::{
        HeadlessWindow, Location, Platform, Scheduler, ScrollPosition, Window,
    };
    pub use crate::route::{Handler, PathPattern, Route};
    pub use crate::screen::{BasicScreen, Content, RequestScreen, Screen, ScreenId, ScreenState};
    pub use crate::surface::{Surface, SurfaceView};
    pub use crate::transport::{FormSubmission, Request, Response, Transport};

    #[cfg(feature = "web")]
    pub use crate::web::*;
}
