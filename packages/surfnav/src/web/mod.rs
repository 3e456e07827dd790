//! Browser implementations of the platform traits, and the listeners that feed browser events to
//! an [`App`](crate::app::App).

use std::rc::Rc;

use crate::platform::Platform;

mod fetch;
mod history;
mod listeners;
mod window;

pub use fetch::*;
pub use history::*;
pub use listeners::*;
pub use window::*;

/// The platform of the current browser window. `None` outside of a window context, such as a
/// web worker.
pub fn web_platform() -> Option<Platform> {
    let window = WebWindow::new()?;
    Some(Platform::new(
        Rc::new(WebHistory::default()),
        Rc::new(window),
        Rc::new(WebScheduler),
    ))
}
