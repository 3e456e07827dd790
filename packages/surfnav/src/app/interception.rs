use http::Method;

use crate::{
    navigation::NavigateRequest, path, platform::Location, transport::FormSubmission,
};

use super::App;

/// Mouse button number of the primary button.
const PRIMARY_BUTTON: i16 = 0;

/// A click on a link matching the configured link selector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkActivation {
    /// The link target.
    pub target: Location,
    pub button: i16,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
}

impl LinkActivation {
    /// A plain primary-button click on `target`.
    pub fn new(target: Location) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// A plain click on `href`, resolved against `hostname`.
    pub fn from_href(href: &str, hostname: &str) -> Option<Self> {
        Location::parse(href, hostname).map(Self::new)
    }

    fn is_plain_click(&self) -> bool {
        self.button == PRIMARY_BUTTON
            && !(self.alt_key || self.ctrl_key || self.meta_key || self.shift_key)
    }
}

impl App {
    /// Handle a link activation. Returns `true` when the controller took over the navigation and
    /// the default browser action must be prevented.
    pub fn on_link_activate(&self, link: &LinkActivation) -> bool {
        if !link.is_plain_click() {
            tracing::debug!("navigate aborted, invalid mouse button or modifier key pressed");
            return false;
        }
        self.maybe_navigate_to_link(&link.target, None)
    }

    /// Handle a form submission. Returns `true` when the controller took over the navigation and
    /// the default browser action must be prevented. `GET` forms are left to the browser.
    pub fn on_form_submit(&self, form: FormSubmission) -> bool {
        if form.method == Method::GET {
            tracing::debug!("GET method not supported");
            return false;
        }
        if form.has_files() {
            tracing::debug!("form [{}] uploads files, leaving it to the browser", form.action);
            return false;
        }

        let hostname = self.inner.platform.window.location().hostname;
        let Some(target) = Location::parse(&form.action, &hostname) else {
            tracing::debug!("form action [{}] is not a valid URL", form.action);
            return false;
        };
        self.maybe_navigate_to_link(&target, Some(form))
    }

    fn maybe_navigate_to_link(&self, target: &Location, form: Option<FormSubmission>) -> bool {
        if !self.inner.platform.history.is_supported() {
            return false;
        }

        if target.hostname != self.inner.platform.window.location().hostname {
            tracing::debug!("offsite link clicked");
            return false;
        }

        let path = target.full_path();
        let base = self.inner.config.borrow().base_path.clone();
        if !path::has_base(&path, &base) {
            tracing::debug!("link clicked outside app's base path");
            return false;
        }

        if self.find_route(&path).is_none() {
            tracing::debug!("no route for [{path}], leaving it to the browser");
            return false;
        }

        let mut request = NavigateRequest::new(path);
        if let Some(form) = form {
            request = request.form(form);
        }
        // the navigation runs on the scheduler, its outcome reaches the end-navigate observers
        let _ = self.navigate_with(request);
        true
    }
}
