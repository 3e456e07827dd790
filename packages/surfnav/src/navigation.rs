//! Types relating to navigation.

use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use futures_channel::oneshot;
use futures_util::{future::AbortHandle, FutureExt};

use crate::{
    error::{CancelReason, NavigationError},
    screen::Screen,
    transport::FormSubmission,
};

/// A request to navigate somewhere.
#[derive(Clone, Debug, Default)]
pub struct NavigateRequest {
    /// Path to navigate to, including the base path. May contain a query and a fragment.
    pub path: String,
    /// Replace the current history entry instead of pushing a new one.
    pub replace_history: bool,
    /// The form being submitted, if the navigation was started by a form.
    pub form: Option<Rc<FormSubmission>>,
}

impl NavigateRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn replace_history(self, replace_history: bool) -> Self {
        Self {
            replace_history,
            ..self
        }
    }

    pub fn form(self, form: FormSubmission) -> Self {
        Self {
            form: Some(Rc::new(form)),
            ..self
        }
    }
}

/// Data handed to [`Screen::load`] for one navigation.
#[derive(Clone, Debug, Default)]
pub struct NavigationContext {
    /// The submitted form, for navigations started by a form submission.
    pub form: Option<Rc<FormSubmission>>,
}

impl NavigationContext {
    pub fn is_form_submission(&self) -> bool {
        self.form.is_some()
    }
}

/// Where a navigation is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationPhase {
    /// Nothing is running; the last navigation, if any, succeeded.
    #[default]
    Idle,
    /// Looking up the route and screen.
    Resolving,
    /// Waiting for the screen to load its content.
    Loading,
    /// Writing history and swapping surfaces.
    Flipping,
    /// Restoring scroll and activating the screen.
    Finalizing,
    /// The last navigation was cancelled or vetoed.
    Cancelled,
    /// The last navigation failed.
    Failed,
}

/// Payload of the before-navigate filters and the start-navigate observers.
#[derive(Clone, Debug)]
pub struct NavigateEvent {
    pub path: String,
    pub replace_history: bool,
    pub form: Option<Rc<FormSubmission>>,
}

/// Payload of the end-navigate observers. Sent once for every navigation that got past the
/// environment check, whatever its outcome.
#[derive(Clone, Debug)]
pub struct EndNavigate {
    pub path: String,
    pub error: Option<NavigationError>,
    pub form: Option<Rc<FormSubmission>>,
}

/// A filter that can refuse a navigation before it starts. The returned reason is reported as
/// [`CancelReason::Filtered`].
pub type BeforeNavigateFilter = Rc<dyn Fn(&NavigateEvent) -> Result<(), String>>;

/// An observer called when a navigation starts.
pub type StartNavigateObserver = Rc<dyn Fn(&NavigateEvent)>;

/// An observer called when a navigation ends.
pub type EndNavigateObserver = Rc<dyn Fn(&EndNavigate)>;

/// The transient state of one in-flight navigation.
pub(crate) struct NavigationState {
    pub(crate) id: u64,
    pub(crate) path: String,
    pub(crate) replace_history: bool,
    pub(crate) screen: Option<Rc<dyn Screen>>,
    pub(crate) form: Option<Rc<FormSubmission>>,
    /// Set by the controller when it cancels the navigation itself.
    pub(crate) cancel_reason: Option<CancelReason>,
    /// The active screen was deactivated and history written for this navigation.
    pub(crate) left_active: bool,
}

impl NavigationState {
    pub(crate) fn new(id: u64, request: &NavigateRequest) -> Self {
        Self {
            id,
            path: request.path.clone(),
            replace_history: request.replace_history,
            screen: None,
            form: request.form.clone(),
            cancel_reason: None,
            left_active: false,
        }
    }

    pub(crate) fn context(&self) -> NavigationContext {
        NavigationContext {
            form: self.form.clone(),
        }
    }
}

/// A running navigation.
///
/// Resolves once the navigation has completed, failed, or been cancelled. Dropping the handle
/// does not stop the navigation; call [`Navigation::cancel`] for that.
#[must_use = "navigations run in the background; await the handle to observe the outcome"]
pub struct Navigation {
    result: oneshot::Receiver<Result<(), NavigationError>>,
    abort: Option<AbortHandle>,
}

impl Navigation {
    pub(crate) fn new(
        result: oneshot::Receiver<Result<(), NavigationError>>,
        abort: AbortHandle,
    ) -> Self {
        Self {
            result,
            abort: Some(abort),
        }
    }

    /// A navigation that already failed.
    pub(crate) fn rejected(error: NavigationError) -> Self {
        let (tx, result) = oneshot::channel();
        let _ = tx.send(Err(error));
        Self {
            result,
            abort: None,
        }
    }

    /// Stop the navigation. In-flight requests are aborted and no further lifecycle step runs;
    /// the handle resolves with [`NavigationError::Cancelled`].
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }
}

impl Future for Navigation {
    type Output = Result<(), NavigationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.result.poll_unpin(cx).map(|result| {
            result.unwrap_or_else(|_| Err(NavigationError::Cancelled(CancelReason::Aborted)))
        })
    }
}

impl std::fmt::Debug for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigation")
            .field("cancellable", &self.abort.is_some())
            .finish()
    }
}
