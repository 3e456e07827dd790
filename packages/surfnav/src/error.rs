use std::time::Duration;

/// Why a navigation was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// A newer navigation started before this one finished.
    Superseded,
    /// A before-navigate filter refused the navigation.
    Filtered(String),
    /// The caller cancelled the [`Navigation`](crate::navigation::Navigation) handle.
    Aborted,
    /// The app was disposed while the navigation was running.
    Disposed,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Superseded => f.write_str("cancel pending navigation"),
            CancelReason::Filtered(reason) => write!(f, "refused by filter: {reason}"),
            CancelReason::Aborted => f.write_str("cancelled by caller"),
            CancelReason::Disposed => f.write_str("app disposed"),
        }
    }
}

/// A failure reported by a [`Transport`](crate::transport::Transport).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a status that is not a success.
    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// The request was aborted before it completed.
    #[error("request aborted")]
    Aborted,
}

/// Everything that can make a navigation fail.
///
/// All failures of a started navigation are reported both through the returned
/// [`Navigation`](crate::navigation::Navigation) and the end-navigate hooks.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// No registered route accepts the path, or the path only changes the fragment of the
    /// current location.
    #[error("no route for {path}")]
    NoRouteFound { path: String },

    /// The navigation was cancelled before it completed.
    #[error("navigation cancelled: {0}")]
    Cancelled(CancelReason),

    /// The active screen refused to deactivate.
    #[error("cancelled by active screen while navigating to {path}")]
    Vetoed { path: String },

    /// Loading the screen content took longer than the configured deadline.
    #[error("request for {path} timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The environment has no usable history API.
    #[error("history API is not supported, navigation will not be intercepted")]
    UnsupportedEnvironment,
}

impl NavigationError {
    /// Returns `true` for cancellations and vetoes, the failures that are part of normal
    /// navigation flow rather than errors worth reporting.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::Vetoed { .. })
    }
}
