//! Routes bind path patterns to screens.

use std::{fmt, rc::Rc};

use regex::Regex;

use crate::screen::{BasicScreen, Screen};

/// Decides whether a route accepts a path.
///
/// Patterns are tested against the normalized path: no fragment, no query, and no base path.
#[derive(Clone)]
pub enum PathPattern {
    /// The path must equal the string.
    Exact(String),
    /// The path must start with the string.
    Prefix(String),
    /// The regex must match somewhere in the path.
    Regex(Regex),
    /// Any predicate.
    Predicate(Rc<dyn Fn(&str) -> bool>),
}

impl PathPattern {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn predicate(f: impl Fn(&str) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(f))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathPattern::Regex(regex) => regex.is_match(path),
            PathPattern::Predicate(f) => f(path),
        }
    }
}

impl From<&str> for PathPattern {
    fn from(path: &str) -> Self {
        Self::Exact(path.to_string())
    }
}

impl From<String> for PathPattern {
    fn from(path: String) -> Self {
        Self::Exact(path)
    }
}

impl From<Regex> for PathPattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(path) => f.debug_tuple("Exact").field(path).finish(),
            Self::Prefix(path) => f.debug_tuple("Prefix").field(path).finish(),
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

/// How a route produces its screen.
#[derive(Clone)]
pub enum Handler {
    /// A screen type: a fresh instance is built every time.
    Screen(Rc<dyn Fn() -> Rc<dyn Screen>>),
    /// A factory invoked with the route. Producing `None` falls back to a [`BasicScreen`].
    Factory(Rc<dyn Fn(&Route) -> Option<Rc<dyn Screen>>>),
}

struct RouteInner {
    pattern: PathPattern,
    handler: Handler,
}

/// An immutable binding from a [`PathPattern`] to a [`Handler`].
///
/// Cloning is cheap. Two routes are equal only if one is a clone of the other, which is what
/// [`App::remove_route`](crate::app::App::remove_route) relies on.
#[derive(Clone)]
pub struct Route {
    inner: Rc<RouteInner>,
}

impl Route {
    pub fn new(pattern: impl Into<PathPattern>, handler: Handler) -> Self {
        Self {
            inner: Rc::new(RouteInner {
                pattern: pattern.into(),
                handler,
            }),
        }
    }

    /// A route that builds a default `S` for every new screen.
    pub fn screen<S: Screen + Default + 'static>(pattern: impl Into<PathPattern>) -> Self {
        Self::new(
            pattern,
            Handler::Screen(Rc::new(|| Rc::new(S::default()) as Rc<dyn Screen>)),
        )
    }

    /// A route that asks `factory` for every new screen.
    pub fn factory(
        pattern: impl Into<PathPattern>,
        factory: impl Fn(&Route) -> Option<Rc<dyn Screen>> + 'static,
    ) -> Self {
        Self::new(pattern, Handler::Factory(Rc::new(factory)))
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.inner.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.inner.handler
    }

    /// Test a normalized path.
    pub fn matches(&self, path: &str) -> bool {
        self.inner.pattern.matches(path)
    }

    /// Build a new screen for this route.
    pub fn resolve_handler(&self) -> Rc<dyn Screen> {
        match &self.inner.handler {
            Handler::Screen(build) => build(),
            Handler::Factory(factory) => {
                factory(self).unwrap_or_else(|| Rc::new(BasicScreen::default()))
            }
        }
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.inner.pattern)
            .finish_non_exhaustive()
    }
}
