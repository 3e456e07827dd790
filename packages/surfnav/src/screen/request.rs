use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

use async_trait::async_trait;
use futures_util::future::{select, Either};
use http::{
    header::{HeaderName, CONTENT_TYPE},
    HeaderMap, HeaderValue, Method,
};
use url::Url;

use crate::{
    error::{NavigationError, TransportError},
    history::HistoryEntry,
    navigation::NavigationContext,
    platform::Scheduler,
    transport::{Request, Response, Transport},
};

use super::{Content, Screen, ScreenState};

/// Default deadline for a request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type FragmentFn = Rc<dyn Fn(&str, &str) -> Option<Content>>;
type RequestPathFn = Rc<dyn Fn(&str) -> String>;

/// A [`Screen`] that fetches its content through a [`Transport`].
///
/// Successful `GET` responses are cached while the screen is cacheable (the default), so
/// coming back to a cached screen does not hit the network. Navigations that submit a form
/// always `POST` the form and never read from or write to the cache.
///
/// The raw body is the screen's content. How it is split between surfaces is a strategy set
/// with [`RequestScreen::with_fragments`].
pub struct RequestScreen {
    state: ScreenState,
    transport: Rc<dyn Transport>,
    scheduler: Rc<dyn Scheduler>,
    method: Method,
    headers: HeaderMap,
    timeout: Duration,
    last_response: RefCell<Option<Response>>,
    loaded: RefCell<Option<Content>>,
    fragments: Option<FragmentFn>,
    request_path: Option<RequestPathFn>,
}

impl RequestScreen {
    /// A cacheable `GET` screen with the default headers and a 30 second deadline.
    pub fn new(transport: Rc<dyn Transport>, scheduler: Rc<dyn Scheduler>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-pjax"),
            HeaderValue::from_static("true"),
        );
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );

        Self {
            state: ScreenState::new(true),
            transport,
            scheduler,
            method: Method::GET,
            headers,
            timeout: DEFAULT_TIMEOUT,
            last_response: RefCell::new(None),
            loaded: RefCell::new(None),
            fragments: None,
            request_path: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replace the headers sent with every request.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the request deadline. [`Duration::ZERO`] disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cacheable(self, cacheable: bool) -> Self {
        self.state.set_cacheable(cacheable);
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.state.set_title(Some(title.into()));
        self
    }

    /// Derive the fragment for a surface from the loaded body. Called with the body and the
    /// surface id.
    pub fn with_fragments(mut self, f: impl Fn(&str, &str) -> Option<Content> + 'static) -> Self {
        self.fragments = Some(Rc::new(f));
        self
    }

    /// Rewrite the navigation path before it is requested.
    pub fn with_request_path(mut self, f: impl Fn(&str) -> String + 'static) -> Self {
        self.request_path = Some(Rc::new(f));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The last completed response.
    pub fn last_response(&self) -> Option<Response> {
        self.last_response.borrow().clone()
    }

    /// Path, query and fragment of the URL the last response was served from.
    pub fn request_response_path(&self) -> Option<String> {
        let response = self.last_response.borrow();
        let url = &response.as_ref()?.url;
        match Url::parse(url) {
            Ok(url) => {
                let mut path = url.path().to_string();
                if let Some(query) = url.query() {
                    path.push('?');
                    path.push_str(query);
                }
                if let Some(fragment) = url.fragment() {
                    path.push('#');
                    path.push_str(fragment);
                }
                Some(path)
            }
            // already a path
            Err(_) => Some(url.clone()),
        }
    }

    fn build_request(&self, path: &str, ctx: &NavigationContext) -> Request {
        let url = match &self.request_path {
            Some(f) => f(path),
            None => path.to_string(),
        };
        let mut request = Request {
            url,
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: None,
        };
        if let Some(form) = &ctx.form {
            request.method = Method::POST;
            request.body = Some(form.encode());
            request.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }
        request
    }

    async fn send(&self, path: &str, request: Request) -> Result<Response, NavigationError> {
        let response = self.transport.request(request);
        if self.timeout.is_zero() {
            return Ok(response.await?);
        }

        match select(response, self.scheduler.sleep(self.timeout)).await {
            Either::Left((result, _)) => Ok(result?),
            Either::Right(((), pending)) => {
                // dropping the transport future aborts the request
                drop(pending);
                tracing::warn!("request for [{path}] timed out after {:?}", self.timeout);
                Err(NavigationError::Timeout {
                    path: path.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

#[async_trait(?Send)]
impl Screen for RequestScreen {
    fn state(&self) -> &ScreenState {
        &self.state
    }

    async fn load(&self, path: &str, ctx: &NavigationContext) -> Result<Content, NavigationError> {
        if !ctx.is_form_submission() {
            if let Some(cache) = self.cache() {
                tracing::trace!("screen [{}] loaded [{path}] from cache", self.id());
                *self.loaded.borrow_mut() = Some(cache.clone());
                return Ok(cache);
            }
        }

        let request = self.build_request(path, ctx);
        let method = request.method.clone();
        tracing::debug!("screen [{}] requesting {method} [{}]", self.id(), request.url);

        let response = self.send(path, request).await?;
        *self.last_response.borrow_mut() = Some(response.clone());
        if !response.is_success() {
            return Err(TransportError::Status {
                status: response.status,
                url: response.url,
            }
            .into());
        }

        let body = response.body;
        if method == Method::GET && self.is_cacheable() {
            self.add_cache(body.clone());
        }
        *self.loaded.borrow_mut() = Some(body.clone());
        Ok(body)
    }

    fn surface_content(&self, surface_id: &str) -> Option<Content> {
        let fragments = self.fragments.as_ref()?;
        let loaded = self.loaded.borrow();
        fragments(loaded.as_deref()?, surface_id)
    }

    fn dispose(&self) {
        self.loaded.borrow_mut().take();
        self.last_response.borrow_mut().take();
    }

    fn before_update_history_path(&self, path: &str) -> String {
        match self.request_response_path() {
            Some(redirect) if redirect != path => redirect,
            _ => path.to_string(),
        }
    }

    fn before_update_history_state(&self, entry: HistoryEntry) -> Option<HistoryEntry> {
        // a POST without redirect cannot be replayed on traversal, the page must reload instead
        if entry.is_unreplayable_form_post() {
            return None;
        }
        Some(entry)
    }
}

impl fmt::Debug for RequestScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScreen")
            .field("state", &self.state)
            .field("method", &self.method)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
