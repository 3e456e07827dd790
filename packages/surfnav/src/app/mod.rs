//! The navigation controller.
//!
//! [`App`] owns the route table, the surfaces and the screen cache, and runs every navigation
//! through the same lifecycle:
//!
//! 1. resolve a [`Route`] and obtain a [`Screen`] for the path,
//! 2. wait for the screen to load,
//! 3. deactivate the previous screen, write history and flip the surfaces,
//! 4. restore the scroll position, activate the new screen and evict what is no longer needed.
//!
//! At most one navigation runs at a time: starting a new one cancels the pending one first.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    fmt,
    rc::Rc,
};

use futures_channel::oneshot;
use futures_util::{
    future::{AbortHandle, Abortable, Aborted},
    FutureExt,
};

use crate::{
    config::AppConfig,
    error::{CancelReason, NavigationError},
    history::HistoryEntry,
    navigation::{
        BeforeNavigateFilter, EndNavigate, EndNavigateObserver, NavigateEvent, NavigateRequest,
        Navigation, NavigationContext, NavigationPhase, NavigationState, StartNavigateObserver,
    },
    path,
    platform::{Platform, ScrollPosition},
    route::Route,
    screen::Screen,
    surface::Surface,
};

mod interception;
mod scroll;

pub use interception::*;

struct Active {
    path: String,
    screen: Rc<dyn Screen>,
}

struct Pending {
    id: u64,
    state: Rc<RefCell<NavigationState>>,
    abort: AbortHandle,
}

#[derive(Default)]
struct Hooks {
    before: RefCell<Vec<BeforeNavigateFilter>>,
    start: RefCell<Vec<StartNavigateObserver>>,
    end: RefCell<Vec<EndNavigateObserver>>,
}

impl Hooks {
    fn before_navigate(&self, event: &NavigateEvent) -> Result<(), String> {
        let filters = self.before.borrow().clone();
        filters.iter().try_for_each(|filter| filter(event))
    }

    fn start_navigate(&self, event: &NavigateEvent) {
        let observers = self.start.borrow().clone();
        for observer in observers {
            observer(event);
        }
    }

    fn end_navigate(&self, event: &EndNavigate) {
        let observers = self.end.borrow().clone();
        for observer in observers {
            observer(event);
        }
    }

    fn clear(&self) {
        self.before.borrow_mut().clear();
        self.start.borrow_mut().clear();
        self.end.borrow_mut().clear();
    }
}

pub(crate) struct AppInner {
    platform: Platform,
    config: RefCell<AppConfig>,
    routes: RefCell<Vec<Route>>,
    surfaces: RefCell<BTreeMap<String, Rc<Surface>>>,
    screens: RefCell<HashMap<String, Rc<dyn Screen>>>,
    active: RefCell<Option<Active>>,
    pending: RefCell<Option<Pending>>,
    phase: Cell<NavigationPhase>,
    next_navigation: Cell<u64>,
    hooks: Hooks,
    scroll: scroll::ScrollState,
}

/// The navigation controller. Cloning is cheap and yields a handle to the same controller.
#[derive(Clone)]
pub struct App {
    inner: Rc<AppInner>,
}

impl App {
    /// A controller with the default [`AppConfig`].
    pub fn new(platform: Platform) -> Self {
        Self::with_config(platform, AppConfig::default())
    }

    pub fn with_config(platform: Platform, config: AppConfig) -> Self {
        if !platform.history.is_supported() {
            tracing::warn!("history API is not supported, navigation will not be intercepted");
        }
        let scroll = scroll::ScrollState::new(platform.history.scroll_restoration().is_some());
        Self {
            inner: Rc::new(AppInner {
                platform,
                config: RefCell::new(config),
                routes: RefCell::default(),
                surfaces: RefCell::default(),
                screens: RefCell::default(),
                active: RefCell::default(),
                pending: RefCell::default(),
                phase: Cell::default(),
                next_navigation: Cell::new(0),
                hooks: Hooks::default(),
                scroll,
            }),
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.inner.platform
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> AppConfig {
        self.inner.config.borrow().clone()
    }

    pub fn set_base_path(&self, base_path: impl Into<String>) {
        self.inner.config.borrow_mut().base_path = base_path.into();
    }

    pub fn set_default_title(&self, default_title: impl Into<String>) {
        self.inner.config.borrow_mut().default_title = default_title.into();
    }

    pub fn set_loading_css_class(&self, loading_css_class: impl Into<String>) {
        self.inner.config.borrow_mut().loading_css_class = loading_css_class.into();
    }

    pub fn set_update_scroll_position(&self, update_scroll_position: bool) {
        self.inner.config.borrow_mut().update_scroll_position = update_scroll_position;
    }

    pub fn set_link_selector(&self, link_selector: impl Into<String>) {
        self.inner.config.borrow_mut().link_selector = link_selector.into();
    }

    pub fn set_form_selector(&self, form_selector: impl Into<String>) {
        self.inner.config.borrow_mut().form_selector = form_selector.into();
    }

    pub fn add_route(&self, route: Route) -> &Self {
        self.inner.routes.borrow_mut().push(route);
        self
    }

    /// Register routes. They are tried in registration order.
    pub fn add_routes(&self, routes: impl IntoIterator<Item = Route>) -> &Self {
        self.inner.routes.borrow_mut().extend(routes);
        self
    }

    /// Remove a previously registered route. Returns `true` if it was registered.
    pub fn remove_route(&self, route: &Route) -> bool {
        let mut routes = self.inner.routes.borrow_mut();
        match routes.iter().position(|r| r == route) {
            Some(index) => {
                routes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn has_routes(&self) -> bool {
        !self.inner.routes.borrow().is_empty()
    }

    /// Register a surface. A surface with the same id is replaced.
    pub fn add_surface(&self, surface: impl Into<Surface>) -> &Self {
        let surface = Rc::new(surface.into());
        self.inner
            .surfaces
            .borrow_mut()
            .insert(surface.id().to_string(), surface);
        self
    }

    /// Register surfaces, given as [`Surface`]s or as element ids.
    pub fn add_surfaces<S: Into<Surface>>(&self, surfaces: impl IntoIterator<Item = S>) -> &Self {
        for surface in surfaces {
            self.add_surface(surface);
        }
        self
    }

    pub fn surface(&self, id: &str) -> Option<Rc<Surface>> {
        self.inner.surfaces.borrow().get(id).cloned()
    }

    /// Add a filter that runs before every navigation. Returning `Err` refuses the navigation.
    pub fn on_before_navigate(
        &self,
        filter: impl Fn(&NavigateEvent) -> Result<(), String> + 'static,
    ) {
        self.inner.hooks.before.borrow_mut().push(Rc::new(filter));
    }

    /// Add an observer called when a navigation starts.
    pub fn on_start_navigate(&self, observer: impl Fn(&NavigateEvent) + 'static) {
        self.inner.hooks.start.borrow_mut().push(Rc::new(observer));
    }

    /// Add an observer called when a navigation ends, whatever the outcome.
    pub fn on_end_navigate(&self, observer: impl Fn(&EndNavigate) + 'static) {
        self.inner.hooks.end.borrow_mut().push(Rc::new(observer));
    }

    /// The path of the active screen, as it was navigated to.
    pub fn active_path(&self) -> Option<String> {
        self.inner.active.borrow().as_ref().map(|a| a.path.clone())
    }

    pub fn active_screen(&self) -> Option<Rc<dyn Screen>> {
        self.inner.active.borrow().as_ref().map(|a| a.screen.clone())
    }

    /// The cached screen for `path`, if any.
    pub fn screen_for(&self, path: &str) -> Option<Rc<dyn Screen>> {
        let key = self.cache_key(path);
        self.inner.screens.borrow().get(&key).cloned()
    }

    /// Number of cached screens, the active one included.
    pub fn cached_screens(&self) -> usize {
        self.inner.screens.borrow().len()
    }

    /// The lifecycle phase of the latest navigation.
    pub fn phase(&self) -> NavigationPhase {
        self.inner.phase.get()
    }

    pub fn is_navigating(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    /// The first route, in registration order, that accepts `path`.
    ///
    /// Returns `None` when nothing matches, and when `path` only differs from the current
    /// location by its fragment: hash changes are never routed.
    pub fn find_route(&self, path: &str) -> Option<Route> {
        if path::has_fragment(path) && self.is_path_current_browser_path(path) {
            return None;
        }

        let base = self.inner.config.borrow().base_path.clone();
        let route_path = path::route_path(path, &base);
        let routes = self.inner.routes.borrow().clone();
        routes.into_iter().find(|route| route.matches(route_path))
    }

    /// Whether `path`, ignoring its fragment, is the current location.
    pub fn is_path_current_browser_path(&self, path: &str) -> bool {
        !path.is_empty()
            && path::strip_fragment(path) == self.inner.platform.window.location().path_and_query()
    }

    /// Navigate to `path`.
    pub fn navigate(&self, path: impl Into<String>, replace_history: bool) -> Navigation {
        self.navigate_with(NavigateRequest::new(path).replace_history(replace_history))
    }

    /// Navigate to the current browser location, replacing its history entry.
    pub fn dispatch(&self) -> Navigation {
        let path = self.inner.platform.window.location().full_path();
        self.navigate(path, true)
    }

    /// Start a navigation.
    pub fn navigate_with(&self, mut request: NavigateRequest) -> Navigation {
        if !self.inner.platform.history.is_supported() {
            tracing::warn!("history API is not supported, refusing to navigate");
            return Navigation::rejected(NavigationError::UnsupportedEnvironment);
        }

        // reloading the same path must not push a duplicate entry
        if self.active_path().as_deref() == Some(request.path.as_str()) {
            request.replace_history = true;
        }

        let event = NavigateEvent {
            path: request.path.clone(),
            replace_history: request.replace_history,
            form: request.form.clone(),
        };

        if let Err(reason) = self.inner.hooks.before_navigate(&event) {
            tracing::debug!("navigation to [{}] refused: {reason}", request.path);
            let error = NavigationError::Cancelled(CancelReason::Filtered(reason));
            self.inner.hooks.end_navigate(&EndNavigate {
                path: request.path,
                error: Some(error.clone()),
                form: request.form,
            });
            return Navigation::rejected(error);
        }

        self.inner.hooks.start_navigate(&event);
        self.start_navigate(request)
    }

    fn start_navigate(&self, request: NavigateRequest) -> Navigation {
        let superseded = self.stop_pending_navigate();

        let id = self.inner.next_navigation.get() + 1;
        self.inner.next_navigation.set(id);
        let state = Rc::new(RefCell::new(NavigationState::new(id, &request)));
        self.inner.phase.set(NavigationPhase::Resolving);

        let screen = match self.resolve(&state) {
            Ok(screen) => screen,
            Err(error) => {
                tracing::debug!("navigation to [{}] rejected: {error}", request.path);
                // the superseded navigation leaves its page state to this one
                if superseded {
                    self.restore_after_navigate();
                }
                self.inner.phase.set(Self::failed_phase(&error));
                self.inner.hooks.end_navigate(&EndNavigate {
                    path: request.path,
                    error: Some(error.clone()),
                    form: request.form,
                });
                return Navigation::rejected(error);
            }
        };

        self.maybe_disable_native_scroll_restoration();
        self.inner.scroll.capture_from_scroll_event.set(false);
        let loading_class = self.inner.config.borrow().loading_css_class.clone();
        self.inner.platform.window.add_root_class(&loading_class);

        let (abort, registration) = AbortHandle::new_pair();
        let (tx, rx) = oneshot::channel();
        *self.inner.pending.borrow_mut() = Some(Pending {
            id,
            state: state.clone(),
            abort: abort.clone(),
        });

        let app = self.clone();
        let task = async move {
            let navigation = app.clone().run_navigation(state.clone(), screen);
            let result = match Abortable::new(navigation, registration).await {
                Ok(result) => result,
                Err(Aborted) => Err(app.handle_aborted(&state)),
            };
            app.finish_navigate(&state, &result);
            let _ = tx.send(result);
        };
        self.inner.platform.scheduler.spawn_local(task.boxed_local());

        Navigation::new(rx, abort)
    }

    /// Synchronous part of a navigation: veto check, route lookup and screen instantiation.
    fn resolve(
        &self,
        state: &Rc<RefCell<NavigationState>>,
    ) -> Result<Rc<dyn Screen>, NavigationError> {
        let path = state.borrow().path.clone();

        if let Some(active) = self.active_screen() {
            if active.before_deactivate() {
                return Err(NavigationError::Vetoed { path });
            }
        }

        let route = self
            .find_route(&path)
            .ok_or_else(|| NavigationError::NoRouteFound { path: path.clone() })?;

        tracing::debug!("navigate to [{path}]");
        let screen = self.create_screen_instance(&path, &route);

        state.borrow_mut().screen = Some(screen.clone());
        Ok(screen)
    }

    async fn run_navigation(
        self,
        state: Rc<RefCell<NavigationState>>,
        screen: Rc<dyn Screen>,
    ) -> Result<(), NavigationError> {
        let (path, ctx) = {
            let state = state.borrow();
            (state.path.clone(), state.context())
        };

        self.set_phase(&state, NavigationPhase::Loading);
        if let Err(error) = screen.load(&path, &ctx).await {
            self.handle_navigate_error(&path, &screen, &error);
            return Err(error);
        }

        self.set_phase(&state, NavigationPhase::Flipping);
        if let Some(previous) = self.active_screen() {
            previous.deactivate();
            state.borrow_mut().left_active = true;
        }
        self.prepare_navigate_history(&state, &screen);

        let surfaces = self.surfaces_snapshot();
        if let Err(error) = screen.flip(&surfaces).await {
            self.handle_navigate_error(&path, &screen, &error);
            self.reinstate_active(&state);
            return Err(error);
        }

        self.set_phase(&state, NavigationPhase::Finalizing);
        self.sync_scroll_position_sync_then_async().await;
        self.finalize_navigate(&path, screen);
        Ok(())
    }

    /// Writes the history entry for a loaded screen and updates the document title.
    fn prepare_navigate_history(
        &self,
        state: &Rc<RefCell<NavigationState>>,
        screen: &Rc<dyn Screen>,
    ) {
        let (path, replace_history, is_form_submission) = {
            let state = state.borrow();
            (state.path.clone(), state.replace_history, state.form.is_some())
        };

        let title = screen
            .title()
            .unwrap_or_else(|| self.inner.config.borrow().default_title.clone());

        let mut entry = HistoryEntry::new(screen.before_update_history_path(&path), path);
        entry.is_form_submission = is_form_submission;
        if replace_history {
            let position = self.inner.scroll.popstate_position.take();
            entry.scroll_top = position.y;
            entry.scroll_left = position.x;
        }

        let url = entry.path.clone();
        let history_state = screen
            .before_update_history_state(entry)
            .map(|entry| entry.to_state());

        let history = &self.inner.platform.history;
        if replace_history {
            history.replace_state(history_state, &title, Some(&url));
        } else {
            history.push_state(history_state, &title, &url);
        }
        self.inner.platform.window.set_title(&title);
    }

    fn finalize_navigate(&self, path: &str, screen: Rc<dyn Screen>) {
        screen.activate();

        let previous = self.inner.active.borrow_mut().replace(Active {
            path: path.to_string(),
            screen: screen.clone(),
        });

        if let Some(previous) = previous {
            if !Rc::ptr_eq(&previous.screen, &screen) {
                let key = self.cache_key(&previous.path);
                // a refresh detaches the old instance from the cache, nothing can reuse it
                let detached = !self
                    .inner
                    .screens
                    .borrow()
                    .get(&key)
                    .is_some_and(|cached| Rc::ptr_eq(cached, &previous.screen));
                if !previous.screen.is_cacheable() || detached {
                    self.remove_screen(&key, &previous.screen);
                }
            }
        }

        let key = self.cache_key(path);
        let displaced = self.inner.screens.borrow_mut().insert(key, screen.clone());
        if let Some(displaced) = displaced.filter(|displaced| !Rc::ptr_eq(displaced, &screen)) {
            tracing::debug!("evicting displaced screen [{}]", displaced.id());
            self.dispose_screen(&displaced);
        }
        tracing::debug!("navigation done");
    }

    /// Runs once the navigation task ends, whatever the outcome.
    fn finish_navigate(
        &self,
        state: &Rc<RefCell<NavigationState>>,
        result: &Result<(), NavigationError>,
    ) {
        let phase = match result {
            Ok(()) => NavigationPhase::Idle,
            Err(error) => Self::failed_phase(error),
        };

        let (id, path, form) = {
            let state = state.borrow();
            (state.id, state.path.clone(), state.form.clone())
        };

        // a superseded navigation leaves the page state to the one that replaced it
        let is_current = self
            .inner
            .pending
            .borrow()
            .as_ref()
            .is_some_and(|pending| pending.id == id);
        if is_current {
            self.inner.pending.borrow_mut().take();
            self.restore_after_navigate();
            self.inner.phase.set(phase);
        }

        if let Err(error) = result {
            tracing::debug!("navigation error for [{path}] ({error})");
        }

        self.inner.hooks.end_navigate(&EndNavigate {
            path,
            error: result.as_ref().err().cloned(),
            form,
        });
    }

    /// Undo what starting a navigation changed on the page.
    fn restore_after_navigate(&self) {
        let loading_class = self.inner.config.borrow().loading_css_class.clone();
        self.inner.platform.window.remove_root_class(&loading_class);
        self.maybe_restore_native_scroll_restoration();
        self.inner.scroll.capture_from_scroll_event.set(true);
    }

    /// Cancels the pending navigation, if any, and evicts the screen it was loading. Returns
    /// `true` if a navigation was cancelled.
    fn stop_pending_navigate(&self) -> bool {
        self.cancel_pending(CancelReason::Superseded)
    }

    fn cancel_pending(&self, reason: CancelReason) -> bool {
        let pending = self.inner.pending.borrow_mut().take();
        let Some(pending) = pending else {
            return false;
        };

        let (path, screen) = {
            let mut state = pending.state.borrow_mut();
            state.cancel_reason = Some(reason.clone());
            (state.path.clone(), state.screen.clone())
        };
        tracing::debug!("cancel pending navigation to [{path}]");
        pending.abort.abort();

        if let Some(screen) = screen {
            self.handle_navigate_error(&path, &screen, &NavigationError::Cancelled(reason));
        }
        self.reinstate_active(&pending.state);
        true
    }

    /// Called when the navigation task was aborted. Cleans up after cancellations that did not
    /// come from the controller itself.
    fn handle_aborted(&self, state: &Rc<RefCell<NavigationState>>) -> NavigationError {
        let reason = state.borrow_mut().cancel_reason.take();
        if let Some(reason) = reason {
            return NavigationError::Cancelled(reason);
        }

        let (path, screen) = {
            let state = state.borrow();
            (state.path.clone(), state.screen.clone())
        };
        let error = NavigationError::Cancelled(CancelReason::Aborted);
        if let Some(screen) = screen {
            self.handle_navigate_error(&path, &screen, &error);
        }
        self.reinstate_active(state);
        error
    }

    /// Hands the page back to the active screen when a navigation that already left it does not
    /// complete: its surfaces, the title and the current history entry are restored and it is
    /// activated again.
    fn reinstate_active(&self, state: &Rc<RefCell<NavigationState>>) {
        let left_active = std::mem::take(&mut state.borrow_mut().left_active);
        if !left_active {
            return;
        }
        let Some((path, screen)) = self
            .inner
            .active
            .borrow()
            .as_ref()
            .map(|active| (active.path.clone(), active.screen.clone()))
        else {
            return;
        };

        tracing::debug!("reinstating screen [{}] for [{path}]", screen.id());
        let id = screen.id();
        for surface in self.surfaces_snapshot() {
            if surface.active_screen() == Some(id) {
                continue;
            }
            if let Some(content) = surface.content(id) {
                surface.add_content(id, content, true);
            }
        }

        let title = screen
            .title()
            .unwrap_or_else(|| self.inner.config.borrow().default_title.clone());
        let url = screen.before_update_history_path(&path);
        let entry = screen
            .before_update_history_state(HistoryEntry::new(url.clone(), path))
            .map(|entry| entry.to_state());
        self.inner.platform.history.replace_state(entry, &title, Some(&url));
        self.inner.platform.window.set_title(&title);
        screen.activate();
    }

    fn handle_navigate_error(&self, path: &str, screen: &Rc<dyn Screen>, error: &NavigationError) {
        tracing::debug!("navigation error for screen [{}] ({error})", screen.id());
        let key = self.cache_key(path);
        self.remove_screen(&key, screen);
    }

    /// Loads `path` and caches its screen without activating it.
    pub fn prefetch(&self, path: impl Into<String>) -> Navigation {
        let path = path.into();
        let Some(route) = self.find_route(&path) else {
            return Navigation::rejected(NavigationError::NoRouteFound { path });
        };

        tracing::debug!("prefetching [{path}]");
        let screen = self.create_screen_instance(&path, &route);

        let (abort, registration) = AbortHandle::new_pair();
        let (tx, rx) = oneshot::channel();
        let app = self.clone();
        let task = async move {
            let ctx = NavigationContext::default();
            let result = match Abortable::new(screen.load(&path, &ctx), registration).await {
                Ok(Ok(_)) => {
                    let key = app.cache_key(&path);
                    let occupied = app
                        .inner
                        .screens
                        .borrow()
                        .get(&key)
                        .is_some_and(|cached| !Rc::ptr_eq(cached, &screen));
                    // a navigation cached its own screen for the path meanwhile
                    if occupied {
                        tracing::debug!("dropping prefetched screen for [{path}]");
                        app.dispose_screen(&screen);
                    } else {
                        app.inner.screens.borrow_mut().insert(key, screen.clone());
                    }
                    Ok(())
                }
                Ok(Err(error)) => Err(error),
                Err(Aborted) => Err(NavigationError::Cancelled(CancelReason::Aborted)),
            };
            if let Err(error) = &result {
                app.handle_navigate_error(&path, &screen, error);
            }
            let _ = tx.send(result);
        };
        self.inner.platform.scheduler.spawn_local(task.boxed_local());

        Navigation::new(rx, abort)
    }

    /// Retrieve or create the screen for `path`.
    ///
    /// A cached instance is reused unless `path` is the active path: refreshing builds a new
    /// instance, which inherits the cached content of the one it replaces.
    fn create_screen_instance(&self, path: &str, route: &Route) -> Rc<dyn Screen> {
        let key = self.cache_key(path);

        let mut replaced = None;
        let is_active = self
            .active_path()
            .is_some_and(|active| self.cache_key(&active) == key);
        if is_active {
            tracing::debug!("already at destination, refresh navigation");
            replaced = self.inner.screens.borrow_mut().remove(&key);
        }

        let cached = self.inner.screens.borrow().get(&key).cloned();
        if let Some(screen) = cached {
            return screen;
        }

        tracing::debug!("create screen for [{path}]");
        let screen = route.resolve_handler();
        if let Some(cache) = replaced.and_then(|previous| previous.cache()) {
            screen.add_cache(cache);
        }
        screen
    }

    fn remove_screen(&self, key: &str, screen: &Rc<dyn Screen>) {
        self.dispose_screen(screen);

        let mut screens = self.inner.screens.borrow_mut();
        if screens
            .get(key)
            .is_some_and(|cached| Rc::ptr_eq(cached, screen))
        {
            screens.remove(key);
        }
    }

    /// Remove the content of `screen` from every surface and dispose it.
    fn dispose_screen(&self, screen: &Rc<dyn Screen>) {
        let id = screen.id();
        for surface in self.surfaces_snapshot() {
            surface.remove(id);
        }
        screen.dispose();
    }

    /// Evict every cached screen except the active one.
    pub fn clear_screens_cache(&self) {
        let active = self.active_screen();
        let evicted: Vec<(String, Rc<dyn Screen>)> = self
            .inner
            .screens
            .borrow()
            .iter()
            .filter(|(_, screen)| !active.as_ref().is_some_and(|a| Rc::ptr_eq(a, *screen)))
            .map(|(key, screen)| (key.clone(), screen.clone()))
            .collect();

        for (key, screen) in evicted {
            self.remove_screen(&key, &screen);
        }
    }

    /// Cancel any pending navigation, evict every screen including the active one, and drop all
    /// hooks.
    pub fn dispose(&self) {
        if self.cancel_pending(CancelReason::Disposed) {
            self.restore_after_navigate();
        }

        let active = self.inner.active.borrow_mut().take();
        if let Some(active) = active {
            let key = self.cache_key(&active.path);
            self.remove_screen(&key, &active.screen);
        }
        self.clear_screens_cache();
        self.inner.hooks.clear();
        self.inner.phase.set(NavigationPhase::Idle);
    }

    fn set_phase(&self, state: &Rc<RefCell<NavigationState>>, phase: NavigationPhase) {
        let id = state.borrow().id;
        let is_current = self
            .inner
            .pending
            .borrow()
            .as_ref()
            .is_some_and(|pending| pending.id == id);
        if is_current {
            self.inner.phase.set(phase);
        }
    }

    fn failed_phase(error: &NavigationError) -> NavigationPhase {
        if error.is_cancellation() {
            NavigationPhase::Cancelled
        } else {
            NavigationPhase::Failed
        }
    }

    fn cache_key(&self, path: &str) -> String {
        path::cache_key(path, &self.inner.config.borrow().base_path)
    }

    fn surfaces_snapshot(&self) -> Vec<Rc<Surface>> {
        self.inner.surfaces.borrow().values().cloned().collect()
    }

    fn scroll_to(&self, position: ScrollPosition) {
        if self.inner.config.borrow().update_scroll_position {
            self.inner.platform.window.scroll_to(position);
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("active_path", &self.active_path())
            .field("phase", &self.phase())
            .field("routes", &self.inner.routes.borrow().len())
            .field("surfaces", &self.inner.surfaces.borrow().len())
            .field("screens", &self.inner.screens.borrow().len())
            .finish()
    }
}
