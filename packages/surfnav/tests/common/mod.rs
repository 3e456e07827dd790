#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
    time::Duration,
};

use async_trait::async_trait;
use futures::{
    channel::oneshot,
    executor::{LocalPool, LocalSpawner},
    future::LocalBoxFuture,
    task::LocalSpawnExt,
    FutureExt,
};
use surfnav::prelude::*;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Resolves on the second poll.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// A single-threaded scheduler with a manual clock.
pub struct TestScheduler {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    now: Cell<Duration>,
    timers: RefCell<Vec<(Duration, oneshot::Sender<()>)>>,
}

impl Default for TestScheduler {
    fn default() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            spawner,
            now: Cell::default(),
            timers: RefCell::default(),
        }
    }
}

impl TestScheduler {
    /// Run every task until none can make progress.
    pub fn run(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Move the clock forward, fire the expired timers and run.
    pub fn advance(&self, duration: Duration) {
        let now = self.now.get() + duration;
        self.now.set(now);

        let expired: Vec<_> = {
            let mut timers = self.timers.borrow_mut();
            let (expired, pending): (Vec<_>, Vec<_>) = timers
                .drain(..)
                .partition(|(deadline, _)| *deadline <= now);
            *timers = pending;
            expired
        };
        for (_, tx) in expired {
            let _ = tx.send(());
        }
        self.run();
    }
}

impl Scheduler for TestScheduler {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        self.spawner
            .spawn_local(future)
            .expect("the pool outlives the scheduler");
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        if duration.is_zero() {
            return YieldNow(false).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        self.timers
            .borrow_mut()
            .push((self.now.get() + duration, tx));
        rx.map(|_| ()).boxed_local()
    }
}

type Reply = Result<Response, TransportError>;

/// A transport answering from canned replies. Held URLs park their requests until released.
#[derive(Default)]
pub struct FakeTransport {
    replies: RefCell<HashMap<String, Reply>>,
    held: RefCell<HashSet<String>>,
    parked: RefCell<Vec<(String, oneshot::Sender<Reply>)>>,
    requests: RefCell<Vec<Request>>,
    aborted: Rc<Cell<usize>>,
}

struct AbortCounter {
    aborted: Rc<Cell<usize>>,
    done: bool,
}

impl Drop for AbortCounter {
    fn drop(&mut self) {
        if !self.done {
            self.aborted.set(self.aborted.get() + 1);
        }
    }
}

impl FakeTransport {
    pub fn serve(&self, url: &str, body: &str) {
        self.reply(url, 200, url, body);
    }

    /// Serve `body` as if the request for `url` was redirected to `final_url`.
    pub fn redirect(&self, url: &str, final_url: &str, body: &str) {
        self.reply(url, 200, final_url, body);
    }

    pub fn reply(&self, url: &str, status: u16, final_url: &str, body: &str) {
        self.replies.borrow_mut().insert(
            url.to_string(),
            Ok(Response {
                url: final_url.to_string(),
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, url: &str, error: TransportError) {
        self.replies.borrow_mut().insert(url.to_string(), Err(error));
    }

    /// Park requests for `url` until [`FakeTransport::release`].
    pub fn hold(&self, url: &str) {
        self.held.borrow_mut().insert(url.to_string());
    }

    /// Answer the parked requests for `url` and stop holding it.
    pub fn release(&self, url: &str) {
        self.held.borrow_mut().remove(url);
        let parked: Vec<_> = {
            let mut parked = self.parked.borrow_mut();
            let (release, keep): (Vec<_>, Vec<_>) = parked.drain(..).partition(|(u, _)| u == url);
            *parked = keep;
            release
        };
        for (url, tx) in parked {
            let _ = tx.send(self.canned(&url));
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.url == url).count()
    }

    /// Number of requests dropped before they completed.
    pub fn aborted(&self) -> usize {
        self.aborted.get()
    }

    fn canned(&self, url: &str) -> Reply {
        self.replies
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Network(format!("no reply for {url}"))))
    }
}

#[async_trait(?Send)]
impl Transport for FakeTransport {
    async fn request(&self, request: Request) -> Result<Response, TransportError> {
        let url = request.url.clone();
        self.requests.borrow_mut().push(request);

        if !self.held.borrow().contains(&url) {
            return self.canned(&url);
        }

        let (tx, rx) = oneshot::channel();
        self.parked.borrow_mut().push((url, tx));
        let mut counter = AbortCounter {
            aborted: self.aborted.clone(),
            done: false,
        };
        let reply = rx.await.unwrap_or(Err(TransportError::Aborted));
        counter.done = true;
        reply
    }
}

pub type Journal = Rc<RefCell<Vec<String>>>;

/// A screen that writes its lifecycle to a journal. A gated screen parks its flip, after the
/// content is applied, until the gate opens or is dropped.
pub struct TracedScreen {
    state: ScreenState,
    name: String,
    journal: Journal,
    veto: Rc<Cell<bool>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl TracedScreen {
    pub fn new(name: &str, journal: &Journal, veto: &Rc<Cell<bool>>) -> Self {
        Self {
            state: ScreenState::default(),
            name: name.to_string(),
            journal: journal.clone(),
            veto: veto.clone(),
            gate: RefCell::new(None),
        }
    }

    pub fn gated(self, gate: oneshot::Receiver<()>) -> Self {
        *self.gate.borrow_mut() = Some(gate);
        self
    }

    fn log(&self, event: &str) {
        self.journal
            .borrow_mut()
            .push(format!("{event} {}", self.name));
    }
}

#[async_trait(?Send)]
impl Screen for TracedScreen {
    fn state(&self) -> &ScreenState {
        &self.state
    }

    async fn load(
        &self,
        _path: &str,
        _ctx: &NavigationContext,
    ) -> Result<Content, NavigationError> {
        self.log("load");
        Ok(self.name.clone())
    }

    fn surface_content(&self, surface_id: &str) -> Option<Content> {
        Some(format!("{}:{surface_id}", self.name))
    }

    async fn flip(&self, surfaces: &[Rc<Surface>]) -> Result<(), NavigationError> {
        for surface in surfaces {
            surface.add_content(self.id(), self.surface_content(surface.id()), true);
        }
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(())
    }

    fn before_deactivate(&self) -> bool {
        self.veto.get()
    }

    fn activate(&self) {
        self.log("activate");
    }

    fn deactivate(&self) {
        self.log("deactivate");
    }

    fn dispose(&self) {
        self.log("dispose");
    }

    fn title(&self) -> Option<String> {
        Some(self.name.to_uppercase())
    }
}

/// An app on an in-memory platform, with a `header` and a `body` surface.
pub struct Harness {
    pub app: App,
    pub history: Rc<MemoryHistory>,
    pub window: Rc<HeadlessWindow>,
    pub scheduler: Rc<TestScheduler>,
    pub transport: Rc<FakeTransport>,
    pub events: Journal,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_history(MemoryHistory::with_initial_path("/"))
    }

    pub fn with_history(history: MemoryHistory) -> Self {
        init_logging();

        let history = Rc::new(history);
        let window = Rc::new(HeadlessWindow::new(history.clone()));
        let scheduler = Rc::new(TestScheduler::default());
        let transport = Rc::new(FakeTransport::default());

        let app = App::with_config(
            Platform::new(history.clone(), window.clone(), scheduler.clone()),
            AppConfig::default().default_title("Default"),
        );
        app.add_surfaces(["header", "body"]);

        let events: Journal = Rc::default();
        app.on_start_navigate({
            let events = events.clone();
            move |event| events.borrow_mut().push(format!("start {}", event.path))
        });
        app.on_end_navigate({
            let events = events.clone();
            move |event| {
                let outcome = match &event.error {
                    None => "ok".to_string(),
                    Some(error) => error.to_string(),
                };
                events
                    .borrow_mut()
                    .push(format!("end {} {outcome}", event.path));
            }
        });

        Self {
            app,
            history,
            window,
            scheduler,
            transport,
            events,
        }
    }

    /// A route serving `path` through a [`RequestScreen`] that hands `surface:body` to every
    /// surface.
    pub fn request_route(&self, path: &str) -> Route {
        self.request_route_with(path, |screen| screen)
    }

    pub fn request_route_with(
        &self,
        path: &str,
        configure: impl Fn(RequestScreen) -> RequestScreen + 'static,
    ) -> Route {
        let transport = self.transport.clone();
        let scheduler = self.scheduler.clone();
        Route::factory(path, move |_| {
            let screen = RequestScreen::new(transport.clone(), scheduler.clone())
                .with_fragments(|body, surface| Some(format!("{surface}:{body}")));
            Some(Rc::new(configure(screen)) as Rc<dyn Screen>)
        })
    }

    /// Serve and route `path`.
    pub fn page(&self, path: &str, body: &str) -> Route {
        self.transport.serve(path, body);
        let route = self.request_route(path);
        self.app.add_route(route.clone());
        route
    }

    pub fn surface_content(&self, surface: &str) -> Option<String> {
        self.app.surface(surface)?.active_content()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Navigate and run until the navigation settles.
    pub fn visit(&self, path: &str) -> Result<(), NavigationError> {
        let navigation = self.app.navigate(path, false);
        self.scheduler.run();
        navigation
            .now_or_never()
            .expect("navigation settled after running the scheduler")
    }
}
