//! View router
//!
//! Maps paths to views and manages each view's lifetime. Every navigation:
//!
//! 1. cancels the in-flight navigation, if any
//! 2. awaits the mounted view's cleanup, run on its own task so dropping the
//!    navigation cannot cut it short (errors are logged)
//! 3. resolves the path; unknown paths get the not-found view
//! 4. fetches the markup and mounts it unless cancelled meanwhile
//! 5. runs the view's initializer and keeps the cleanup it returns
//!
//! Teardown and mounting both happen while holding the outlet, so a view is
//! never mounted on top of a half torn-down one. Superseded navigations end
//! as [`NavState::Aborted`] without touching the outlet or the published
//! state.

pub mod cancel;
pub mod history;
pub mod loader;
pub mod route;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub use cancel::{CancellationToken, Cancelled};
pub use history::History;
pub use loader::{BundleLoader, FsBundleLoader};
pub use route::{resolve, Location, Route, ViewDescriptor};

/// Placeholder shown while a view loads
pub const LOADING_MARKUP: &str = "Loading...";

/// Shown when a view fails to load
pub const ERROR_MARKUP: &str = "Failed to load view.";

/// Teardown returned by a view initializer
pub type Cleanup = BoxFuture<'static, anyhow::Result<()>>;

/// Runs after a view's markup is mounted
pub type Initializer =
    Arc<dyn Fn(ViewContext) -> BoxFuture<'static, anyhow::Result<Option<Cleanup>>> + Send + Sync>;

/// Box a future as a view cleanup
pub fn cleanup<F>(future: F) -> Cleanup
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    future.boxed()
}

/// What a view initializer is given
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub route: Route,
    pub location: Location,
    pub markup: String,
    /// Cancelled when the user navigates away; check before applying late results
    pub token: CancellationToken,
}

/// Navigation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Loading(Route),
    Mounted(Route),
    Aborted(Route),
    Failed { route: Route, message: String },
}

/// The region views are mounted into
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outlet {
    pub title: String,
    pub content: String,
}

#[derive(Default)]
struct Slot {
    outlet: Outlet,
    mounted: Option<Route>,
    cleanup: Option<Cleanup>,
    teardown: Option<JoinHandle<anyhow::Result<()>>>,
}

impl Slot {
    /// Run the mounted view's cleanup to completion
    ///
    /// The cleanup runs on its own task and its handle stays in the slot
    /// until it finishes, so a navigation dropped mid-teardown leaves the
    /// wait to the next one.
    async fn tear_down(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            self.teardown = Some(tokio::spawn(cleanup));
        }
        if let Some(handle) = self.teardown.as_mut() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("View cleanup failed: {:#}", e),
                Err(e) => error!("View cleanup task failed: {}", e),
            }
            self.teardown = None;
        }
    }
}

pub struct Router<L> {
    loader: L,
    base_path: String,
    initializers: HashMap<Route, Initializer>,
    current: Mutex<CancellationToken>,
    slot: tokio::sync::Mutex<Slot>,
    history: Mutex<History>,
    state: watch::Sender<NavState>,
}

impl<L: BundleLoader> Router<L> {
    pub fn new(loader: L, base_path: impl Into<String>) -> Self {
        let (state, _) = watch::channel(NavState::Idle);
        Self {
            loader,
            base_path: base_path.into(),
            initializers: HashMap::new(),
            current: Mutex::new(CancellationToken::new()),
            slot: tokio::sync::Mutex::new(Slot::default()),
            history: Mutex::new(History::default()),
            state,
        }
    }

    /// Attach an initializer to a route
    pub fn with_initializer<F>(mut self, route: Route, init: F) -> Self
    where
        F: Fn(ViewContext) -> BoxFuture<'static, anyhow::Result<Option<Cleanup>>>
            + Send
            + Sync
            + 'static,
    {
        self.initializers.insert(route, Arc::new(init));
        self
    }

    pub fn state(&self) -> NavState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NavState> {
        self.state.subscribe()
    }

    /// Snapshot of the outlet
    pub async fn outlet(&self) -> Outlet {
        self.slot.lock().await.outlet.clone()
    }

    pub async fn mounted(&self) -> Option<Route> {
        self.slot.lock().await.mounted
    }

    pub fn current_path(&self) -> String {
        self.history().current().to_string()
    }

    /// Initial load of `path`
    pub async fn start(&self, path: &str) -> NavState {
        self.history().replace(path);
        self.navigate(path).await
    }

    /// Programmatic navigation: record the path, then load it
    pub async fn push(&self, path: &str) -> NavState {
        self.history().push(path);
        self.navigate(path).await
    }

    /// Go back one entry; `None` at the start of history
    pub async fn back(&self) -> Option<NavState> {
        let path = self.history().back()?.to_string();
        Some(self.navigate(&path).await)
    }

    /// Go forward one entry; `None` at the end of history
    pub async fn forward(&self) -> Option<NavState> {
        let path = self.history().forward()?.to_string();
        Some(self.navigate(&path).await)
    }

    /// Load the view for `path` into the outlet
    pub async fn navigate(&self, path: &str) -> NavState {
        let (route, location) = resolve(path, &self.base_path);
        let token = CancellationToken::new();
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            current.cancel();
            *current = token.clone();
        }
        debug!("Navigating to {} ({})", location.path, route);

        // Teardown
        {
            let mut slot = self.slot.lock().await;
            if token.is_cancelled() {
                return aborted(route);
            }
            slot.tear_down().await;
            slot.mounted = None;
            slot.outlet = Outlet {
                title: route.descriptor().title.to_string(),
                content: LOADING_MARKUP.to_string(),
            };
            self.state.send_replace(NavState::Loading(route));
        }

        // Fetch
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => return aborted(route),
            result = self.loader.load(route.descriptor().source) => result,
        };

        // Mount
        let mut slot = self.slot.lock().await;
        if token.is_cancelled() {
            return aborted(route);
        }

        let markup = match fetched {
            Ok(markup) => markup,
            Err(e) => {
                error!("Failed to load view {}: {:#}", route, e);
                slot.outlet.content = ERROR_MARKUP.to_string();
                return self.publish(NavState::Failed {
                    route,
                    message: format!("{:#}", e),
                });
            }
        };

        slot.outlet.content = markup.clone();
        slot.mounted = Some(route);

        if let Some(init) = self.initializers.get(&route) {
            let context = ViewContext {
                route,
                location,
                markup,
                token: token.clone(),
            };
            match init(context).await {
                Ok(cleanup) => slot.cleanup = cleanup,
                Err(e) => {
                    error!("View {} failed to initialize: {:#}", route, e);
                    slot.mounted = None;
                    slot.outlet.content = ERROR_MARKUP.to_string();
                    return self.publish(NavState::Failed {
                        route,
                        message: format!("{:#}", e),
                    });
                }
            }
        }

        info!("Mounted {}", route);
        self.publish(NavState::Mounted(route))
    }

    /// Cancel any navigation and tear down the mounted view
    pub async fn shutdown(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();

        let mut slot = self.slot.lock().await;
        slot.tear_down().await;
        slot.mounted = None;
        self.state.send_replace(NavState::Idle);
    }

    fn publish(&self, state: NavState) -> NavState {
        self.state.send_replace(state.clone());
        state
    }

    fn history(&self) -> std::sync::MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn aborted(route: Route) -> NavState {
    debug!("Navigation to {} superseded", route);
    NavState::Aborted(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Serves fixed markup after a per-source delay
    struct SlowLoader {
        delays: HashMap<&'static str, u64>,
    }

    impl SlowLoader {
        fn new() -> Self {
            Self {
                delays: HashMap::new(),
            }
        }

        fn delay(mut self, source: &'static str, ms: u64) -> Self {
            self.delays.insert(source, ms);
            self
        }
    }

    impl BundleLoader for SlowLoader {
        fn load(&self, source: &'static str) -> BoxFuture<'_, anyhow::Result<String>> {
            let delay = self.delays.get(source).copied().unwrap_or(0);
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if source == "user/options" {
                    anyhow::bail!("network down");
                }
                Ok(format!("<{}>", source))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_navigate_mounts_view() {
        let router = Router::new(SlowLoader::new(), "");

        let state = router.navigate("/add").await;
        assert_eq!(state, NavState::Mounted(Route::AddBook));
        assert_eq!(router.state(), NavState::Mounted(Route::AddBook));
        assert_eq!(
            router.outlet().await,
            Outlet {
                title: "Add".into(),
                content: "<book/add>".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_path_mounts_not_found() {
        let router = Router::new(SlowLoader::new(), "");
        assert_eq!(
            router.navigate("/missing").await,
            NavState::Mounted(Route::NotFound)
        );
        assert_eq!(router.outlet().await.title, "404");
    }

    #[tokio::test]
    async fn test_load_failure_is_contained() {
        let router = Router::new(SlowLoader::new(), "");

        let state = router.navigate("/user").await;
        assert!(matches!(state, NavState::Failed { route: Route::Options, .. }));
        assert_eq!(router.outlet().await.content, ERROR_MARKUP);
        assert_eq!(router.mounted().await, None);

        // The router keeps working
        assert_eq!(
            router.navigate("/home").await,
            NavState::Mounted(Route::Collection)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_is_aborted() {
        let router = Arc::new(Router::new(
            SlowLoader::new().delay("book/add", 500),
            "",
        ));

        let first = {
            let router = router.clone();
            tokio::spawn(async move { router.navigate("/add").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = router.navigate("/book").await;

        assert_eq!(second, NavState::Mounted(Route::Book));
        assert_eq!(first.await.unwrap(), NavState::Aborted(Route::AddBook));
        assert_eq!(router.mounted().await, Some(Route::Book));
        assert_eq!(router.outlet().await.content, "<book/view>");
        assert_eq!(router.state(), NavState::Mounted(Route::Book));
    }

    #[tokio::test]
    async fn test_cleanup_runs_before_next_view() {
        let events = Arc::new(Mutex::new(Vec::<String>::new()));

        let add_events = events.clone();
        let book_events = events.clone();
        let router = Router::new(SlowLoader::new(), "")
            .with_initializer(Route::AddBook, move |_ctx| {
                let events = add_events.clone();
                async move {
                    events.lock().unwrap().push("init add".into());
                    let cleanup_events = events.clone();
                    Ok(Some(cleanup(async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        cleanup_events.lock().unwrap().push("cleanup add".into());
                        Ok(())
                    })))
                }
                .boxed()
            })
            .with_initializer(Route::Book, move |ctx| {
                let events = book_events.clone();
                async move {
                    let id = ctx.location.param("id").unwrap_or_default();
                    events.lock().unwrap().push(format!("init book {}", id));
                    Ok(None)
                }
                .boxed()
            });

        router.navigate("/add").await;
        router.navigate("/book?id=7").await;

        assert_eq!(
            *events.lock().unwrap(),
            vec!["init add", "cleanup add", "init book 7"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_navigation_still_finishes_cleanup() {
        let camera_stopped = Arc::new(Mutex::new(false));
        let flag = camera_stopped.clone();
        let router = Router::new(SlowLoader::new(), "").with_initializer(Route::AddBook, move |_ctx| {
            let flag = flag.clone();
            async move {
                Ok(Some(cleanup(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    *flag.lock().unwrap() = true;
                    Ok(())
                })))
            }
            .boxed()
        });

        router.navigate("/add").await;
        let dropped =
            tokio::time::timeout(Duration::from_millis(10), router.navigate("/home")).await;
        assert!(dropped.is_err());
        assert!(!*camera_stopped.lock().unwrap());

        // The next navigation waits for the interrupted teardown
        assert_eq!(router.navigate("/book").await, NavState::Mounted(Route::Book));
        assert!(*camera_stopped.lock().unwrap());
    }

    #[tokio::test]
    async fn test_failing_cleanup_does_not_block_navigation() {
        let router = Router::new(SlowLoader::new(), "").with_initializer(Route::AddBook, |_ctx| {
            async { Ok(Some(cleanup(async { anyhow::bail!("camera stuck") }))) }.boxed()
        });

        router.navigate("/add").await;
        assert_eq!(
            router.navigate("/home").await,
            NavState::Mounted(Route::Collection)
        );
    }

    #[tokio::test]
    async fn test_failing_initializer_is_contained() {
        let router = Router::new(SlowLoader::new(), "").with_initializer(Route::Book, |_ctx| {
            async { Err(anyhow::anyhow!("no such book")) }.boxed()
        });

        let state = router.navigate("/book?id=missing").await;
        assert!(matches!(state, NavState::Failed { route: Route::Book, .. }));
        assert_eq!(router.outlet().await.content, ERROR_MARKUP);
    }

    #[tokio::test]
    async fn test_history_drives_navigation() {
        let router = Router::new(SlowLoader::new(), "/shelf");

        router.start("/shelf/home").await;
        router.push("/shelf/add").await;
        router.push("/shelf/user?tab=theme").await;

        assert_eq!(
            router.back().await,
            Some(NavState::Mounted(Route::AddBook))
        );
        assert_eq!(
            router.back().await,
            Some(NavState::Mounted(Route::Collection))
        );
        assert_eq!(router.back().await, None);
        assert_eq!(
            router.forward().await,
            Some(NavState::Mounted(Route::AddBook))
        );
        assert_eq!(router.current_path(), "/shelf/add");
    }

    #[tokio::test]
    async fn test_shutdown_runs_cleanup() {
        let cleaned = Arc::new(Mutex::new(false));
        let flag = cleaned.clone();
        let router = Router::new(SlowLoader::new(), "").with_initializer(Route::AddBook, move |_ctx| {
            let flag = flag.clone();
            async move {
                Ok(Some(cleanup(async move {
                    *flag.lock().unwrap() = true;
                    Ok(())
                })))
            }
            .boxed()
        });

        router.navigate("/add").await;
        router.shutdown().await;

        assert!(*cleaned.lock().unwrap());
        assert_eq!(router.state(), NavState::Idle);
        assert_eq!(router.mounted().await, None);
    }
}
