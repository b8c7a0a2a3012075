//! Navigation ordering under rapid path changes

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use shelf_core::router::{cleanup, BundleLoader, FsBundleLoader, ViewContext};
use shelf_core::{NavState, Route, Router};
use tempfile::TempDir;

type Events = Arc<Mutex<Vec<String>>>;

/// Markup arrives after a fixed delay
struct DelayedLoader(Duration);

impl BundleLoader for DelayedLoader {
    fn load(&self, source: &'static str) -> BoxFuture<'_, anyhow::Result<String>> {
        let delay = self.0;
        async move {
            tokio::time::sleep(delay).await;
            Ok(format!("<main data-view=\"{}\"></main>", source))
        }
        .boxed()
    }
}

/// Initializer that logs its lifecycle and holds a slow cleanup
fn tracked(
    name: &'static str,
    events: Events,
) -> impl Fn(ViewContext) -> BoxFuture<'static, anyhow::Result<Option<shelf_core::router::Cleanup>>>
       + Send
       + Sync
       + 'static {
    move |_ctx: ViewContext| {
        let events = events.clone();
        async move {
            events.lock().unwrap().push(format!("init {}", name));
            let done = events.clone();
            Ok::<_, anyhow::Error>(Some(cleanup(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                done.lock().unwrap().push(format!("cleanup {}", name));
                Ok(())
            })))
        }
        .boxed()
    }
}

#[tokio::test(start_paused = true)]
async fn test_rapid_navigation_mounts_only_last_view() {
    let events: Events = Arc::default();
    let router = Arc::new(
        Router::new(DelayedLoader(Duration::from_millis(200)), "")
            .with_initializer(Route::AddBook, tracked("add", events.clone()))
            .with_initializer(Route::Book, tracked("book", events.clone())),
    );

    let to_a = {
        let router = router.clone();
        tokio::spawn(async move { router.push("/add").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let to_b = router.push("/book?id=1").await;

    assert_eq!(to_a.await.unwrap(), NavState::Aborted(Route::AddBook));
    assert_eq!(to_b, NavState::Mounted(Route::Book));
    assert_eq!(router.mounted().await, Some(Route::Book));
    assert_eq!(*events.lock().unwrap(), vec!["init book"]);
}

#[tokio::test(start_paused = true)]
async fn test_previous_cleanup_completes_before_next_init() {
    let events: Events = Arc::default();
    let router = Arc::new(
        Router::new(DelayedLoader(Duration::from_millis(10)), "")
            .with_initializer(Route::AddBook, tracked("add", events.clone()))
            .with_initializer(Route::Book, tracked("book", events.clone())),
    );

    assert_eq!(router.push("/add").await, NavState::Mounted(Route::AddBook));

    // Two navigations in flight while A's cleanup is still sleeping
    let to_home = {
        let router = router.clone();
        tokio::spawn(async move { router.push("/home").await })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    let to_book = router.push("/book").await;

    assert_eq!(to_book, NavState::Mounted(Route::Book));
    assert_eq!(to_home.await.unwrap(), NavState::Aborted(Route::Collection));
    assert_eq!(
        *events.lock().unwrap(),
        vec!["init add", "cleanup add", "init book"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_late_result_checks_cancellation() {
    let applied = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let log = applied.clone();
    let router = Arc::new(
        Router::new(DelayedLoader(Duration::ZERO), "").with_initializer(
            Route::Collection,
            move |ctx: ViewContext| {
                let log = log.clone();
                async move {
                    // Background work that outlives the view
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        if ctx.token.is_cancelled() {
                            return;
                        }
                        log.lock().unwrap().push("late grid render");
                    });
                    Ok::<_, anyhow::Error>(None)
                }
                .boxed()
            },
        ),
    );

    router.push("/home").await;
    router.push("/user").await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(applied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fs_loader_with_router() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("collection")).unwrap();
    std::fs::write(
        temp_dir.path().join("collection/home.html"),
        "<section id=\"grid\"></section>",
    )
    .unwrap();

    let router = Router::new(FsBundleLoader::new(temp_dir.path()), "/shelf");

    assert_eq!(
        router.start("/shelf/").await,
        NavState::Mounted(Route::Collection)
    );
    let outlet = router.outlet().await;
    assert_eq!(outlet.title, "My books");
    assert_eq!(outlet.content, "<section id=\"grid\"></section>");

    // No markup on disk for the add view
    assert!(matches!(
        router.push("/shelf/add").await,
        NavState::Failed { route: Route::AddBook, .. }
    ));
}
