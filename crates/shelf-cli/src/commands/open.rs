//! View rendering through the router

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use futures_util::FutureExt;

use shelf_core::router::{FsBundleLoader, ViewContext};
use shelf_core::{Book, Config, Library, NavState, Route, Router};

use crate::output::Output;

/// Resolve `path` to a view, mount it and print the outlet
///
/// The book view needs an `id` query parameter naming an existing book.
pub async fn open(library: Library, config: &Config, path: String, output: &Output) -> Result<()> {
    let library = Arc::new(Mutex::new(library));
    let detail: Arc<Mutex<Option<Book>>> = Arc::default();

    let loader = FsBundleLoader::new(config.views_path());
    let router = {
        let library = library.clone();
        let detail = detail.clone();
        Router::new(loader, config.base_path.clone()).with_initializer(
            Route::Book,
            move |ctx: ViewContext| {
                let library = library.clone();
                let detail = detail.clone();
                async move {
                    let id = ctx
                        .location
                        .param("id")
                        .context("The book view needs an id parameter")?;
                    let uuid = uuid::Uuid::parse_str(&id)
                        .with_context(|| format!("Invalid book id: {}", id))?;
                    let book = library
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .book(uuid)?;
                    ctx.token.check()?;
                    *detail.lock().unwrap_or_else(PoisonError::into_inner) = Some(book);
                    Ok::<_, anyhow::Error>(None)
                }
                .boxed()
            },
        )
    };

    let state = router.start(&path).await;
    let outlet = router.outlet().await;
    router.shutdown().await;

    match state {
        NavState::Mounted(route) => {
            output.message(&format!("{} ({})", outlet.title, route.path()));
            output.message(&outlet.content);
            let book = detail.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(book) = book {
                output.print_book(&book, None, 0);
            }
            Ok(())
        }
        NavState::Failed { route, message } => {
            bail!("Failed to open {} view: {}", route, message)
        }
        other => bail!("Navigation did not complete: {:?}", other),
    }
}
