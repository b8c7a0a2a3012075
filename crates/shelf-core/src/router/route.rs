//! Static route table

use std::fmt;

/// Every view the application can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Collection,
    AddBook,
    Book,
    Options,
    Annotations,
    NotFound,
}

/// What a route mounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDescriptor {
    /// Bundle name, e.g. `book/add`
    pub source: &'static str,
    /// Page heading
    pub title: &'static str,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Collection,
        Route::AddBook,
        Route::Book,
        Route::Options,
        Route::Annotations,
        Route::NotFound,
    ];

    /// Map a bare path (no base path, no query) to its route
    pub fn from_path(path: &str) -> Route {
        match path {
            "/" | "/home" | "/collection" => Route::Collection,
            "/add" => Route::AddBook,
            "/book" => Route::Book,
            "/user" => Route::Options,
            "/annotation" => Route::Annotations,
            _ => Route::NotFound,
        }
    }

    pub fn descriptor(&self) -> ViewDescriptor {
        let (source, title) = match self {
            Route::Collection => ("collection/home", "My books"),
            Route::AddBook => ("book/add", "Add"),
            Route::Book => ("book/view", "Book"),
            Route::Options => ("user/options", "User"),
            Route::Annotations => ("collection/annotation", "Annotations"),
            Route::NotFound => ("collection/index", "404"),
        };
        ViewDescriptor { source, title }
    }

    /// Path used when navigating to this route
    pub fn path(&self) -> &'static str {
        match self {
            Route::Collection => "/home",
            Route::AddBook => "/add",
            Route::Book => "/book",
            Route::Options => "/user",
            Route::Annotations => "/annotation",
            Route::NotFound => "/404",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().source)
    }
}

/// A resolved path with its query string split off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
}

impl Location {
    /// Split `raw` into path and query, removing `base_path` from the front
    pub fn parse(raw: &str, base_path: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (raw, None),
        };

        let base = base_path.trim_end_matches('/');
        let path = if base.is_empty() {
            path
        } else {
            match path.strip_prefix(base) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
                _ => path,
            }
        };
        let path = if path.is_empty() { "/" } else { path };

        Self {
            path: path.to_string(),
            query: query.filter(|q| !q.is_empty()),
        }
    }

    /// Decoded query parameters in order
    pub fn params(&self) -> Vec<(String, String)> {
        let Some(query) = &self.query else {
            return Vec::new();
        };
        match reqwest::Url::parse(&format!("http://localhost/?{}", query)) {
            Ok(url) => url.query_pairs().into_owned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// First value of a query parameter
    pub fn param(&self, name: &str) -> Option<String> {
        self.params()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Resolve a raw path to its route
pub fn resolve(raw: &str, base_path: &str) -> (Route, Location) {
    let location = Location::parse(raw, base_path);
    (Route::from_path(&location.path), location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(Route::from_path("/"), Route::Collection);
        assert_eq!(Route::from_path("/home"), Route::Collection);
        assert_eq!(Route::from_path("/collection"), Route::Collection);
        assert_eq!(Route::from_path("/add"), Route::AddBook);
        assert_eq!(Route::from_path("/book"), Route::Book);
        assert_eq!(Route::from_path("/user"), Route::Options);
        assert_eq!(Route::from_path("/annotation"), Route::Annotations);
        assert_eq!(Route::from_path("/nope"), Route::NotFound);
        assert_eq!(Route::from_path("/add/"), Route::NotFound);
    }

    #[test]
    fn test_every_route_path_resolves_to_itself() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_descriptors() {
        assert_eq!(Route::AddBook.descriptor().source, "book/add");
        assert_eq!(Route::Collection.descriptor().title, "My books");
        assert_eq!(Route::NotFound.descriptor().title, "404");
    }

    #[test]
    fn test_query_is_split_off() {
        let (route, location) = resolve("/book?id=42&tab=notes", "");
        assert_eq!(route, Route::Book);
        assert_eq!(location.path, "/book");
        assert_eq!(location.param("id").as_deref(), Some("42"));
        assert_eq!(location.param("tab").as_deref(), Some("notes"));
        assert_eq!(location.param("missing"), None);
    }

    #[test]
    fn test_query_values_are_decoded() {
        let location = Location::parse("/annotation?search=dune%20messiah&x=a+b", "");
        assert_eq!(location.param("search").as_deref(), Some("dune messiah"));
        assert_eq!(location.param("x").as_deref(), Some("a b"));
    }

    #[test]
    fn test_base_path_is_stripped() {
        assert_eq!(resolve("/shelf/add", "/shelf").0, Route::AddBook);
        assert_eq!(resolve("/shelf", "/shelf").0, Route::Collection);
        assert_eq!(resolve("/shelf/", "/shelf/").0, Route::Collection);
        // Only whole segments match
        assert_eq!(resolve("/shelfish/add", "/shelf").1.path, "/shelfish/add");
    }

    #[test]
    fn test_empty_path_is_root() {
        let (route, location) = resolve("?id=1", "");
        assert_eq!(route, Route::Collection);
        assert_eq!(location.path, "/");
    }
}
