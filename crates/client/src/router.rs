//! Request routing: which requests the worker intercepts and how.

use crate::fetch::{Request, same_origin};
use reqwest::Method;
use serde::Serialize;
use url::Url;

/// Dispatch decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Not intercepted: normal network handling, no cache side effects.
    PassThrough,
    NetworkFirst,
    CacheFirst,
}

/// Route a request issued by a page of `origin`.
///
/// Non-GET and cross-origin requests pass through. Documents go
/// network-first; every other destination goes cache-first.
pub fn route(request: &Request, origin: &Url) -> Route {
    if request.method != Method::GET || !same_origin(&request.url, origin) {
        return Route::PassThrough;
    }

    if request.is_document() { Route::NetworkFirst } else { Route::CacheFirst }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Destination;

    fn origin() -> Url {
        Url::parse("https://blog.example.com").unwrap()
    }

    fn request(method: Method, url: &str, destination: Destination) -> Request {
        Request::new(method, url, Some(&origin())).unwrap().with_destination(destination)
    }

    #[test]
    fn test_document_is_network_first() {
        let r = request(Method::GET, "/posts/hello/", Destination::Document);
        assert_eq!(route(&r, &origin()), Route::NetworkFirst);
    }

    #[test]
    fn test_assets_are_cache_first() {
        for destination in
            [Destination::Script, Destination::Style, Destination::Image, Destination::Font, Destination::Empty]
        {
            let r = request(Method::GET, "/assets/app.js", destination);
            assert_eq!(route(&r, &origin()), Route::CacheFirst, "{destination}");
        }
    }

    #[test]
    fn test_non_get_passes_through() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let r = request(method, "/posts/", Destination::Document);
            assert_eq!(route(&r, &origin()), Route::PassThrough);
        }
    }

    #[test]
    fn test_cross_origin_passes_through() {
        let cdn = request(Method::GET, "https://cdn.jsdelivr.net/npm/fuse.js", Destination::Script);
        assert_eq!(route(&cdn, &origin()), Route::PassThrough);

        let other_scheme = request(Method::GET, "http://blog.example.com/", Destination::Document);
        assert_eq!(route(&other_scheme, &origin()), Route::PassThrough);

        let other_port = request(Method::GET, "https://blog.example.com:8443/", Destination::Document);
        assert_eq!(route(&other_port, &origin()), Route::PassThrough);
    }
}
