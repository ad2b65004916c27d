use super::{Served, StrategyContext};
use crate::fetch::Request;
use stowaway_core::Error;

/// Network-first: fresh content when reachable, cached content when not.
///
/// 1. Fetch from the network; a 200 is copied into the cache in the
///    background. Any response is returned unmodified.
/// 2. On a rejected fetch, answer from the cache.
/// 3. Document requests missing from the cache get the offline page.
/// 4. Anything else propagates the original network error.
///
/// A failing cache read during fallback counts as a miss.
pub async fn network_first(ctx: &StrategyContext<'_>, request: &Request) -> Result<Served, Error> {
    let identity = request.identity();

    let network_error = match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.is_cacheable() {
                ctx.writes.put(ctx.cache.clone(), identity, response.to_stored());
            }
            return Ok(Served::Network(response));
        }
        Err(e) => e,
    };

    tracing::info!("network failed, trying cache: {} ({})", request.url, network_error);

    match ctx.cache.match_request(&identity).await {
        Ok(Some(cached)) => return Ok(Served::Cache(cached)),
        Ok(None) => {}
        Err(e) => tracing::warn!(cache = ctx.cache.name(), "cache lookup failed for {}: {}", identity, e),
    }

    if request.is_document() {
        match ctx.cache.match_request(ctx.offline_page).await {
            Ok(Some(offline)) => {
                tracing::info!("serving offline page for {}", request.url);
                return Ok(Served::OfflineFallback(offline));
            }
            Ok(None) => tracing::warn!("offline page {} is not cached", ctx.offline_page.url),
            Err(e) => tracing::warn!(cache = ctx.cache.name(), "offline page lookup failed: {}", e),
        }
    }

    Err(network_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Destination;
    use crate::strategy::{BackgroundWrites, ResponseSource};
    use crate::testing::{ORIGIN, StubNetwork, memory_db};
    use stowaway_core::{RequestIdentity, StoredResponse};
    use url::Url;

    fn document(path: &str) -> Request {
        let base = Url::parse(ORIGIN).unwrap();
        Request::get(path, Some(&base)).unwrap().with_destination(Destination::Document)
    }

    fn offline_identity() -> RequestIdentity {
        RequestIdentity::get(format!("{ORIGIN}/offline.html"))
    }

    fn stored(body: &str) -> StoredResponse {
        StoredResponse {
            url: format!("{ORIGIN}/offline.html"),
            status: 200,
            headers: vec![("content-type".into(), "text/html".into())],
            body: body.as_bytes().to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_network_success_is_returned_and_cached() {
        let db = memory_db().await;
        let cache = db.open_cache("sherlock-ramos-v1.0.0").await.unwrap();
        let network = StubNetwork::new();
        network.serve("/posts/", 200, "text/html", "<h1>fresh</h1>");
        let writes = BackgroundWrites::default();
        let offline = offline_identity();
        let ctx = StrategyContext { network: &network, cache: &cache, offline_page: &offline, writes: &writes };

        let request = document("/posts/");
        let served = network_first(&ctx, &request).await.unwrap();
        assert_eq!(served.source(), ResponseSource::Network);
        assert_eq!(served.body(), b"<h1>fresh</h1>");

        writes.settle().await;
        let cached = cache.match_request(&request.identity()).await.unwrap().unwrap();
        assert_eq!(cached.body, b"<h1>fresh</h1>");
        assert_eq!(cached.status, 200);
    }

    #[tokio::test]
    async fn test_error_status_is_returned_but_not_cached() {
        let db = memory_db().await;
        let cache = db.open_cache("sherlock-ramos-v1.0.0").await.unwrap();
        let network = StubNetwork::new();
        let writes = BackgroundWrites::default();
        let offline = offline_identity();
        let ctx = StrategyContext { network: &network, cache: &cache, offline_page: &offline, writes: &writes };

        let request = document("/missing/");
        let served = network_first(&ctx, &request).await.unwrap();
        assert_eq!(served.status(), 404);

        writes.settle().await;
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_document_is_returned_not_cached() {
        let db = memory_db().await;
        let cache = db.open_cache("sherlock-ramos-v1.0.0").await.unwrap();
        let offline = offline_identity();
        cache.put(&offline, &stored("<h1>offline</h1>")).await.unwrap();

        let network = StubNetwork::new();
        network.serve("/posts/long-read/", 200, "text/html", "<h1>a very long article</h1>");
        network.set_max_bytes(8);
        let writes = BackgroundWrites::default();
        let ctx = StrategyContext { network: &network, cache: &cache, offline_page: &offline, writes: &writes };

        let request = document("/posts/long-read/");
        let served = network_first(&ctx, &request).await.unwrap();
        assert_eq!(served.source(), ResponseSource::Network);
        assert_eq!(served.body(), b"<h1>a very long article</h1>");

        writes.settle().await;
        assert!(cache.match_request(&request.identity()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_hit_serves_cache() {
        let db = memory_db().await;
        let cache = db.open_cache("sherlock-ramos-v1.0.0").await.unwrap();
        let request = document("/about/");
        cache.put(&request.identity(), &stored("<h1>about (cached)</h1>")).await.unwrap();

        let network = StubNetwork::new();
        network.set_offline(true);
        let writes = BackgroundWrites::default();
        let offline = offline_identity();
        let ctx = StrategyContext { network: &network, cache: &cache, offline_page: &offline, writes: &writes };

        let served = network_first(&ctx, &request).await.unwrap();
        assert_eq!(served.source(), ResponseSource::Cache);
        assert_eq!(served.body(), b"<h1>about (cached)</h1>");
    }

    #[tokio::test]
    async fn test_offline_document_miss_serves_offline_page() {
        let db = memory_db().await;
        let cache = db.open_cache("sherlock-ramos-v1.0.0").await.unwrap();
        cache.put(&offline_identity(), &stored("<h1>offline</h1>")).await.unwrap();

        let network = StubNetwork::new();
        network.set_offline(true);
        let writes = BackgroundWrites::default();
        let offline = offline_identity();
        let ctx = StrategyContext { network: &network, cache: &cache, offline_page: &offline, writes: &writes };

        let served = network_first(&ctx, &document("/posts/never-seen/")).await.unwrap();
        assert_eq!(served.source(), ResponseSource::OfflineFallback);
        assert_eq!(served.body(), b"<h1>offline</h1>");
    }

    #[tokio::test]
    async fn test_offline_document_without_offline_page_propagates() {
        let db = memory_db().await;
        let cache = db.open_cache("sherlock-ramos-v1.0.0").await.unwrap();
        let network = StubNetwork::new();
        network.set_offline(true);
        let writes = BackgroundWrites::default();
        let offline = offline_identity();
        let ctx = StrategyContext { network: &network, cache: &cache, offline_page: &offline, writes: &writes };

        let result = network_first(&ctx, &document("/posts/")).await;
        assert!(matches!(result, Err(Error::Network(msg)) if msg.contains("/posts/")));
    }

    #[tokio::test]
    async fn test_offline_non_document_miss_propagates() {
        let db = memory_db().await;
        let cache = db.open_cache("sherlock-ramos-v1.0.0").await.unwrap();
        cache.put(&offline_identity(), &stored("<h1>offline</h1>")).await.unwrap();

        let network = StubNetwork::new();
        network.set_offline(true);
        let writes = BackgroundWrites::default();
        let offline = offline_identity();
        let ctx = StrategyContext { network: &network, cache: &cache, offline_page: &offline, writes: &writes };

        let base = Url::parse(ORIGIN).unwrap();
        let request = Request::get("/index.json", Some(&base)).unwrap();
        let result = network_first(&ctx, &request).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
