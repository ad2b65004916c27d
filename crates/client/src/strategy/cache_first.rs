use super::{Served, StrategyContext};
use crate::fetch::Request;
use stowaway_core::Error;

/// Cache-first: assets are immutable per version, so a hit never touches the
/// network. A miss is fetched, copied into the cache on 200 and returned; a
/// rejected fetch propagates unchanged with no fallback.
pub async fn cache_first(ctx: &StrategyContext<'_>, request: &Request) -> Result<Served, Error> {
    let identity = request.identity();

    match ctx.cache.match_request(&identity).await {
        Ok(Some(cached)) => {
            tracing::debug!("serving from cache: {}", request.url);
            return Ok(Served::Cache(cached));
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(cache = ctx.cache.name(), "cache lookup failed for {}: {}", identity, e),
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.is_cacheable() {
                ctx.writes.put(ctx.cache.clone(), identity, response.to_stored());
            }
            Ok(Served::Network(response))
        }
        Err(e) => {
            tracing::error!("fetch failed: {} ({})", request.url, e);
            Err(e)
        }
    }
}
