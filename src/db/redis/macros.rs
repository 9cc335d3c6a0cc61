/// Read-through caching over the Redis [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, hands the
/// result to the background writer and returns it. A failing cache read is
/// logged and treated as a miss, so Redis being down never fails the request.
///
/// # Arguments
/// * `$cache`: anything with `get_from_cache` and `set_in_background`
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write
/// * `$ttl`: time-to-live in seconds
/// * `$block`: future computing the value on a miss
///
/// # Example
/// ```rust,ignore
/// let context = cached!(cache, CacheKey::UserContext(id), 300, async move {
///     store.user_context(&id).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, loading from source");
                None
            }
        };

        match hit {
            Some(cached) => Ok(cached),
            None => {
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
