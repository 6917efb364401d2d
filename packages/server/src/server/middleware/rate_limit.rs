// Rate limiting middleware using tower-governor
//
// Per-IP limit on /api/* expressed as requests per minute. The client IP
// comes from X-Forwarded-For / X-Real-IP / Forwarded, then the socket
// address, so the server must be started with connect info. Responses
// carry x-ratelimit-* headers.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::GovernorLayer;

/// Replenish interval for an even spread of `per_minute` requests.
pub fn replenish_interval(per_minute: u32) -> Duration {
    Duration::from_millis(60_000 / u64::from(per_minute.max(1)))
}

/// Wrap `router` in a per-IP limiter. `0` disables limiting.
pub fn with_rate_limit<S: Clone + Send + Sync + 'static>(router: Router<S>, per_minute: u32) -> Router<S> {
    if per_minute == 0 {
        tracing::info!("API rate limiting disabled");
        return router;
    }

    let config = GovernorConfigBuilder::default()
        .per_millisecond(replenish_interval(per_minute).as_millis() as u64)
        .burst_size(per_minute)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish();

    match config {
        Some(config) => router.layer(GovernorLayer {
            config: Arc::new(config),
        }),
        None => {
            tracing::warn!(per_minute, "Invalid rate limit configuration, limiting disabled");
            router
        }
    }
}
