use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;

use crate::{
    AppState,
    middleware::{RateLimiter, log_errors, rate_limit},
    routes,
};

// 天气相关的路由
pub fn weather_routes() -> Router<AppState> {
    Router::new().route("/weather/current", get(routes::weather::current_weather))
}

// 创建主路由，限流中间件位于最外层
pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let router = Router::new().nest(&state.config.api_base_uri, weather_routes());

    // 开发模式下允许所有来源
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
                .layer(axum::middleware::from_fn(log_errors)),
        )
        .with_state(state)
}
