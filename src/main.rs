use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_relay::{
    AppState, config::Config, middleware::RateLimiter, router::create_router,
    services::WeatherService,
};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 上游天气服务客户端
    let weather = WeatherService::from_config(&config).expect("Failed to build HTTP client");

    // 设置限流器
    let rate_limiter =
        Arc::new(RateLimiter::from_config(&config).expect("Invalid rate limit configuration"));
    tracing::info!(
        "Rate limit: {} requests per {:?}",
        config.rate_limit_requests,
        config.rate_limit_window()
    );

    // 定期清理过期的限流窗口
    let sweeper = Arc::clone(&rate_limiter);
    let sweep_interval = config.rate_limit_sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let purged = sweeper.windows().purge_expired();
            if purged > 0 {
                tracing::debug!(
                    "Purged {} expired rate limit windows, {} remaining",
                    purged,
                    sweeper.windows().len()
                );
            }
        }
    });

    let state = AppState::new(config, weather);
    let app = create_router(state.clone(), rate_limiter);

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
