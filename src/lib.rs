use std::sync::Arc;

use config::Config;
use services::WeatherService;

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod services;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub weather: WeatherService,
}

impl AppState {
    pub fn new(config: Config, weather: WeatherService) -> Self {
        Self {
            config: Arc::new(config),
            weather,
        }
    }
}
