//! OpenWeather 当前天气接口客户端
//!
//! 所有失败都转换为 [`ExternalServiceError`]：上游非 2xx 保留原状态码，
//! 网络问题为 503，其余（响应格式错误、字段缺失）为 500。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::ExternalServiceError;
use crate::utils::{categorize, celsius_to_fahrenheit};

/// 单次请求得到的天气读数，响应后即丢弃
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub condition_summary: String,
    pub temperature_fahrenheit: f64,
    pub bucket_label: &'static str,
}

impl WeatherReading {
    pub fn from_celsius(condition_summary: impl Into<String>, celsius: f64) -> Self {
        let temperature_fahrenheit = celsius_to_fahrenheit(celsius);
        Self {
            condition_summary: condition_summary.into(),
            temperature_fahrenheit,
            bucket_label: categorize(temperature_fahrenheit),
        }
    }
}

impl fmt::Display for WeatherReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Weather: {}, Temperature: {}°F | {}",
            self.condition_summary, self.temperature_fahrenheit, self.bucket_label
        )
    }
}

// 只解析用到的字段，其余忽略
#[derive(Debug, Deserialize)]
struct CurrentWeatherPayload {
    weather: Vec<ConditionPayload>,
    main: MainPayload,
}

#[derive(Debug, Deserialize)]
struct ConditionPayload {
    main: String,
}

#[derive(Debug, Deserialize)]
struct MainPayload {
    temp: f64,
}

#[derive(Debug, thiserror::Error)]
#[error("upstream payload has no weather condition entry")]
struct MissingCondition;

#[derive(Debug, Clone)]
pub struct WeatherService {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl WeatherService {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.openweather_base_url.clone(),
            config.openweather_api_key.clone(),
            config.upstream_timeout(),
        )
    }

    /// 写入错误和日志的请求地址，API key 已隐藏
    pub fn endpoint(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/weather?lat={}&lon={}&appid=***&units=metric",
            self.base_url, lat, lon
        )
    }

    pub async fn fetch_current_weather(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherReading, ExternalServiceError> {
        let endpoint = self.endpoint(lat, lon);
        let parameters = BTreeMap::from([
            ("lat".to_string(), lat.to_string()),
            ("lon".to_string(), lon.to_string()),
        ]);
        let fail = |message: &str| {
            ExternalServiceError::new(message)
                .with_endpoint(endpoint.clone())
                .with_parameters(parameters.clone())
        };

        let response = self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    tracing::error!("Failed to build Weather API request: {}", e);
                    fail("An unexpected error occurred while fetching weather data.")
                        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                        .with_cause(e)
                } else {
                    tracing::error!("HTTP request to Weather API failed: {}", e);
                    fail("HTTP request failed")
                        .with_status(StatusCode::SERVICE_UNAVAILABLE)
                        .with_cause(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read Weather API response: {}", e);
            fail("HTTP request failed")
                .with_status(StatusCode::SERVICE_UNAVAILABLE)
                .with_cause(e)
        })?;

        if !status.is_success() {
            tracing::error!("Weather API returned {}: {}", status, body);
            return Err(fail("Failed to retrieve weather data.").with_status(status));
        }

        let reading = parse_reading(&body).map_err(|e| {
            tracing::error!("Unexpected Weather API payload: {}", e);
            fail("An unexpected error occurred while fetching weather data.")
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                .with_cause(e)
        })?;

        tracing::debug!(lat, lon, %reading, "Fetched current weather");
        Ok(reading)
    }
}

fn parse_reading(body: &str) -> Result<WeatherReading, Box<dyn std::error::Error + Send + Sync>> {
    let payload: CurrentWeatherPayload = serde_json::from_str(body)?;
    let condition = payload
        .weather
        .into_iter()
        .next()
        .ok_or(MissingCondition)?;

    Ok(WeatherReading::from_celsius(condition.main, payload.main.temp))
}
