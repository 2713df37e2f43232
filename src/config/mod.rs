use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::operations::rate_limit::MAX_WINDOW;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openweather_base_url: String,
    pub openweather_api_key: String,
    pub upstream_timeout_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_sweep_secs: u64,
    pub trust_proxy_headers: bool,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意键值来源读取配置，缺省项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openweather_api_key = lookup("OPENWEATHER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENWEATHER_API_KEY"))?;

        let config = Config {
            openweather_base_url: lookup("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| "https://api.openweathermap.org/data/2.5".into())
                .trim_end_matches('/')
                .to_string(),
            openweather_api_key,
            upstream_timeout_secs: parse_secs(&lookup, "UPSTREAM_TIMEOUT_SECS", 10)?,
            rate_limit_window_secs: parse_secs(&lookup, "RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: parse_or(&lookup, "RATE_LIMIT_REQUESTS", 10)?,
            rate_limit_sweep_secs: parse_secs(&lookup, "RATE_LIMIT_SWEEP_SECS", 300)?,
            trust_proxy_headers: parse_or(&lookup, "RATE_LIMIT_TRUST_PROXY_HEADERS", false)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            api_base_uri: lookup("API_BASE_URI").unwrap_or_else(|| "/api".into()),
        };

        for (name, value) in [
            ("UPSTREAM_TIMEOUT_SECS", config.upstream_timeout_secs),
            ("RATE_LIMIT_WINDOW", config.rate_limit_window_secs),
            ("RATE_LIMIT_REQUESTS", u64::from(config.rate_limit_requests)),
            ("RATE_LIMIT_SWEEP_SECS", config.rate_limit_sweep_secs),
            ("SERVER_PORT", u64::from(config.server_port)),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    name,
                    value: "0".into(),
                });
            }
        }
        // 过大的窗口会让 Instant 加法溢出
        if config.rate_limit_window_secs > MAX_WINDOW.as_secs() {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_WINDOW",
                value: config.rate_limit_window_secs.to_string(),
            });
        }
        if !config.api_base_uri.starts_with('/') || config.api_base_uri.len() < 2 {
            return Err(ConfigError::Invalid {
                name: "API_BASE_URI",
                value: config.api_base_uri,
            });
        }

        Ok(config)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

/// 秒数配置，兼容 "60s" 这类写法
fn parse_secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .strip_suffix('s')
            .unwrap_or(raw.trim())
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
