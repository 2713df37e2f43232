use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherQuery {
    pub lat: f64,
    pub lon: f64,
}
