use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;

use super::model::CurrentWeatherQuery;

#[axum::debug_handler]
pub async fn current_weather(
    State(state): State<AppState>,
    Query(query): Query<CurrentWeatherQuery>,
) -> Response {
    match state
        .weather
        .fetch_current_weather(query.lat, query.lon)
        .await
    {
        Ok(reading) => (StatusCode::OK, reading.to_string()).into_response(),
        Err(e) => {
            tracing::warn!("Weather lookup failed: {}", e.details());
            e.into_response()
        }
    }
}
