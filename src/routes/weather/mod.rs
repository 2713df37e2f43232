mod handler;
mod model;

pub use handler::current_weather;
pub use model::CurrentWeatherQuery;
