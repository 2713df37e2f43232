pub mod weather;

pub use weather::{WeatherReading, WeatherService};
