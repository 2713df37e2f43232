pub mod temperature;

pub use temperature::{categorize, celsius_to_fahrenheit};
