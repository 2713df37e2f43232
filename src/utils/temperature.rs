/// 摄氏度转华氏度
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// 按华氏温度划分档位，边界值归入较低一档
pub fn categorize(fahrenheit: f64) -> &'static str {
    match fahrenheit {
        f if f <= 32.0 => "Freezing",
        f if f <= 50.0 => "Cold",
        f if f <= 60.0 => "Cool",
        f if f <= 70.0 => "Mild",
        f if f <= 80.0 => "Warm",
        f if f <= 90.0 => "Hot",
        f if f <= 100.0 => "Very Hot",
        _ => "Extreme Heat",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_to_fahrenheit_fixed_points() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }

    #[test]
    fn test_categorize_boundaries_fall_into_lower_bucket() {
        assert_eq!(categorize(32.0), "Freezing");
        assert_eq!(categorize(32.01), "Cold");
        assert_eq!(categorize(50.0), "Cold");
        assert_eq!(categorize(60.0), "Cool");
        assert_eq!(categorize(70.0), "Mild");
        assert_eq!(categorize(80.0), "Warm");
        assert_eq!(categorize(90.0), "Hot");
        assert_eq!(categorize(100.0), "Very Hot");
        assert_eq!(categorize(100.01), "Extreme Heat");
    }

    #[test]
    fn test_categorize_extremes() {
        assert_eq!(categorize(-80.0), "Freezing");
        assert_eq!(categorize(130.0), "Extreme Heat");
    }
}
