//! Human-readable timing output.

use std::time::Duration;

const UNITS: [&str; 6] = [
    "microseconds",
    "milliseconds",
    "seconds",
    "minutes",
    "hours",
    "days",
];
const DIVISORS: [f64; 6] = [1.0, 1000.0, 1000.0, 60.0, 60.0, 24.0];

/// Format a duration in the largest unit for which the value is still
/// at least 1 and below 1000, from microseconds up to days.
pub fn format_time(duration: Duration) -> String {
    let mut value = duration.as_micros() as f64;
    let mut choice = 0;
    while choice < UNITS.len() - 1 && value >= 1000.0 {
        choice += 1;
        value /= DIVISORS[choice];
    }
    format!("{value:.2} {}", UNITS[choice])
}

/// Print one timing line for a measured phase.
pub fn print_time(message: &str, duration: Duration) {
    println!("Time to {message}: {}.", format_time(duration));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microseconds_below_one_thousand() {
        assert_eq!(format_time(Duration::from_micros(0)), "0.00 microseconds");
        assert_eq!(
            format_time(Duration::from_micros(999)),
            "999.00 microseconds"
        );
    }

    #[test]
    fn test_milliseconds() {
        assert_eq!(
            format_time(Duration::from_micros(1000)),
            "1.00 milliseconds"
        );
        assert_eq!(
            format_time(Duration::from_micros(1500)),
            "1.50 milliseconds"
        );
    }

    #[test]
    fn test_seconds() {
        assert_eq!(format_time(Duration::from_millis(2500)), "2.50 seconds");
        // A unit is kept until the value reaches 1000 in it.
        assert_eq!(format_time(Duration::from_secs(90)), "90.00 seconds");
    }

    #[test]
    fn test_minutes() {
        assert_eq!(format_time(Duration::from_secs(1500)), "25.00 minutes");
    }

    #[test]
    fn test_hours() {
        assert_eq!(format_time(Duration::from_secs(90_000)), "25.00 hours");
    }

    #[test]
    fn test_days() {
        // Days are the last stop even for huge values.
        assert_eq!(
            format_time(Duration::from_secs(2000 * 86_400)),
            "2000.00 days"
        );
    }
}
