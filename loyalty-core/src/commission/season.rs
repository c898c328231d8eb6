//! Calendar Rules for Commission Bonuses
//!
//! Seasonal and weekend bonuses are pure functions of a date plus an
//! amount. Dates outside every configured window are "regular" = 0%.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;

use crate::types::config::SeasonWindow;

/// Seasonal bonus percentage for a date; first matching window wins,
/// no-match is 0%
pub fn seasonal_percentage(date: NaiveDate, windows: &[SeasonWindow]) -> Decimal {
    windows
        .iter()
        .find(|w| w.contains(date))
        .map(|w| w.percentage)
        .unwrap_or(Decimal::ZERO)
}

/// Name of the season window a date falls in, for audit text
pub fn season_name(date: NaiveDate, windows: &[SeasonWindow]) -> &str {
    windows
        .iter()
        .find(|w| w.contains(date))
        .map(|w| w.name.as_str())
        .unwrap_or("regular")
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::CommissionConfig;

    #[test]
    fn test_seasonal_percentage_by_window() {
        let windows = CommissionConfig::default().seasonal_windows;

        let back_to_school = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(seasonal_percentage(back_to_school, &windows), Decimal::new(3, 2));
        assert_eq!(season_name(back_to_school, &windows), "back_to_school");

        let holiday = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        assert_eq!(seasonal_percentage(holiday, &windows), Decimal::new(5, 2));

        let regular = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(seasonal_percentage(regular, &windows), Decimal::ZERO);
        assert_eq!(season_name(regular, &windows), "regular");
    }

    #[test]
    fn test_weekend_detection() {
        // 2025-08-02 is a Saturday, 2025-08-03 a Sunday
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 8, 2).unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 8, 3).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2025, 8, 4).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()));
    }
}
