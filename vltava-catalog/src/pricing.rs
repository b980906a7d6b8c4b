use crate::tours::TourCatalog;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Group discount: 10% at 6 or more people, 5% at 4-5.
const LARGE_GROUP_THRESHOLD: u32 = 6;
const LARGE_GROUP_DISCOUNT: f64 = 0.10;
const MEDIUM_GROUP_THRESHOLD: u32 = 4;
const MEDIUM_GROUP_DISCOUNT: f64 = 0.05;

/// Seasonal surcharge applied June through September inclusive.
const SUMMER_SURCHARGE: f64 = 0.15;
const SUMMER_MONTHS: std::ops::RangeInclusive<u32> = 6..=9;

/// Outcome of a single business rule check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCheck {
    pub valid: bool,
    pub error: Option<String>,
}

impl RuleCheck {
    pub fn pass() -> Self {
        Self { valid: true, error: None }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self { valid: false, error: Some(error.into()) }
    }
}

/// Round to 2 decimal places, half-up.
fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Total price for a booking: base price x group size, with the volume
/// discount and the seasonal surcharge applied. Pure and deterministic.
pub fn calculate_total_price(
    catalog: &TourCatalog,
    tour_id: &str,
    group_size: u32,
    date: NaiveDate,
) -> f64 {
    let rules = catalog.rules(tour_id);
    let mut total = rules.base_price * f64::from(group_size);

    if group_size >= LARGE_GROUP_THRESHOLD {
        total *= 1.0 - LARGE_GROUP_DISCOUNT;
    } else if group_size >= MEDIUM_GROUP_THRESHOLD {
        total *= 1.0 - MEDIUM_GROUP_DISCOUNT;
    }

    if SUMMER_MONTHS.contains(&date.month()) {
        total *= 1.0 + SUMMER_SURCHARGE;
    }

    round_price(total)
}

/// Check the requested date against the tour's operating weekdays.
/// An empty allow-list (catalog fallback) operates every day.
pub fn validate_tour_availability(
    catalog: &TourCatalog,
    tour_id: &str,
    date: NaiveDate,
) -> RuleCheck {
    let rules = catalog.rules(tour_id);
    if rules.operating_days.is_empty() || rules.operating_days.contains(&date.weekday()) {
        return RuleCheck::pass();
    }

    let allowed: Vec<String> = rules
        .operating_days
        .iter()
        .map(|day| weekday_name(*day).to_string())
        .collect();
    RuleCheck::fail(format!(
        "{} does not operate on {}. Available days: {}",
        rules.name,
        weekday_name(date.weekday()),
        allowed.join(", ")
    ))
}

/// Check the group size against the tour's maximum (catalog default for
/// unknown tours).
pub fn validate_group_size(catalog: &TourCatalog, group_size: u32, tour_id: &str) -> RuleCheck {
    let rules = catalog.rules(tour_id);
    if group_size <= rules.max_group_size {
        RuleCheck::pass()
    } else {
        RuleCheck::fail(format!(
            "Maximum group size for {} is {}",
            rules.name, rules.max_group_size
        ))
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
