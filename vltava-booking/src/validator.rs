use crate::models::{BookingRequest, ValidationResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use vltava_catalog::{calculate_total_price, validate_group_size, validate_tour_availability, TourCatalog};

const MAX_ADVANCE_DAYS: i64 = 365;
const SAME_DAY_LEAD_TIME_HOURS: i64 = 2;
const MAX_SPECIAL_REQUESTS_CHARS: usize = 500;
const MAX_SCHEMA_GROUP_SIZE: u32 = 20;
/// Allowed client/server price divergence, in whole cents.
const PRICE_TOLERANCE_MINOR_UNITS: i64 = 1;

/// Run every schema and business-rule check and accumulate all errors in one
/// pass. No short-circuiting: the customer sees every problem at once.
/// Validation failures are always returned as data, never as errors.
pub fn validate_complete_booking(
    request: &BookingRequest,
    catalog: &TourCatalog,
    now: DateTime<Utc>,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    if request.tour_id.trim().is_empty() {
        result.push("Tour is required");
    }

    let date = parse_date(&request.date);
    match date {
        None => result.push("Date must be in YYYY-MM-DD format"),
        Some(date) => {
            let today = now.date_naive();
            if date < today {
                result.push("Booking date cannot be in the past");
            } else if date > today + Duration::days(MAX_ADVANCE_DAYS) {
                result.push("Bookings can be made at most 365 days in advance");
            }
        }
    }

    let time = parse_time(&request.start_time);
    match time {
        None => result.push("Start time must be in HH:MM format"),
        Some(time) => {
            // Same-day bookings need lead time for the guide to get there.
            if date == Some(now.date_naive()) {
                let start = now.date_naive().and_time(time);
                if start < now.naive_utc() + Duration::hours(SAME_DAY_LEAD_TIME_HOURS) {
                    result.push("Same-day bookings require at least 2 hours notice");
                }
            }
        }
    }

    if request.group_size < 1 {
        result.push("Group size must be at least 1");
    } else if request.group_size > MAX_SCHEMA_GROUP_SIZE {
        result.push("Group size cannot exceed 20");
    } else {
        let check = validate_group_size(catalog, request.group_size, &request.tour_id);
        if let Some(error) = check.error {
            result.push(error);
        }
    }

    validate_customer(request, &mut result);

    if let Some(requests) = &request.special_requests {
        if requests.chars().count() > MAX_SPECIAL_REQUESTS_CHARS {
            result.push("Special requests must be 500 characters or fewer");
        }
    }

    if let Some(date) = date {
        let check = validate_tour_availability(catalog, &request.tour_id, date);
        if let Some(error) = check.error {
            result.push(error);
        }

        // Guard against stale or tampered client-side price calculations.
        // Compared in whole cents: f64 subtraction misreads the exact
        // one-cent boundary (90.01 - 90.0 > 0.01).
        let expected = calculate_total_price(catalog, &request.tour_id, request.group_size, date);
        let divergence =
            (request.total_price * 100.0).round() as i64 - (expected * 100.0).round() as i64;
        if divergence.abs() > PRICE_TOLERANCE_MINOR_UNITS {
            result.push("Price mismatch, please refresh and try again");
        }
    }

    result
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

fn validate_customer(request: &BookingRequest, result: &mut ValidationResult) {
    let customer = &request.customer;
    if customer.first_name.trim().is_empty() {
        result.push("First name is required");
    }
    if customer.last_name.trim().is_empty() {
        result.push("Last name is required");
    }
    if !is_plausible_email(customer.email.as_str()) {
        result.push("A valid email address is required");
    }
    let phone_len = customer.phone.as_str().trim().chars().count();
    if !(8..=20).contains(&phone_len) {
        result.push("Phone number must be between 8 and 20 characters");
    }
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}
