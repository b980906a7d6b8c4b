use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-tour configuration: price table, capacity and operating days.
/// Passed into the pricing/availability functions explicitly so the
/// unknown-tour fallback is a visible, testable branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourConfig {
    pub name: String,
    /// Price per person, major units (EUR).
    pub base_price: f64,
    pub max_group_size: u32,
    /// Weekdays the tour operates. Empty means every day.
    pub operating_days: Vec<Weekday>,
}

/// Rules resolved for a single tour id, after applying the default policy.
#[derive(Debug, Clone)]
pub struct TourRules {
    pub tour_id: String,
    pub name: String,
    pub base_price: f64,
    pub max_group_size: u32,
    pub operating_days: Vec<Weekday>,
    /// True when the tour id was not in the catalog and defaults were used.
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourCatalog {
    pub tours: HashMap<String, TourConfig>,
    /// Defaults applied when a tour id is not in the catalog. Unknown tours
    /// are deliberately not rejected at the pricing layer.
    pub default_base_price: f64,
    pub default_max_group_size: u32,
}

impl TourCatalog {
    pub fn new(default_base_price: f64, default_max_group_size: u32) -> Self {
        Self {
            tours: HashMap::new(),
            default_base_price,
            default_max_group_size,
        }
    }

    pub fn insert(&mut self, tour_id: &str, config: TourConfig) {
        self.tours.insert(tour_id.to_string(), config);
    }

    /// Resolve the rules for a tour, falling back to catalog defaults when
    /// the id is unknown.
    pub fn rules(&self, tour_id: &str) -> TourRules {
        match self.tours.get(tour_id) {
            Some(config) => TourRules {
                tour_id: tour_id.to_string(),
                name: config.name.clone(),
                base_price: config.base_price,
                max_group_size: config.max_group_size,
                operating_days: config.operating_days.clone(),
                fallback: false,
            },
            None => TourRules {
                tour_id: tour_id.to_string(),
                name: tour_id.to_string(),
                base_price: self.default_base_price,
                max_group_size: self.default_max_group_size,
                operating_days: Vec::new(),
                fallback: true,
            },
        }
    }

    /// The production catalog of Prague walking tours.
    pub fn prague_tours() -> Self {
        use Weekday::*;
        let mut catalog = Self::new(45.0, 6);
        catalog.insert(
            "prague-castle",
            TourConfig {
                name: "Prague Castle & Hradčany".to_string(),
                base_price: 45.0,
                max_group_size: 6,
                operating_days: vec![Tue, Wed, Thu, Fri, Sat, Sun],
            },
        );
        catalog.insert(
            "old-town-charles-bridge",
            TourConfig {
                name: "Old Town & Charles Bridge".to_string(),
                base_price: 40.0,
                max_group_size: 8,
                operating_days: vec![Mon, Tue, Wed, Thu, Fri, Sat, Sun],
            },
        );
        catalog.insert(
            "jewish-quarter",
            TourConfig {
                name: "Josefov — the Jewish Quarter".to_string(),
                base_price: 50.0,
                max_group_size: 6,
                // The quarter's sites are closed on Saturdays.
                operating_days: vec![Mon, Tue, Wed, Thu, Fri, Sun],
            },
        );
        catalog.insert(
            "petrin-lesser-town",
            TourConfig {
                name: "Petřín Hill & Lesser Town".to_string(),
                base_price: 40.0,
                max_group_size: 10,
                operating_days: vec![Wed, Thu, Fri, Sat, Sun],
            },
        );
        catalog
    }
}
