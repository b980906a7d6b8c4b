pub mod pricing;
pub mod tours;

pub use pricing::{calculate_total_price, validate_group_size, validate_tour_availability, RuleCheck};
pub use tours::{TourCatalog, TourConfig, TourRules};
