pub mod card;
pub mod models;
pub mod orchestrator;
pub mod validator;
pub mod wallet;

pub use models::{BookingRequest, ValidationResult};
pub use orchestrator::{ConfirmationOrchestrator, ConfirmationOutcome, PaymentHandle};
