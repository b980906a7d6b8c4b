pub mod email;
pub mod payment;
pub mod provider;
pub mod session;
pub mod webhook;
