//! Pharmacy stock intake domain

/// Runtime configuration
pub mod config;

/// Domain errors
pub mod errors;

/// Line item identifiers
pub mod ids;

/// Intake form aggregate and submission
pub mod intake;

/// Persisted medicines and the listing view
pub mod medicines;

/// User notifications
pub mod notify;

/// Session and view gate
pub mod session;

/// User accounts and login sessions
pub mod users;

pub use config::Config;
pub use errors::Error;
