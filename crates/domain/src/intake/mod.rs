/// Intake form aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Input DTOs
pub mod inputs;

/// View (read model) and its projectors
pub mod view;

/// CQRS setup
pub mod cqrs;

/// Sequential submission of line items
pub mod submission;

/// Form lifecycle on top of the framework
pub mod workflow;

pub use aggregate::{IntakeForm, IntakeServices, Medicine, WholesalerPurchase, AGGREGATE_TYPE};
pub use commands::{BatchField, Command, MedicineField};
pub use events::Event;
pub use submission::{ItemOutcome, ItemStatus, SubmissionPipeline, SubmissionReport};
pub use view::{MemViewRepository, Query, View};
pub use workflow::{mount_intake, StockIntake};
