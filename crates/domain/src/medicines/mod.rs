/// Persisted record shapes
pub mod record;

/// Input DTOs
pub mod inputs;

/// Remote service traits
pub mod service;

/// DynamoDB-backed repository
pub mod dynamo;

/// In-process repository
pub mod memory;

/// Listing view flow
pub mod listing;

pub use dynamo::DynamoMedicineRepository;
pub use listing::{load_listing, ListingState};
pub use memory::MemMedicineService;
pub use record::{search_page, MedicineRecord, MedicineSummary};
pub use service::{MedicineRepository, MedicineService};
