/// Account and session records
pub mod account;

/// Input DTOs
pub mod inputs;

/// Password hashing
pub mod password;

/// Storage traits
pub mod store;

/// DynamoDB-backed store
pub mod dynamo;

/// In-process store
pub mod memory;

/// Signup, login and session resolution
pub mod accounts;

pub use account::{User, UserSession};
pub use accounts::{Accounts, SESSION_TTL_HOURS};
pub use dynamo::DynamoUserStore;
pub use memory::MemUserStore;
pub use store::UserStore;
