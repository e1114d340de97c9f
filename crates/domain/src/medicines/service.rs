use async_trait::async_trait;

use crate::errors::Error;

use super::{MedicineRecord, MedicineSummary};

/// Remote persistence for medicine records.
#[async_trait]
pub trait MedicineService: Send + Sync {
    /// Prepares storage for the user. Called when the intake view mounts.
    async fn initialize(&self, user_id: &str) -> Result<(), Error>;

    async fn insert_medicine(&self, user_id: &str, record: &MedicineRecord) -> Result<(), Error>;

    /// The user's records in insertion order.
    async fn get_medicine(&self, user_id: &str) -> Result<Vec<MedicineRecord>, Error>;
}

/// Maintenance operations on already persisted records.
#[async_trait]
pub trait MedicineRepository: MedicineService {
    async fn update_medicine(&self, user_id: &str, record: &MedicineRecord) -> Result<(), Error>;

    async fn delete_medicine(&self, user_id: &str, id: &str) -> Result<(), Error>;

    async fn search_medicines(
        &self,
        user_id: &str,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<MedicineSummary>, Error>;
}

pub(crate) fn require_user(user_id: &str) -> Result<(), Error> {
    if user_id.is_empty() {
        return Err(Error::Validation {
            message: "User ID cannot be empty".to_string(),
        });
    }
    Ok(())
}
