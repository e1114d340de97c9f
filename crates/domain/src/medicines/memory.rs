use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::Error;

use super::service::require_user;
use super::{search_page, MedicineRecord, MedicineRepository, MedicineService, MedicineSummary};

/// Medicine store kept in process memory, per user in insertion order.
#[derive(Debug, Default)]
pub struct MemMedicineService {
    records: RwLock<HashMap<String, Vec<MedicineRecord>>>,
}

impl MemMedicineService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MedicineService for MemMedicineService {
    async fn initialize(&self, user_id: &str) -> Result<(), Error> {
        require_user(user_id)?;
        self.records.write().await.entry(user_id.to_string()).or_default();
        Ok(())
    }

    async fn insert_medicine(&self, user_id: &str, record: &MedicineRecord) -> Result<(), Error> {
        require_user(user_id)?;
        let mut records = self.records.write().await;
        let owned = records.entry(user_id.to_string()).or_default();
        if owned.iter().any(|r| r.id == record.id) {
            return Err(Error::Uniqueness { field: "id".to_string() });
        }
        owned.push(record.clone());
        Ok(())
    }

    async fn get_medicine(&self, user_id: &str) -> Result<Vec<MedicineRecord>, Error> {
        Ok(self.records.read().await.get(user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MedicineRepository for MemMedicineService {
    async fn update_medicine(&self, user_id: &str, record: &MedicineRecord) -> Result<(), Error> {
        let mut records = self.records.write().await;
        let existing = records
            .get_mut(user_id)
            .and_then(|owned| owned.iter_mut().find(|r| r.id == record.id))
            .ok_or_else(|| Error::not_found("Medicine"))?;
        *existing = record.clone();
        Ok(())
    }

    async fn delete_medicine(&self, user_id: &str, id: &str) -> Result<(), Error> {
        let mut records = self.records.write().await;
        let owned = records.get_mut(user_id).ok_or_else(|| Error::not_found("Medicine"))?;
        let before = owned.len();
        owned.retain(|r| r.id != id);
        if owned.len() == before {
            return Err(Error::not_found("Medicine"));
        }
        Ok(())
    }

    async fn search_medicines(
        &self,
        user_id: &str,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<MedicineSummary>, Error> {
        let records = self.get_medicine(user_id).await?;
        search_page(&records, query, page, limit)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn record(id: &str, name: &str) -> MedicineRecord {
        MedicineRecord {
            id: id.to_string(),
            name: name.to_string(),
            batch_number: "B1".to_string(),
            expiry_date: "2026-01-01".to_string(),
            quantity: 10,
            purchase_price: Decimal::new(100, 2),
            selling_price: Decimal::new(150, 2),
            wholesaler_name: "W1".to_string(),
            purchase_date: "2024-01-01".to_string(),
        }
    }

    #[tokio::test]
    async fn records_are_scoped_per_user_and_ordered() {
        let service = MemMedicineService::new();
        service.insert_medicine("u1", &record("a", "Aspirin")).await.expect("insert");
        service.insert_medicine("u1", &record("b", "Baclofen")).await.expect("insert");
        service.insert_medicine("u2", &record("c", "Cetirizine")).await.expect("insert");

        let mine = service.get_medicine("u1").await.expect("fetch");
        assert_eq!(mine.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(service.get_medicine("nobody").await.expect("fetch").is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let service = MemMedicineService::new();
        service.insert_medicine("u1", &record("a", "Aspirin")).await.expect("insert");

        let again = service.insert_medicine("u1", &record("a", "Aspirin")).await;
        assert_eq!(again, Err(Error::Uniqueness { field: "id".to_string() }));
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_record() {
        let service = MemMedicineService::new();
        service.insert_medicine("u1", &record("a", "Aspirin")).await.expect("insert");

        let mut changed = record("a", "Aspirin 300");
        changed.quantity = 4;
        service.update_medicine("u1", &changed).await.expect("update");
        assert_eq!(service.get_medicine("u1").await.expect("fetch"), vec![changed]);

        assert!(service.update_medicine("u2", &record("a", "x")).await.is_err());
        assert!(service.delete_medicine("u1", "zzz").await.is_err());
        service.delete_medicine("u1", "a").await.expect("delete");
        assert!(service.get_medicine("u1").await.expect("fetch").is_empty());
    }

    #[tokio::test]
    async fn initialize_requires_user_id() {
        let service = MemMedicineService::new();
        assert!(service.initialize("").await.is_err());
        service.initialize("u1").await.expect("initialize");
    }
}
