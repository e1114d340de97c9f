use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Generator;

use crate::config::Config;
use crate::errors::Error;

use super::service::require_user;
use super::{search_page, MedicineRecord, MedicineRepository, MedicineService, MedicineSummary};

type Item = HashMap<String, AttributeValue>;

/// Table item. Partition key `user_id`, sort key `id`; `seq` orders by insertion.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredMedicine {
    user_id: String,
    id: String,
    seq: String,
    name: String,
    batch_number: String,
    expiry_date: String,
    quantity: i64,
    purchase_price: Decimal,
    selling_price: Decimal,
    wholesaler_name: String,
    purchase_date: String,
}

impl StoredMedicine {
    fn new(user_id: &str, seq: String, record: &MedicineRecord) -> Self {
        Self {
            user_id: user_id.to_string(),
            id: record.id.clone(),
            seq,
            name: record.name.clone(),
            batch_number: record.batch_number.clone(),
            expiry_date: record.expiry_date.clone(),
            quantity: record.quantity,
            purchase_price: record.purchase_price,
            selling_price: record.selling_price,
            wholesaler_name: record.wholesaler_name.clone(),
            purchase_date: record.purchase_date.clone(),
        }
    }
}

impl From<StoredMedicine> for MedicineRecord {
    fn from(stored: StoredMedicine) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            batch_number: stored.batch_number,
            expiry_date: stored.expiry_date,
            quantity: stored.quantity,
            purchase_price: stored.purchase_price,
            selling_price: stored.selling_price,
            wholesaler_name: stored.wholesaler_name,
            purchase_date: stored.purchase_date,
        }
    }
}

pub struct DynamoMedicineRepository {
    client: aws_sdk_dynamodb::Client,
    table: String,
    sequence: Mutex<Generator>,
}

impl DynamoMedicineRepository {
    pub fn new(client: aws_sdk_dynamodb::Client, config: &Config) -> Self {
        Self {
            client,
            table: config.medicines_table.clone(),
            sequence: Mutex::new(Generator::new()),
        }
    }

    fn next_seq(&self) -> Result<String, Error> {
        let mut generator = self
            .sequence
            .lock()
            .map_err(|_| Error::remote("sequence generator poisoned"))?;
        generator.generate().map(|ulid| ulid.to_string()).map_err(Error::remote)
    }

    async fn load(&self, user_id: &str, id: &str) -> Result<Option<StoredMedicine>, Error> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(Error::remote)?;

        output
            .item()
            .map(|item| serde_dynamo::from_item(item.clone()).map_err(Error::remote))
            .transpose()
    }

    async fn put(&self, item: Item, condition: &str) -> Result<(), Error> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .condition_expression(condition)
            .send()
            .await
            .map_err(|err| {
                let conflict = err
                    .as_service_error()
                    .map(|e| e.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if conflict {
                    Error::Uniqueness { field: "id".to_string() }
                } else {
                    Error::remote(err)
                }
            })?;
        Ok(())
    }
}

#[async_trait]
impl MedicineService for DynamoMedicineRepository {
    async fn initialize(&self, user_id: &str) -> Result<(), Error> {
        require_user(user_id)?;
        self.client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await
            .map_err(Error::remote)?;

        tracing::info!("Medicines table {} ready for {}", self.table, user_id);
        Ok(())
    }

    async fn insert_medicine(&self, user_id: &str, record: &MedicineRecord) -> Result<(), Error> {
        require_user(user_id)?;
        let stored = StoredMedicine::new(user_id, self.next_seq()?, record);
        let item: Item = serde_dynamo::to_item(stored).map_err(Error::remote)?;

        self.put(item, "attribute_not_exists(id)").await
    }

    async fn get_medicine(&self, user_id: &str) -> Result<Vec<MedicineRecord>, Error> {
        let mut items: Vec<Item> = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table)
                .key_condition_expression("user_id = :user_id")
                .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(Error::remote)?;

            items.extend(output.items().iter().cloned());
            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }

        let mut stored: Vec<StoredMedicine> = serde_dynamo::from_items(items).map_err(Error::remote)?;
        stored.sort_by(|a, b| a.seq.cmp(&b.seq));
        Ok(stored.into_iter().map(MedicineRecord::from).collect())
    }
}

#[async_trait]
impl MedicineRepository for DynamoMedicineRepository {
    async fn update_medicine(&self, user_id: &str, record: &MedicineRecord) -> Result<(), Error> {
        let existing = self
            .load(user_id, &record.id)
            .await?
            .ok_or_else(|| Error::not_found("Medicine"))?;
        let stored = StoredMedicine::new(user_id, existing.seq, record);
        let item: Item = serde_dynamo::to_item(stored).map_err(Error::remote)?;

        self.put(item, "attribute_exists(id)").await.map_err(|err| match err {
            Error::Uniqueness { .. } => Error::not_found("Medicine"),
            other => other,
        })
    }

    async fn delete_medicine(&self, user_id: &str, id: &str) -> Result<(), Error> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .key("id", AttributeValue::S(id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(Error::remote)?;

        if output.attributes().is_none() {
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
    use super::*;

    #[test]
    fn stored_item_round_trips_to_record() {
        let record = MedicineRecord {
            id: "m-1".to_string(),
            name: "Amoxicillin".to_string(),
            batch_number: "AX9".to_string(),
            expiry_date: "2027-03-31".to_string(),
            quantity: 12,
            purchase_price: Decimal::new(420, 2),
            selling_price: Decimal::new(599, 2),
            wholesaler_name: "Medline".to_string(),
            purchase_date: "2024-01-01".to_string(),
        };

        let item: Item = serde_dynamo::to_item(StoredMedicine::new("u1", "01J".to_string(), &record))
            .expect("serialize");
        assert_eq!(item.get("user_id"), Some(&AttributeValue::S("u1".to_string())));
        assert_eq!(item.get("quantity"), Some(&AttributeValue::N("12".to_string())));

        let stored: StoredMedicine = serde_dynamo::from_item(item).expect("deserialize");
        assert_eq!(MedicineRecord::from(stored), record);
    }
}
