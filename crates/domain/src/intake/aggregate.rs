use std::sync::Arc;

use async_trait::async_trait;
use cqrs_es::Aggregate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::ids::{IdentifierGenerator, UuidGenerator};

use super::{BatchField, Command, Event, MedicineField};

/// One line item of a purchase.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub quantity: i64,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
}

impl Medicine {
    /// Empty row, zero quantity and prices.
    pub fn blank(id: String) -> Self {
        Self {
            id,
            name: String::new(),
            batch_number: String::new(),
            expiry_date: String::new(),
            quantity: 0,
            purchase_price: Decimal::ZERO,
            selling_price: Decimal::ZERO,
        }
    }
}

/// One wholesaler purchase: shared wholesaler and date, ordered medicine rows.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct WholesalerPurchase {
    pub id: u32,
    pub wholesaler_name: String,
    pub purchase_date: String,
    pub medicines: Vec<Medicine>,
}

impl WholesalerPurchase {
    fn opening(id: u32, purchase_date: &str, ids: &dyn IdentifierGenerator) -> Self {
        Self {
            id,
            wholesaler_name: String::new(),
            purchase_date: purchase_date.to_string(),
            medicines: vec![Medicine::blank(ids.generate())],
        }
    }

    pub fn medicine(&self, medicine_id: &str) -> Option<&Medicine> {
        self.medicines.iter().find(|m| m.id == medicine_id)
    }
}

/// Stock intake form aggregate.
///
/// Holds the batches being entered by one operator. Medicine ids are unique
/// across the whole form, batch ids among the batches currently held.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct IntakeForm {
    pub id: String,
    pub operator: String,
    pub purchases: Vec<WholesalerPurchase>,
}

pub const AGGREGATE_TYPE: &str = "IntakeForm";

#[derive(Clone)]
pub struct IntakeServices {
    ids: Arc<dyn IdentifierGenerator>,
}

impl IntakeServices {
    pub fn new(ids: Arc<dyn IdentifierGenerator>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &dyn IdentifierGenerator {
        self.ids.as_ref()
    }
}

impl Default for IntakeServices {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator))
    }
}

#[async_trait]
impl Aggregate for IntakeForm {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = IntakeServices;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::OpenForm { id, operator, purchase_date } => {
                self.validate_new()?;

                Ok(vec![Event::FormOpened {
                    id,
                    operator,
                    batch: WholesalerPurchase::opening(1, &purchase_date, services.ids()),
                }])
            }

            Command::UpdateBatch { batch_id, field } => {
                self.validate_existing()?;
                if self.batch(batch_id).is_none() {
                    return Ok(vec![]);
                }

                Ok(vec![Event::BatchFieldUpdated { batch_id, field }])
            }

            Command::UpdateMedicine { batch_id, medicine_id, field } => {
                self.validate_existing()?;
                if self.medicine(batch_id, &medicine_id).is_none() {
                    return Ok(vec![]);
                }

                Ok(vec![Event::MedicineFieldUpdated { batch_id, medicine_id, field }])
            }

            Command::AddMedicine { batch_id } => {
                self.validate_existing()?;
                if self.batch(batch_id).is_none() {
                    return Err(Error::not_found("WholesalerPurchase"));
                }

                Ok(vec![Event::MedicineAdded {
                    batch_id,
                    medicine: Medicine::blank(services.ids().generate()),
                }])
            }

            Command::RemoveMedicine { batch_id, medicine_id } => {
                self.validate_existing()?;
                if self.medicine(batch_id, &medicine_id).is_none() {
                    return Ok(vec![]);
                }

                Ok(vec![Event::MedicineRemoved { batch_id, medicine_id }])
            }

            Command::AddBatch { purchase_date } => {
                self.validate_existing()?;

                Ok(vec![Event::BatchAdded {
                    batch: WholesalerPurchase::opening(
                        self.next_batch_id(),
                        &purchase_date,
                        services.ids(),
                    ),
                }])
            }

            Command::RemoveBatch { batch_id } => {
                self.validate_existing()?;
                if self.batch(batch_id).is_none() {
                    return Ok(vec![]);
                }
                if self.purchases.len() == 1 {
                    return Err(Error::Validation {
                        message: "The last wholesaler purchase cannot be removed".to_string(),
                    });
                }

                Ok(vec![Event::BatchRemoved { batch_id }])
            }

            Command::ResetForm { purchase_date } => {
                self.validate_existing()?;

                Ok(vec![Event::FormReset {
                    batch: WholesalerPurchase::opening(1, &purchase_date, services.ids()),
                }])
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::FormOpened { id, operator, batch } => {
                self.id = id;
                self.operator = operator;
                self.purchases = vec![batch];
            }

            Event::BatchFieldUpdated { batch_id, field } => {
                *self = self.update_batch_field(batch_id, &field);
            }

            Event::MedicineFieldUpdated { batch_id, medicine_id, field } => {
                *self = self.update_medicine_field(batch_id, &medicine_id, &field);
            }

            Event::MedicineAdded { batch_id, medicine } => {
                if let Some(next) = self.with_medicine(batch_id, medicine) {
                    *self = next;
                }
            }

            Event::MedicineRemoved { batch_id, medicine_id } => {
                *self = self.remove_medicine(batch_id, &medicine_id);
            }

            Event::BatchAdded { batch } => {
                self.purchases.push(batch);
            }

            Event::BatchRemoved { batch_id } => {
                *self = self.remove_batch(batch_id);
            }

            Event::FormReset { batch } => {
                self.purchases = vec![batch];
            }
        }
    }
}

// Snapshot operations. Each returns a new form and leaves `self` untouched.
impl IntakeForm {
    pub fn update_batch_field(&self, batch_id: u32, field: &BatchField) -> Self {
        let mut next = self.clone();
        if let Some(batch) = next.batch_mut(batch_id) {
            field.write(batch);
        }
        next
    }

    pub fn update_medicine_field(&self, batch_id: u32, medicine_id: &str, field: &MedicineField) -> Self {
        let mut next = self.clone();
        let medicine = next
            .batch_mut(batch_id)
            .and_then(|batch| batch.medicines.iter_mut().find(|m| m.id == medicine_id));
        if let Some(medicine) = medicine {
            field.write(medicine);
        }
        next
    }

    pub fn add_medicine(&self, batch_id: u32, ids: &dyn IdentifierGenerator) -> Result<Self, Error> {
        if self.batch(batch_id).is_none() {
            return Err(Error::not_found("WholesalerPurchase"));
        }
        self.with_medicine(batch_id, Medicine::blank(ids.generate()))
            .ok_or_else(|| Error::not_found("WholesalerPurchase"))
    }

    /// Absent ids are ignored. A batch may end up with no medicines.
    pub fn remove_medicine(&self, batch_id: u32, medicine_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(batch) = next.batch_mut(batch_id) {
            batch.medicines.retain(|m| m.id != medicine_id);
        }
        next
    }

    pub fn remove_batch(&self, batch_id: u32) -> Self {
        let mut next = self.clone();
        next.purchases.retain(|b| b.id != batch_id);
        next
    }

    fn with_medicine(&self, batch_id: u32, medicine: Medicine) -> Option<Self> {
        let mut next = self.clone();
        next.batch_mut(batch_id)?.medicines.push(medicine);
        Some(next)
    }
}

impl IntakeForm {
    pub fn batch(&self, batch_id: u32) -> Option<&WholesalerPurchase> {
        self.purchases.iter().find(|b| b.id == batch_id)
    }

    pub fn medicine(&self, batch_id: u32, medicine_id: &str) -> Option<&Medicine> {
        self.batch(batch_id)?.medicine(medicine_id)
    }

    /// Total number of line items over all batches.
    pub fn line_count(&self) -> usize {
        self.purchases.iter().map(|b| b.medicines.len()).sum()
    }

    /// Medicine ids in submission order.
    pub fn medicine_ids(&self) -> Vec<&str> {
        self.purchases
            .iter()
            .flat_map(|b| b.medicines.iter().map(|m| m.id.as_str()))
            .collect()
    }

    fn batch_mut(&mut self, batch_id: u32) -> Option<&mut WholesalerPurchase> {
        self.purchases.iter_mut().find(|b| b.id == batch_id)
    }

    fn next_batch_id(&self) -> u32 {
        self.purchases.iter().map(|b| b.id).max().unwrap_or(0) + 1
    }

    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness { field: "id".to_string() });
        }
        Ok(())
    }

    fn validate_existing(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::not_found(AGGREGATE_TYPE));
        }
        Ok(())
    }
}
