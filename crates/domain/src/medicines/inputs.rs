use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MedicineRecord;

/// New values for a stored record; the id comes from the route.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateMedicineInput {
    pub name: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub quantity: i64,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub wholesaler_name: String,
    pub purchase_date: String,
}

impl UpdateMedicineInput {
    pub fn into_record(self, id: String) -> MedicineRecord {
        MedicineRecord {
            id,
            name: self.name,
            batch_number: self.batch_number,
            expiry_date: self.expiry_date,
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            selling_price: self.selling_price,
            wholesaler_name: self.wholesaler_name,
            purchase_date: self.purchase_date,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchInput {
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn first_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}
