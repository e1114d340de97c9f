use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::intake::{Medicine, WholesalerPurchase};

/// A persisted line item, with the owning batch's wholesaler and date copied in.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct MedicineRecord {
    pub id: String,
    pub name: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub quantity: i64,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub wholesaler_name: String,
    pub purchase_date: String,
}

impl MedicineRecord {
    pub fn from_line(batch: &WholesalerPurchase, medicine: &Medicine) -> Self {
        Self {
            id: medicine.id.clone(),
            name: medicine.name.clone(),
            batch_number: medicine.batch_number.clone(),
            expiry_date: medicine.expiry_date.clone(),
            quantity: medicine.quantity,
            purchase_price: medicine.purchase_price,
            selling_price: medicine.selling_price,
            wholesaler_name: batch.wholesaler_name.clone(),
            purchase_date: batch.purchase_date.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct MedicineSummary {
    pub name: String,
    pub selling_price: Option<Decimal>,
}

/// Case-insensitive name search over `records`, returning the 1-based `page`.
pub fn search_page(
    records: &[MedicineRecord],
    query: &str,
    page: u32,
    limit: u32,
) -> Result<Vec<MedicineSummary>, Error> {
    if page == 0 || limit == 0 {
        return Err(Error::Validation {
            message: "page and limit must be at least 1".to_string(),
        });
    }
    let needle = query.to_lowercase();
    let skip = (page as usize - 1) * limit as usize;

    Ok(records
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .skip(skip)
        .take(limit as usize)
        .map(|r| MedicineSummary {
            name: r.name.clone(),
            selling_price: Some(r.selling_price),
        })
        .collect())
}
