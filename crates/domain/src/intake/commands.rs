use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::{Medicine, WholesalerPurchase};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Start a form with one batch holding one blank medicine
    OpenForm {
        id: String,
        operator: String,
        purchase_date: String,
    },

    UpdateBatch {
        batch_id: u32,
        field: BatchField,
    },

    UpdateMedicine {
        batch_id: u32,
        medicine_id: String,
        field: MedicineField,
    },

    /// Append a blank medicine row to a batch
    AddMedicine {
        batch_id: u32,
    },

    RemoveMedicine {
        batch_id: u32,
        medicine_id: String,
    },

    AddBatch {
        purchase_date: String,
    },

    RemoveBatch {
        batch_id: u32,
    },

    /// Replace everything with a fresh opening batch (after a successful submission)
    ResetForm {
        purchase_date: String,
    },
}

/// Editable batch fields.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum BatchField {
    WholesalerName(String),
    PurchaseDate(String),
}

impl BatchField {
    pub(crate) fn write(&self, batch: &mut WholesalerPurchase) {
        match self {
            Self::WholesalerName(value) => batch.wholesaler_name.clone_from(value),
            Self::PurchaseDate(value) => batch.purchase_date.clone_from(value),
        }
    }
}

/// Editable medicine fields. Numbers are taken as entered; there is no lower bound.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum MedicineField {
    Name(String),
    BatchNumber(String),
    ExpiryDate(String),
    Quantity(i64),
    PurchasePrice(Decimal),
    SellingPrice(Decimal),
}

impl MedicineField {
    pub(crate) fn write(&self, medicine: &mut Medicine) {
        match self {
            Self::Name(value) => medicine.name.clone_from(value),
            Self::BatchNumber(value) => medicine.batch_number.clone_from(value),
            Self::ExpiryDate(value) => medicine.expiry_date.clone_from(value),
            Self::Quantity(value) => medicine.quantity = *value,
            Self::PurchasePrice(value) => medicine.purchase_price = *value,
            Self::SellingPrice(value) => medicine.selling_price = *value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_updates_use_field_value_shape() {
        let batch: BatchField =
            serde_json::from_str(r#"{"field":"wholesaler_name","value":"W1"}"#).expect("batch field");
        assert_eq!(batch, BatchField::WholesalerName("W1".to_string()));

        let quantity: MedicineField =
            serde_json::from_str(r#"{"field":"quantity","value":-3}"#).expect("quantity");
        assert_eq!(quantity, MedicineField::Quantity(-3));

        let price: MedicineField =
            serde_json::from_str(r#"{"field":"selling_price","value":"12.50"}"#).expect("price");
        assert_eq!(price, MedicineField::SellingPrice(Decimal::new(1250, 2)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<MedicineField>(r#"{"field":"discount","value":"1"}"#);
        assert!(parsed.is_err());
    }
}
