use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use super::aggregate::{Medicine, WholesalerPurchase};
use super::commands::{BatchField, MedicineField};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    FormOpened {
        id: String,
        operator: String,
        batch: WholesalerPurchase,
    },

    BatchFieldUpdated {
        batch_id: u32,
        field: BatchField,
    },

    MedicineFieldUpdated {
        batch_id: u32,
        medicine_id: String,
        field: MedicineField,
    },

    MedicineAdded {
        batch_id: u32,
        medicine: Medicine,
    },

    MedicineRemoved {
        batch_id: u32,
        medicine_id: String,
    },

    BatchAdded {
        batch: WholesalerPurchase,
    },

    BatchRemoved {
        batch_id: u32,
    },

    FormReset {
        batch: WholesalerPurchase,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::FormOpened { .. } => "IntakeForm:Opened".to_string(),
            Event::BatchFieldUpdated { .. } => "IntakeForm:BatchFieldUpdated".to_string(),
            Event::MedicineFieldUpdated { .. } => "IntakeForm:MedicineFieldUpdated".to_string(),
            Event::MedicineAdded { .. } => "IntakeForm:MedicineAdded".to_string(),
            Event::MedicineRemoved { .. } => "IntakeForm:MedicineRemoved".to_string(),
            Event::BatchAdded { .. } => "IntakeForm:BatchAdded".to_string(),
            Event::BatchRemoved { .. } => "IntakeForm:BatchRemoved".to_string(),
            Event::FormReset { .. } => "IntakeForm:Reset".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
