use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OpenIntakeInput {
    /// Defaults to today
    pub purchase_date: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddBatchInput {
    pub purchase_date: Option<String>,
}
