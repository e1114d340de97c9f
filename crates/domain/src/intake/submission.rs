//! Sequential persistence of an intake form.
//!
//! Line items are sent one at a time in form order (batch order, then row
//! order). The first rejected call stops the run; nothing already stored is
//! undone on either side.

use serde::{Deserialize, Serialize};

use crate::medicines::{MedicineRecord, MedicineService};
use crate::notify::NotificationChannel;

use super::IntakeForm;

pub const SUBMIT_SUCCESS: &str = "Medicines added successfully!";
pub const SUBMIT_FAILURE: &str = "Failed to add medicines.";

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemStatus {
    Persisted,
    Failed { reason: String },
    /// Not attempted because an earlier item failed.
    Skipped,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ItemOutcome {
    pub batch_id: u32,
    pub medicine_id: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Per-item result of one submission, in form order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct SubmissionReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl SubmissionReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status == ItemStatus::Persisted)
    }

    /// Number of remote calls that were made.
    pub fn calls_issued(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status != ItemStatus::Skipped).count()
    }

    pub fn failure(&self) -> Option<&ItemOutcome> {
        self.outcomes
            .iter()
            .find(|o| matches!(o.status, ItemStatus::Failed { .. }))
    }
}

pub struct SubmissionPipeline<'a> {
    service: &'a dyn MedicineService,
    notifier: &'a dyn NotificationChannel,
}

impl<'a> SubmissionPipeline<'a> {
    pub fn new(service: &'a dyn MedicineService, notifier: &'a dyn NotificationChannel) -> Self {
        Self { service, notifier }
    }

    /// Persists every line item of `form` for `user_id`. Exactly one notice is
    /// sent: success when every call resolved, a generic failure otherwise.
    pub async fn submit(&self, form: &IntakeForm, user_id: &str) -> SubmissionReport {
        let mut report = SubmissionReport::default();
        let mut failed = false;

        for batch in &form.purchases {
            for medicine in &batch.medicines {
                let status = if failed {
                    ItemStatus::Skipped
                } else {
                    let record = MedicineRecord::from_line(batch, medicine);
                    match self.service.insert_medicine(user_id, &record).await {
                        Ok(()) => ItemStatus::Persisted,
                        Err(err) => {
                            tracing::error!("Error adding medicine {}: {}", medicine.id, err);
                            failed = true;
                            ItemStatus::Failed { reason: err.to_string() }
                        }
                    }
                };

                report.outcomes.push(ItemOutcome {
                    batch_id: batch.id,
                    medicine_id: medicine.id.clone(),
                    status,
                });
            }
        }

        if failed {
            self.notifier.error(SUBMIT_FAILURE);
        } else {
            tracing::info!("Submitted {} medicines for {}", report.outcomes.len(), user_id);
            self.notifier.success(SUBMIT_SUCCESS);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use cqrs_es::Aggregate;

    use super::*;
    use crate::errors::Error;
    use crate::intake::{Event, Medicine, WholesalerPurchase};
    use crate::notify::{Level, Notices};

    /// Records every insert; rejects the call whose 1-based position is `fail_at`.
    #[derive(Default)]
    struct ScriptedService {
        calls: Mutex<Vec<(String, MedicineRecord)>>,
        fail_at: Option<usize>,
    }

    impl ScriptedService {
        fn failing_at(position: usize) -> Self {
            Self {
                fail_at: Some(position),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, MedicineRecord)> {
            self.calls.lock().expect("calls").clone()
        }
    }

    #[async_trait]
    impl MedicineService for ScriptedService {
        async fn initialize(&self, _user_id: &str) -> Result<(), Error> {
            Ok(())
        }

        async fn insert_medicine(&self, user_id: &str, record: &MedicineRecord) -> Result<(), Error> {
            let mut calls = self.calls.lock().expect("calls");
            calls.push((user_id.to_string(), record.clone()));
            if Some(calls.len()) == self.fail_at {
                return Err(Error::remote("write rejected"));
            }
            Ok(())
        }

        async fn get_medicine(&self, _user_id: &str) -> Result<Vec<MedicineRecord>, Error> {
            Ok(vec![])
        }
    }

    fn named(id: &str, name: &str) -> Medicine {
        Medicine {
            name: name.to_string(),
            ..Medicine::blank(id.to_string())
        }
    }

    fn form_with(batches: Vec<WholesalerPurchase>) -> IntakeForm {
        let mut form = IntakeForm::default();
        let mut batches = batches.into_iter();
        if let Some(first) = batches.next() {
            form.apply(Event::FormOpened {
                id: "form-1".to_string(),
                operator: "u1".to_string(),
                batch: first,
            });
        }
        for batch in batches {
            form.apply(Event::BatchAdded { batch });
        }
        form
    }

    fn batch(id: u32, wholesaler: &str, date: &str, medicines: Vec<Medicine>) -> WholesalerPurchase {
        WholesalerPurchase {
            id,
            wholesaler_name: wholesaler.to_string(),
            purchase_date: date.to_string(),
            medicines,
        }
    }

    #[tokio::test]
    async fn sends_each_row_in_order_with_batch_fields() {
        let form = form_with(vec![batch(
            1,
            "W1",
            "2024-01-01",
            vec![named("m1", "Aspirin"), named("m2", "Baclofen")],
        )]);
        let service = ScriptedService::default();
        let notices = Notices::new();

        let report = SubmissionPipeline::new(&service, &notices).submit(&form, "u1").await;

        let calls = service.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.id, "m1");
        assert_eq!(calls[1].1.id, "m2");
        for (user_id, record) in &calls {
            assert_eq!(user_id, "u1");
            assert_eq!(record.wholesaler_name, "W1");
            assert_eq!(record.purchase_date, "2024-01-01");
        }
        assert!(report.succeeded());
        assert_eq!(notices.take(), vec![crate::notify::Notice::new(Level::Success, SUBMIT_SUCCESS)]);
    }

    #[tokio::test]
    async fn walks_batches_in_order() {
        let form = form_with(vec![
            batch(1, "W1", "2024-01-01", vec![named("a", "A")]),
            batch(2, "W2", "2024-01-02", vec![named("b", "B"), named("c", "C")]),
        ]);
        let service = ScriptedService::default();
        let notices = Notices::new();

        SubmissionPipeline::new(&service, &notices).submit(&form, "u1").await;

        let sent: Vec<(String, String)> = service
            .calls()
            .into_iter()
            .map(|(_, r)| (r.id, r.wholesaler_name))
            .collect();
        assert_eq!(
            sent,
            vec![
                ("a".to_string(), "W1".to_string()),
                ("b".to_string(), "W2".to_string()),
                ("c".to_string(), "W2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn first_failure_stops_the_run() {
        let form = form_with(vec![batch(
            1,
            "W1",
            "2024-01-01",
            vec![named("m1", "A"), named("m2", "B"), named("m3", "C")],
        )]);
        let service = ScriptedService::failing_at(2);
        let notices = Notices::new();

        let report = SubmissionPipeline::new(&service, &notices).submit(&form, "u1").await;

        assert_eq!(service.calls().len(), 2);
        assert_eq!(report.calls_issued(), 2);
        assert!(!report.succeeded());
        assert_eq!(report.outcomes[0].status, ItemStatus::Persisted);
        assert_eq!(report.failure().map(|o| o.medicine_id.as_str()), Some("m2"));
        assert_eq!(report.outcomes[2].status, ItemStatus::Skipped);

        let taken = notices.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].level, Level::Error);
        assert_eq!(taken[0].message, SUBMIT_FAILURE);
    }

    #[tokio::test]
    async fn blank_rows_are_submitted_as_is() {
        let form = form_with(vec![batch(1, "", "", vec![Medicine::blank("m1".to_string())])]);
        let service = ScriptedService::default();
        let notices = Notices::new();

        let report = SubmissionPipeline::new(&service, &notices).submit(&form, "u1").await;

        assert!(report.succeeded());
        let (_, record) = &service.calls()[0];
        assert_eq!(record.name, "");
        assert_eq!(record.quantity, 0);
    }

    #[tokio::test]
    async fn empty_form_succeeds_without_calls() {
        let form = form_with(vec![batch(1, "W1", "2024-01-01", vec![])]);
        let service = ScriptedService::default();
        let notices = Notices::new();

        let report = SubmissionPipeline::new(&service, &notices).submit(&form, "u1").await;

        assert!(report.succeeded());
        assert!(service.calls().is_empty());
        assert_eq!(notices.take().len(), 1);
    }
}
