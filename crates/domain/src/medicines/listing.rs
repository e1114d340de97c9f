use serde::{Deserialize, Serialize};

use crate::notify::NotificationChannel;
use crate::session::{AuthGate, Navigator, Session};

use super::{MedicineRecord, MedicineService};

pub const NO_MEDICINES: &str =
    "No medicines available. Please add some medicines to your inventory.";

/// What the medicines list shows after loading.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "state", content = "rows", rename_all = "lowercase")]
pub enum ListingState {
    Empty,
    /// Rows exactly as the store returned them.
    Rows(Vec<MedicineRecord>),
    /// The fetch failed; nothing to show.
    Unavailable,
}

impl ListingState {
    pub fn rows(&self) -> &[MedicineRecord] {
        match self {
            Self::Rows(rows) => rows,
            Self::Empty | Self::Unavailable => &[],
        }
    }
}

/// Runs when the listing view mounts. Returns `None` when the gate redirected.
pub async fn load_listing(
    gate: &AuthGate,
    session: &Session,
    service: &dyn MedicineService,
    notifier: &dyn NotificationChannel,
    navigator: &dyn Navigator,
) -> Option<ListingState> {
    let user_id = gate.admit(session, notifier, navigator)?;

    let state = match service.get_medicine(&user_id).await {
        Ok(rows) => {
            notifier.success("Medicines loaded successfully!");
            if rows.is_empty() {
                ListingState::Empty
            } else {
                ListingState::Rows(rows)
            }
        }
        Err(err) => {
            tracing::error!("Error fetching medicines: {}", err);
            notifier.error("Failed to load medicines.");
            ListingState::Unavailable
        }
    };
    Some(state)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::errors::Error;
    use crate::notify::{Level, Notices};
    use crate::session::PendingRedirect;

    struct FixedService(Result<Vec<MedicineRecord>, Error>);

    #[async_trait]
    impl MedicineService for FixedService {
        async fn initialize(&self, _user_id: &str) -> Result<(), Error> {
            Ok(())
        }

        async fn insert_medicine(&self, _user_id: &str, _record: &MedicineRecord) -> Result<(), Error> {
            Ok(())
        }

        async fn get_medicine(&self, _user_id: &str) -> Result<Vec<MedicineRecord>, Error> {
            self.0.clone()
        }
    }

    fn record(id: &str) -> MedicineRecord {
        MedicineRecord {
            id: id.to_string(),
            name: format!("Medicine {}", id),
            batch_number: String::new(),
            expiry_date: String::new(),
            quantity: 1,
            purchase_price: Decimal::ONE,
            selling_price: Decimal::TWO,
            wholesaler_name: "W1".to_string(),
            purchase_date: "2024-01-01".to_string(),
        }
    }

    async fn load(service: FixedService, session: Session) -> (Option<ListingState>, Notices, PendingRedirect) {
        let notices = Notices::new();
        let redirect = PendingRedirect::default();
        let state = load_listing(&AuthGate::default(), &session, &service, &notices, &redirect).await;
        (state, notices, redirect)
    }

    #[tokio::test]
    async fn empty_result_shows_empty_state() {
        let (state, _, _) = load(FixedService(Ok(vec![])), Session::authenticated("u1")).await;
        assert_eq!(state, Some(ListingState::Empty));
    }

    #[tokio::test]
    async fn rows_keep_received_order() {
        let records = vec![record("c"), record("a"), record("b")];
        let (state, notices, _) = load(FixedService(Ok(records.clone())), Session::authenticated("u1")).await;

        let state = state.expect("admitted");
        assert_eq!(state.rows(), records.as_slice());
        assert_eq!(notices.take()[0].level, Level::Success);
    }

    #[tokio::test]
    async fn fetch_failure_notifies_once() {
        let (state, notices, _) = load(
            FixedService(Err(Error::remote("timeout"))),
            Session::authenticated("u1"),
        )
        .await;

        assert_eq!(state, Some(ListingState::Unavailable));
        let taken = notices.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].message, "Failed to load medicines.");
    }

    #[tokio::test]
    async fn anonymous_session_is_redirected() {
        let (state, _, redirect) = load(FixedService(Ok(vec![record("a")])), Session::Anonymous).await;
        assert!(state.is_none());
        assert_eq!(redirect.take().as_deref(), Some("/login"));
    }
}
