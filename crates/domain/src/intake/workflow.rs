use std::collections::HashMap;
use std::sync::Arc;

use cqrs_es::persist::ViewRepository;
use cqrs_es::{AggregateContext, AggregateError, CqrsFramework, EventStore};
use ulid::Ulid;

use crate::errors::Error;
use crate::medicines::MedicineService;
use crate::notify::NotificationChannel;
use crate::session::{AuthGate, Navigator, Session};

use super::cqrs::ViewRepo;
use super::submission::{SubmissionPipeline, SubmissionReport};
use super::{Command, IntakeForm, View, AGGREGATE_TYPE};

/// Runs when the intake view mounts: checks the session, then asks the remote
/// store to prepare for the user. A failed preparation is reported, not fatal.
pub async fn mount_intake(
    gate: &AuthGate,
    session: &Session,
    service: &dyn MedicineService,
    notifier: &dyn NotificationChannel,
    navigator: &dyn Navigator,
) -> Option<String> {
    let user_id = gate.admit(session, notifier, navigator)?;

    match service.initialize(&user_id).await {
        Ok(()) => notifier.success("Database initialized successfully!"),
        Err(err) => {
            tracing::error!("Error initializing the database for user {}: {}", user_id, err);
            notifier.error("Error initializing database. Please try again.");
        }
    }
    Some(user_id)
}

/// Intake forms of all operators, driven through the CQRS framework.
///
/// Commands and submission work on the form replayed from `store`; the view
/// repository only serves what is shown back to the operator.
pub struct StockIntake<ES>
where
    ES: EventStore<IntakeForm>,
{
    cqrs: Arc<CqrsFramework<IntakeForm, ES>>,
    store: ES,
    repo: ViewRepo,
}

impl<ES> StockIntake<ES>
where
    ES: EventStore<IntakeForm>,
{
    pub fn new(cqrs: Arc<CqrsFramework<IntakeForm, ES>>, store: ES, repo: ViewRepo) -> Self {
        Self { cqrs, store, repo }
    }

    /// Opens a new form owned by `operator` and returns its first view.
    pub async fn open(&self, operator: &str, purchase_date: &str) -> Result<View, Error> {
        let form_id = Ulid::new().to_string();
        let command = Command::OpenForm {
            id: form_id.clone(),
            operator: operator.to_string(),
            purchase_date: purchase_date.to_string(),
        };

        self.dispatch(&form_id, command).await?;
        self.view(&form_id).await
    }

    /// Loads the form view, refusing anyone but its operator.
    pub async fn load(&self, form_id: &str, user_id: &str) -> Result<View, Error> {
        let view = self.view(form_id).await?;
        if view.form.operator != user_id {
            return Err(Error::Forbidden);
        }
        Ok(view)
    }

    pub async fn execute(&self, form_id: &str, user_id: &str, command: Command) -> Result<View, Error> {
        self.form(form_id, user_id).await?;
        self.dispatch(form_id, command).await?;
        self.view(form_id).await
    }

    /// Submits the form's line items, then starts over with a fresh form when
    /// every item was stored. On failure the form keeps its rows.
    pub async fn submit(
        &self,
        form_id: &str,
        user_id: &str,
        purchase_date: &str,
        service: &dyn MedicineService,
        notifier: &dyn NotificationChannel,
    ) -> Result<SubmissionReport, Error> {
        let form = self.form(form_id, user_id).await?;
        let report = SubmissionPipeline::new(service, notifier)
            .submit(&form, user_id)
            .await;

        if report.succeeded() {
            let command = Command::ResetForm {
                purchase_date: purchase_date.to_string(),
            };
            self.dispatch(form_id, command).await?;
        }
        Ok(report)
    }

    /// The form as replayed from its events, owned by `user_id`.
    async fn form(&self, form_id: &str, user_id: &str) -> Result<IntakeForm, Error> {
        let context = self.store.load_aggregate(form_id).await.map_err(domain_error)?;
        let form = context.aggregate();
        if form.id.is_empty() {
            return Err(Error::not_found(AGGREGATE_TYPE));
        }
        if form.operator != user_id {
            return Err(Error::Forbidden);
        }
        Ok(form.clone())
    }

    async fn dispatch(&self, form_id: &str, command: Command) -> Result<(), Error> {
        let mut metadata = HashMap::new();
        metadata.insert("command_id".to_string(), Ulid::new().to_string());

        self.cqrs
            .execute_with_metadata(form_id, command, metadata)
            .await
            .map_err(domain_error)
    }

    async fn view(&self, form_id: &str) -> Result<View, Error> {
        self.repo
            .load(form_id)
            .await
            .map_err(Error::persistence)?
            .ok_or_else(|| Error::not_found(AGGREGATE_TYPE))
    }
}

fn domain_error(err: AggregateError<Error>) -> Error {
    match err {
        AggregateError::UserError(err) => err,
        other => Error::persistence(other),
    }
}
