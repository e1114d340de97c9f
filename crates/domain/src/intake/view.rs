use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use cqrs_es::{
    persist::{PersistenceError, ViewContext, ViewRepository},
    Aggregate, DomainEvent, EventEnvelope, View as CqrsView,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::cqrs::ViewRepo;
use super::{IntakeForm, AGGREGATE_TYPE};

/// Current state of one intake form, as presented to the operator.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct View {
    pub aggregate_type: String,
    pub command_id: String,
    pub id: String,
    pub form: IntakeForm,
}

impl CqrsView<IntakeForm> for View {
    fn update(&mut self, event: &EventEnvelope<IntakeForm>) {
        self.id.clone_from(&event.aggregate_id);
        self.aggregate_type = AGGREGATE_TYPE.to_string();
        self.command_id = event
            .metadata
            .get("command_id")
            .cloned()
            .unwrap_or_default();
        self.form.apply(event.payload.clone());
    }
}

/// Projects change events onto the form view, logging each one on the way.
pub struct Query {
    repo: ViewRepo,
}

impl Query {
    pub fn new(repo: ViewRepo) -> Self {
        Self { repo }
    }

    async fn project(
        &self,
        form_id: &str,
        events: &[EventEnvelope<IntakeForm>],
    ) -> Result<(), PersistenceError> {
        let (mut view, context) = self
            .repo
            .load_with_context(form_id)
            .await?
            .unwrap_or_else(|| (View::default(), ViewContext::new(form_id.to_string(), 0)));

        for event in events {
            tracing::info!(
                sequence = event.sequence,
                "{} on {}",
                event.payload.event_type(),
                form_id
            );
            view.update(event);
        }

        self.repo.update_view(view, context).await
    }
}

#[async_trait]
impl cqrs_es::Query<IntakeForm> for Query {
    async fn dispatch(&self, form_id: &str, events: &[EventEnvelope<IntakeForm>]) {
        if let Err(err) = self.project(form_id, events).await {
            tracing::error!("Intake view for {} not updated: {}", form_id, err);
        }
    }
}

/// View repository held in process memory.
pub struct MemViewRepository<V, A> {
    views: RwLock<HashMap<String, (V, i64)>>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<V, A> Default for MemViewRepository<V, A> {
    fn default() -> Self {
        Self {
            views: RwLock::new(HashMap::new()),
            _aggregate: PhantomData,
        }
    }
}

#[async_trait]
impl<V, A> ViewRepository<V, A> for MemViewRepository<V, A>
where
    V: CqrsView<A> + Clone,
    A: Aggregate,
{
    async fn load(&self, view_id: &str) -> Result<Option<V>, PersistenceError> {
        Ok(self.views.read().await.get(view_id).map(|(view, _)| view.clone()))
    }

    async fn load_with_context(
        &self,
        view_id: &str,
    ) -> Result<Option<(V, ViewContext)>, PersistenceError> {
        Ok(self
            .views
            .read()
            .await
            .get(view_id)
            .map(|(view, version)| (view.clone(), ViewContext::new(view_id.to_string(), *version))))
    }

    async fn update_view(&self, view: V, context: ViewContext) -> Result<(), PersistenceError> {
        let mut views = self.views.write().await;
        let stored = views.get(&context.view_instance_id).map(|(_, version)| *version).unwrap_or(0);
        if stored != context.version {
            return Err(PersistenceError::OptimisticLockError);
        }
        views.insert(context.view_instance_id, (view, context.version + 1));
        Ok(())
    }
}
