use std::sync::Arc;

use cqrs_es::{
    mem_store::MemStore,
    persist::{PersistedEventStore, ViewRepository},
    CqrsFramework, Query as CqrsQuery,
};
use dynamo_es::{DynamoEventRepository, DynamoViewRepository};

use crate::config::Config;

use super::{IntakeForm, IntakeServices, MemViewRepository, Query, View};

pub type DynamoIntakeStore = PersistedEventStore<DynamoEventRepository, IntakeForm>;

pub type ViewRepo = Arc<Box<dyn ViewRepository<View, IntakeForm>>>;

/// Event store over the DynamoDB event log, snapshotting every 5 events.
pub fn event_store(client: aws_sdk_dynamodb::Client, config: &Config) -> DynamoIntakeStore {
    PersistedEventStore::new_snapshot_store(
        DynamoEventRepository::new(client)
            .with_tables(&config.event_log_table, &config.event_snapshots_table),
        5,
    )
}

pub fn init(
    client: aws_sdk_dynamodb::Client,
    config: &Config,
    repo: ViewRepo,
    services: IntakeServices,
) -> Arc<CqrsFramework<IntakeForm, DynamoIntakeStore>> {
    let store = event_store(client, config);

    Arc::new(CqrsFramework::new(store, queries(repo), services))
}

pub fn init_repo(client: aws_sdk_dynamodb::Client, config: &Config) -> ViewRepo {
    Arc::new(Box::new(DynamoViewRepository::new(&config.intake_view_table, client)))
}

/// Process-local framework, for tests and tooling that need no AWS account.
/// Clones of `store` share its events.
pub fn init_in_memory(
    store: MemStore<IntakeForm>,
    repo: ViewRepo,
    services: IntakeServices,
) -> Arc<CqrsFramework<IntakeForm, MemStore<IntakeForm>>> {
    Arc::new(CqrsFramework::new(store, queries(repo), services))
}

pub fn init_in_memory_repo() -> ViewRepo {
    Arc::new(Box::new(MemViewRepository::<View, IntakeForm>::default()))
}

fn queries(repo: ViewRepo) -> Vec<Box<dyn CqrsQuery<IntakeForm>>> {
    vec![Box::new(Query::new(repo))]
}
