//! Shared world state for participation BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use samaritan::error::FailureKind;
use samaritan::identity::{
    domain::Principal,
    services::{ClaimsConfig, ClaimsResolver},
};
use samaritan::task::{
    adapters::memory::InMemoryTaskStore, domain::Task, services::TaskLifecycleService,
};
use serde_json::json;

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<InMemoryTaskStore, DefaultClock>;

/// Scenario world for participation behaviour tests.
pub struct ParticipationWorld {
    pub service: TestTaskService,
    pub resolver: ClaimsResolver,
    pub principals: HashMap<String, Principal>,
    pub task: Option<Task>,
    pub last_outcome: Option<Result<(), FailureKind>>,
}

impl ParticipationWorld {
    /// Creates a world with an empty store and the default claim layout.
    ///
    /// # Panics
    ///
    /// Panics if the default claims configuration is rejected.
    #[must_use]
    pub fn new() -> Self {
        let service = TaskLifecycleService::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            resolver: ClaimsResolver::new(&ClaimsConfig::default())
                .expect("default claims configuration is valid"),
            principals: HashMap::new(),
            task: None,
            last_outcome: None,
        }
    }

    /// Resolves and remembers the principal for `subject` from a token
    /// carrying `roles`.
    pub fn register(&mut self, subject: &str, roles: &[&str]) -> Result<(), eyre::Report> {
        let principal = self.resolver.resolve_value(&json!({
            "sub": subject,
            "realm_access": { "roles": roles },
        }))?;
        self.principals.insert(subject.to_owned(), principal);
        Ok(())
    }

    /// Returns the principal for `subject`, resolving a token without roles
    /// for subjects never registered.
    pub fn principal(&mut self, subject: &str) -> Result<Principal, eyre::Report> {
        if !self.principals.contains_key(subject) {
            self.register(subject, &[])?;
        }
        self.principals
            .get(subject)
            .cloned()
            .ok_or_else(|| eyre::eyre!("principal {subject} was not registered"))
    }

    /// Returns the scenario task.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for ParticipationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ParticipationWorld {
    ParticipationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
