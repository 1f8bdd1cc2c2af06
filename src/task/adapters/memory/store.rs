//! In-memory task and participation store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::domain::PrincipalId;
use crate::task::{
    domain::{AdmissionPolicy, Participation, ParticipationId, RosterSnapshot, Task, TaskId, TaskStatus},
    ports::{ParticipationRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory store implementing both task ports.
///
/// Every unit of work runs under a single write lock, so admission checks and
/// inserts are atomic with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    participations: HashMap<ParticipationId, Participation>,
    task_index: HashMap<TaskId, Vec<ParticipationId>>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl InMemoryTaskState {
    fn task(&self, task_id: TaskId) -> TaskRepositoryResult<&Task> {
        self.tasks
            .get(&task_id)
            .ok_or(TaskRepositoryError::NotFound(task_id))
    }

    fn participations_for(&self, task_id: TaskId) -> impl Iterator<Item = &Participation> {
        self.task_index
            .get(&task_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.participations.get(id))
    }

    fn active_id(&self, task_id: TaskId, participant: &PrincipalId) -> Option<ParticipationId> {
        self.participations_for(task_id)
            .find(|p| p.is_active() && p.participant() == participant)
            .map(Participation::id)
    }

    fn roster(&self, task_id: TaskId, participant: &PrincipalId) -> RosterSnapshot {
        let mut snapshot = RosterSnapshot::default();
        for participation in self.participations_for(task_id).filter(|p| p.is_active()) {
            snapshot.active_count = snapshot.active_count.saturating_add(1);
            if participation.participant() == participant {
                snapshot.candidate_active = true;
            }
        }
        snapshot
    }
}

fn sorted_tasks(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| (task.scheduled_at(), task.created_at()));
    tasks
}

fn sorted_participations(mut participations: Vec<Participation>) -> Vec<Participation> {
    participations.sort_by_key(Participation::joined_at);
    participations
}

#[async_trait]
impl TaskRepository for InMemoryTaskStore {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task, expected_revision: u64) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let actual = state.task(task.id())?.revision();
        if actual != expected_revision {
            return Err(TaskRepositoryError::StaleRevision {
                task_id: task.id(),
                expected: expected_revision,
                actual,
            });
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_by_creator(&self, creator: &PrincipalId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let tasks = state
            .tasks
            .values()
            .filter(|task| task.is_created_by(creator))
            .cloned()
            .collect();
        Ok(sorted_tasks(tasks))
    }

    async fn list_by_status(&self, status: TaskStatus) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let tasks = state
            .tasks
            .values()
            .filter(|task| task.status() == status)
            .cloned()
            .collect();
        Ok(sorted_tasks(tasks))
    }
}

#[async_trait]
impl ParticipationRepository for InMemoryTaskStore {
    async fn admit(&self, participation: &Participation) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let task_id = participation.task_id();
        let task = state.task(task_id)?;
        let roster = state.roster(task_id, participation.participant());
        AdmissionPolicy::evaluate_join(task, participation.participant(), roster)
            .map_err(TaskRepositoryError::Rejected)?;

        if state.participations.contains_key(&participation.id()) {
            return Err(TaskRepositoryError::DuplicateParticipation(
                participation.id(),
            ));
        }
        state
            .participations
            .insert(participation.id(), participation.clone());
        state
            .task_index
            .entry(task_id)
            .or_default()
            .push(participation.id());
        Ok(())
    }

    async fn withdraw(
        &self,
        task_id: TaskId,
        participant: &PrincipalId,
        left_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Participation> {
        let mut state = self.write()?;
        let task = state.task(task_id)?;
        let roster = state.roster(task_id, participant);
        AdmissionPolicy::evaluate_leave(task, participant, roster)
            .map_err(TaskRepositoryError::Rejected)?;

        let participation = state
            .active_id(task_id, participant)
            .and_then(|id| state.participations.get_mut(&id))
            .ok_or_else(|| {
                TaskRepositoryError::invalid_persisted_data(std::io::Error::other(
                    "roster reported an active participation that is missing",
                ))
            })?;
        participation
            .mark_left(left_at)
            .map_err(TaskRepositoryError::Rejected)?;
        Ok(participation.clone())
    }

    async fn count_active(&self, task_id: TaskId) -> TaskRepositoryResult<u32> {
        let state = self.read()?;
        let count = state
            .participations_for(task_id)
            .filter(|p| p.is_active())
            .count();
        u32::try_from(count).map_err(TaskRepositoryError::persistence)
    }

    async fn find_active(
        &self,
        task_id: TaskId,
        participant: &PrincipalId,
    ) -> TaskRepositoryResult<Option<Participation>> {
        let state = self.read()?;
        Ok(state
            .participations_for(task_id)
            .find(|p| p.is_active() && p.participant() == participant)
            .cloned())
    }

    async fn list_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Participation>> {
        let state = self.read()?;
        let participations = state.participations_for(task_id).cloned().collect();
        Ok(sorted_participations(participations))
    }

    async fn list_by_participant(
        &self,
        participant: &PrincipalId,
    ) -> TaskRepositoryResult<Vec<Participation>> {
        let state = self.read()?;
        let participations = state
            .participations
            .values()
            .filter(|p| p.participant() == participant)
            .cloned()
            .collect();
        Ok(sorted_participations(participations))
    }
}
