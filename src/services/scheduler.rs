use crate::domain::push::PushRequest;
use crate::domain::schedule::{ScheduledPush, ScheduledPushStatus, Snapshot};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Failed to encode push payload: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// What happened to an entry after a successful delivery was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The entry was re-armed for its next occurrence.
    Rearmed { next_push: OffsetDateTime },
    /// The final occurrence was delivered; the id is now in the completed set.
    Retired,
}

#[derive(Debug, Default)]
struct StoreState {
    schedules: HashMap<Uuid, ScheduledPush>,
    errored: Vec<ScheduledPush>,
    completed_ids: HashSet<Uuid>,
}

/// The authoritative collection of pending, errored, and completed scheduled
/// pushes. All access is serialized through one mutex; the scheduler loop is
/// the only writer of advance/retire transitions, API handlers only insert
/// and remove whole entries.
#[derive(Debug, Default)]
pub struct PushScheduler {
    state: Mutex<StoreState>,
}

impl PushScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store from a snapshot taken before the last shutdown.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(StoreState {
                schedules: snapshot.schedules,
                errored: snapshot.errored,
                completed_ids: snapshot.completed_ids,
            }),
        }
    }

    /// Validates and inserts a request. Resubmitting an id replaces any prior
    /// record of it, whichever partition currently holds it.
    ///
    /// # Errors
    /// Returns `SchedulerError::Validation` for out-of-range recurrence fields
    /// or a malformed device token.
    pub async fn schedule(&self, request: &PushRequest) -> Result<(), SchedulerError> {
        request.validate().map_err(SchedulerError::Validation)?;

        let entry = ScheduledPush {
            id: request.id,
            occurrences: request.schedule.occurrences,
            interval: request.schedule.interval,
            next_push: request.schedule.send_at,
            payload: serde_json::to_vec(request)?,
            error: None,
        };

        let mut state = self.state.lock().await;
        state.errored.retain(|errored| errored.id != entry.id);
        state.completed_ids.remove(&entry.id);
        state.schedules.insert(entry.id, entry);
        Ok(())
    }

    /// Looks up one id across the three partitions.
    pub async fn status(&self, id: Uuid) -> Option<ScheduledPushStatus> {
        let state = self.state.lock().await;
        if let Some(entry) = state.schedules.get(&id) {
            return Some(ScheduledPushStatus::Scheduled {
                id,
                remaining_occurrences: entry.occurrences,
                interval: entry.interval,
                next_push: entry.next_push,
            });
        }
        if state.completed_ids.contains(&id) {
            return Some(ScheduledPushStatus::Finished { id });
        }
        state.errored.iter().find(|entry| entry.id == id).map(|entry| ScheduledPushStatus::Failed {
            id,
            reason: entry.error.clone().unwrap_or_default(),
        })
    }

    /// Independent lookups for a batch of ids. Ids that resolve to nothing are
    /// omitted from the result; they never fail the batch.
    pub async fn statuses(&self, ids: &[Uuid]) -> HashMap<Uuid, ScheduledPushStatus> {
        let lookups = ids.iter().map(|id| async move { (*id, self.status(*id).await) });
        futures::future::join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(id, status)| status.map(|status| (id, status)))
            .collect()
    }

    /// Best-effort removal. Unknown or already-terminal ids are a no-op; a
    /// delivery already handed to the gateway cannot be aborted.
    pub async fn cancel(&self, id: Uuid) {
        let removed = self.state.lock().await.schedules.remove(&id).is_some();
        if removed {
            tracing::info!(%id, "Cancelled scheduled push");
        } else {
            tracing::debug!(%id, "Cancel requested for unknown or finished id");
        }
    }

    /// Entries due for delivery at `now`. Returns clones so the lock is not
    /// held while the gateway is being called.
    pub async fn due_entries(&self, now: OffsetDateTime) -> Vec<ScheduledPush> {
        self.state.lock().await.schedules.values().filter(|entry| entry.is_due(now)).cloned().collect()
    }

    /// Advances an entry after a successful delivery: finite occurrence counts
    /// decrement by one, and the next fire time is computed from delivery
    /// completion (`now + interval`) rather than the prior theoretical fire
    /// time, so a slow gateway call shifts the cadence instead of causing an
    /// immediate re-fire. An entry reaching zero moves to the completed set in
    /// the same step.
    ///
    /// Returns `None` if the entry was cancelled while the delivery was in
    /// flight.
    pub async fn record_success(&self, id: Uuid, now: OffsetDateTime) -> Option<Advance> {
        let mut state = self.state.lock().await;
        let entry = state.schedules.get_mut(&id)?;

        if !entry.repeats_until_cancelled() {
            entry.occurrences -= 1;
        }
        let next_push = now + Duration::seconds(entry.interval);
        entry.next_push = next_push;

        if entry.occurrences == 0 {
            state.schedules.remove(&id);
            state.completed_ids.insert(id);
            return Some(Advance::Retired);
        }
        Some(Advance::Rearmed { next_push })
    }

    /// Moves an entry to the errored partition. Terminal; errored entries are
    /// never retried automatically.
    pub async fn record_failure(&self, id: Uuid, reason: String) {
        let mut state = self.state.lock().await;
        if let Some(mut entry) = state.schedules.remove(&id) {
            entry.error = Some(reason);
            state.errored.push(entry);
        }
    }

    /// A point-in-time copy of all three partitions, for persistence.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        Snapshot {
            schedules: state.schedules.clone(),
            errored: state.errored.clone(),
            completed_ids: state.completed_ids.clone(),
        }
    }
}
