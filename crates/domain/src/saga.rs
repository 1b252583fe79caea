//! Saga journal record for composite event writes
//!
//! A create or update touches up to three collections without a
//! multi-document transaction. Each call is tracked as a [`SagaRecord`] whose
//! state only moves along the edges allowed by [`SagaState::can_transition_to`],
//! so a process restart can tell which composite writes were left half done.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, EventId, FacilityHistoryId, SagaId, TaskId};

/// Which composite operation a saga tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaKind {
    Create,
    Update,
}

impl SagaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for SagaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SagaKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            other => Err(DomainError::validation(format!(
                "Unknown saga kind: '{}'",
                other
            ))),
        }
    }
}

/// Progress of a composite write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaState {
    /// Journaled, nothing written yet
    Pending,
    /// Both fan-out units finished successfully
    SubEntitiesCreated,
    /// Event document created or updated
    EventPersisted,
    /// Sub-entity back-links point at the event (create only)
    BackLinked,
    Committed,
    RollingBack,
    RolledBack,
    /// A compensating action failed; data may be inconsistent
    RollbackFailed,
}

impl SagaState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::SubEntitiesCreated => "sub_entities_created",
            Self::EventPersisted => "event_persisted",
            Self::BackLinked => "back_linked",
            Self::Committed => "committed",
            Self::RollingBack => "rolling_back",
            Self::RolledBack => "rolled_back",
            Self::RollbackFailed => "rollback_failed",
        }
    }

    /// Committed and RolledBack are final. RollbackFailed is not: recovery
    /// may retry the compensation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    pub fn can_transition_to(&self, kind: SagaKind, next: SagaState) -> bool {
        use SagaState::*;
        match (self, next) {
            (Pending, SubEntitiesCreated) => true,
            (SubEntitiesCreated, EventPersisted) => true,
            (EventPersisted, BackLinked) => kind == SagaKind::Create,
            (EventPersisted, Committed) => kind == SagaKind::Update,
            (BackLinked, Committed) => kind == SagaKind::Create,
            (Pending | SubEntitiesCreated | EventPersisted | BackLinked, RollingBack) => true,
            (RollingBack, RolledBack | RollbackFailed) => true,
            (RollbackFailed, RollingBack) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SagaState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sub_entities_created" => Ok(Self::SubEntitiesCreated),
            "event_persisted" => Ok(Self::EventPersisted),
            "back_linked" => Ok(Self::BackLinked),
            "committed" => Ok(Self::Committed),
            "rolling_back" => Ok(Self::RollingBack),
            "rolled_back" => Ok(Self::RolledBack),
            "rollback_failed" => Ok(Self::RollbackFailed),
            other => Err(DomainError::validation(format!(
                "Unknown saga state: '{}'",
                other
            ))),
        }
    }
}

/// Durable intent record for one create/update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaRecord {
    pub id: SagaId,
    pub kind: SagaKind,
    pub state: SagaState,
    /// Known up front for updates, set after persist for creates
    pub event_id: Option<EventId>,
    pub task_ids: Vec<TaskId>,
    pub facility_history_ids: Vec<FacilityHistoryId>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SagaRecord {
    pub fn begin(kind: SagaKind, event_id: Option<EventId>, now: DateTime<Utc>) -> Self {
        Self {
            id: SagaId::new(),
            kind,
            state: SagaState::Pending,
            event_id,
            task_ids: Vec::new(),
            facility_history_ids: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next`, rejecting edges the state machine does not allow.
    pub fn advance(&mut self, next: SagaState, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.state.can_transition_to(self.kind, next) {
            return Err(DomainError::invalid_state_transition(format!(
                "{} saga {}: {} -> {}",
                self.kind, self.id, self.state, next
            )));
        }
        self.state = next;
        self.updated_at = now;
        Ok(())
    }

    /// Record the ids touched by the fan-out so far.
    pub fn with_touched(
        mut self,
        task_ids: Vec<TaskId>,
        facility_history_ids: Vec<FacilityHistoryId>,
    ) -> Self {
        self.task_ids = task_ids;
        self.facility_history_ids = facility_history_ids;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn create_saga_walks_the_happy_path() {
        let mut saga = SagaRecord::begin(SagaKind::Create, None, now());
        for next in [
            SagaState::SubEntitiesCreated,
            SagaState::EventPersisted,
            SagaState::BackLinked,
            SagaState::Committed,
        ] {
            saga.advance(next, now()).expect("legal transition");
        }
        assert!(saga.is_finished());
    }

    #[test]
    fn update_saga_skips_back_linking() {
        let mut saga = SagaRecord::begin(SagaKind::Update, Some(EventId::new()), now());
        saga.advance(SagaState::SubEntitiesCreated, now()).unwrap();
        saga.advance(SagaState::EventPersisted, now()).unwrap();

        let err = saga.advance(SagaState::BackLinked, now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));

        saga.advance(SagaState::Committed, now()).unwrap();
        assert_eq!(saga.state, SagaState::Committed);
    }

    #[test]
    fn committed_saga_cannot_roll_back() {
        let mut saga = SagaRecord::begin(SagaKind::Update, None, now());
        saga.state = SagaState::Committed;
        assert!(saga.advance(SagaState::RollingBack, now()).is_err());
        assert_eq!(saga.state, SagaState::Committed);
    }

    #[test]
    fn failed_rollback_can_be_retried() {
        let mut saga = SagaRecord::begin(SagaKind::Create, None, now());
        saga.advance(SagaState::RollingBack, now()).unwrap();
        saga.advance(SagaState::RollbackFailed, now()).unwrap();
        assert!(!saga.is_finished());
        saga.advance(SagaState::RollingBack, now()).unwrap();
        saga.advance(SagaState::RolledBack, now()).unwrap();
        assert!(saga.is_finished());
    }

    #[test]
    fn states_round_trip_through_their_storage_names() {
        for state in [
            SagaState::Pending,
            SagaState::SubEntitiesCreated,
            SagaState::EventPersisted,
            SagaState::BackLinked,
            SagaState::Committed,
            SagaState::RollingBack,
            SagaState::RolledBack,
            SagaState::RollbackFailed,
        ] {
            assert_eq!(state.as_str().parse::<SagaState>().unwrap(), state);
        }
        assert!("bogus".parse::<SagaState>().is_err());
        assert_eq!("update".parse::<SagaKind>().unwrap(), SagaKind::Update);
    }
}
