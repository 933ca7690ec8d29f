//! Identifier types for referrals and their child records
//!
//! Entities with global identity get an [`EntityId`] alias; records that
//! only exist inside one referral (assignments, history entries) get their
//! own lightweight UUID newtypes, since they have no lifecycle of their own
//! and disappear with the aggregate.

use crate::entity::{
    AnswerMarker, EntityId, NoteMarker, ReferralMarker, TopicMarker, UnitMarker, UserMarker,
    ValidationRequestMarker,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// ID of a referral aggregate
pub type ReferralId = EntityId<ReferralMarker>;

/// ID of a user (requester, observer or unit member)
pub type UserId = EntityId<UserMarker>;

/// ID of a handling unit
pub type UnitId = EntityId<UnitMarker>;

/// ID of an answer / report version
pub type AnswerId = EntityId<AnswerMarker>;

/// ID of a validation request
pub type ValidationRequestId = EntityId<ValidationRequestMarker>;

/// ID of a topic
pub type TopicId = EntityId<TopicMarker>;

/// ID of a knowledge-base note
pub type NoteId = EntityId<NoteMarker>;

/// Identifier of a unit or member assignment, local to one referral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Generate a fresh assignment ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AssignmentId> for Uuid {
    fn from(id: AssignmentId) -> Self {
        id.0
    }
}

impl From<&AssignmentId> for Uuid {
    fn from(id: &AssignmentId) -> Self {
        id.0
    }
}

/// Identifier of an append-only history record, local to one referral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HistoryId(Uuid);

impl HistoryId {
    /// Generate a fresh history record ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<HistoryId> for Uuid {
    fn from(id: HistoryId) -> Self {
        id.0
    }
}

impl From<&HistoryId> for Uuid {
    fn from(id: &HistoryId) -> Self {
        id.0
    }
}
