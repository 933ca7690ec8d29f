//! Append-only history records produced by referral transitions
//!
//! Each record captures the old and the new value of one descriptive field,
//! plus the actor and an explanation where the transition requires one.
//! Records are immutable once created and kept in creation order on the
//! aggregate.

use crate::identifiers::{HistoryId, TopicId, UserId};
use crate::referral::UrgencyLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit entry for an urgency-level change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyLevelRecord {
    /// Identifier of this record
    pub id: HistoryId,

    /// The level before the change
    pub old_level: UrgencyLevel,

    /// The level after the change
    pub new_level: UrgencyLevel,

    /// Why the urgency changed
    pub explanation: String,

    /// Who changed it
    pub changed_by: UserId,

    /// When it changed
    pub recorded_at: DateTime<Utc>,
}

impl UrgencyLevelRecord {
    /// Record an urgency-level change
    pub fn new(
        old_level: UrgencyLevel,
        new_level: UrgencyLevel,
        explanation: impl Into<String>,
        changed_by: UserId,
    ) -> Self {
        Self {
            id: HistoryId::new(),
            old_level,
            new_level,
            explanation: explanation.into(),
            changed_by,
            recorded_at: Utc::now(),
        }
    }
}

/// Audit entry for a topic reclassification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    /// Identifier of this record
    pub id: HistoryId,

    /// The topic before the change
    pub old_topic: TopicId,

    /// The topic after the change
    pub new_topic: TopicId,

    /// Who reclassified the referral
    pub changed_by: UserId,

    /// When it changed
    pub recorded_at: DateTime<Utc>,
}

impl TopicRecord {
    /// Record a topic reclassification
    pub fn new(old_topic: TopicId, new_topic: TopicId, changed_by: UserId) -> Self {
        Self {
            id: HistoryId::new(),
            old_topic,
            new_topic,
            changed_by,
            recorded_at: Utc::now(),
        }
    }
}

/// Audit entry for a title rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Identifier of this record
    pub id: HistoryId,

    /// The title before the rewrite
    pub old_title: String,

    /// The title after the rewrite
    pub new_title: String,

    /// Optional note on why the title changed
    pub explanation: Option<String>,

    /// Who rewrote it
    pub changed_by: UserId,

    /// When it changed
    pub recorded_at: DateTime<Utc>,
}

impl TitleRecord {
    /// Record a title rewrite
    pub fn new(
        old_title: impl Into<String>,
        new_title: impl Into<String>,
        explanation: Option<String>,
        changed_by: UserId,
    ) -> Self {
        Self {
            id: HistoryId::new(),
            old_title: old_title.into(),
            new_title: new_title.into(),
            explanation,
            changed_by,
            recorded_at: Utc::now(),
        }
    }
}

/// Audit entry for a reopening of an answered or closed referral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopeningRecord {
    /// Identifier of this record
    pub id: HistoryId,

    /// The state the referral was reopened from
    pub reopened_from: crate::state_machine::ReferralState,

    /// Why the referral was reopened
    pub explanation: String,

    /// Who reopened it
    pub reopened_by: UserId,

    /// When it was reopened
    pub recorded_at: DateTime<Utc>,
}

impl ReopeningRecord {
    /// Record a reopening
    pub fn new(
        reopened_from: crate::state_machine::ReferralState,
        explanation: impl Into<String>,
        reopened_by: UserId,
    ) -> Self {
        Self {
            id: HistoryId::new(),
            reopened_from,
            explanation: explanation.into(),
            reopened_by,
            recorded_at: Utc::now(),
        }
    }
}
