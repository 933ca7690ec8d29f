// Copyright 2025 Cowboy AI, LLC.

//! Domain events emitted by referral transitions
//!
//! Events represent facts that have occurred in the domain. They are immutable
//! and are returned from each transition as an explicit list; there is no
//! global signal bus. The caller forwards the list to whichever consumers it
//! wires up (notifier, activity log, search indexer); asserting on the
//! returned list is how transitions are tested.

use crate::identifiers::{
    AnswerId, AssignmentId, HistoryId, NoteId, ReferralId, TopicId, UnitId, UserId,
    ValidationRequestId,
};
use crate::referral::{AnswerType, ReferralStatus, UrgencyLevel};
use crate::state_machine::ReferralState;
use crate::validation::ValidationVerdict;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base trait for all domain events
///
/// # Examples
///
/// ```rust
/// use referral_domain::DomainEvent;
/// use uuid::Uuid;
///
/// #[derive(Debug)]
/// struct ReferralArchived {
///     referral_id: Uuid,
/// }
///
/// impl DomainEvent for ReferralArchived {
///     fn aggregate_id(&self) -> Uuid {
///         self.referral_id
///     }
///
///     fn event_type(&self) -> &'static str {
///         "ReferralArchived"
///     }
///
///     fn subject(&self) -> String {
///         "referrals.referral.archived.v1".to_string()
///     }
/// }
/// ```
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get the event type name
    fn event_type(&self) -> &'static str;

    /// Get the routing subject for this event
    fn subject(&self) -> String;

    /// Get the schema version
    fn version(&self) -> &'static str {
        "v1"
    }
}

/// Enum wrapper for all referral events
///
/// Every variant carries the referral ID and the acting user plus
/// kind-specific payload. The dispatcher matches on this enum to compute
/// recipients and activity-log entries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub enum ReferralEvent {
    // Lifecycle events
    /// The draft was sent to its handling units
    Sent(ReferralSent),
    /// The answer was published to the requesters
    AnswerPublished(AnswerPublished),
    /// The whole report was published to the requesters
    ReportPublished(ReportPublished),
    /// The referral was closed without publishing
    Closed(ReferralClosed),
    /// An answered or closed referral was reopened
    Reopened(ReferralReopened),

    // Assignment events
    /// A handling unit was attached
    UnitAssigned(UnitAssigned),
    /// A handling unit was detached
    UnitUnassigned(UnitUnassigned),
    /// A unit member was assigned
    UnitMemberAssigned(UnitMemberAssigned),
    /// A unit-member assignment was removed
    UnitMemberUnassigned(UnitMemberUnassigned),

    // Answer and validation events
    /// A new answer version was recorded
    VersionAdded(VersionAdded),
    /// Validator sign-off was requested on an answer version
    AnswerValidationRequested(AnswerValidationRequested),
    /// The validator recorded a verdict
    AnswerValidationPerformed(AnswerValidationPerformed),

    // Descriptive-field events
    /// The urgency level changed
    UrgencyLevelChanged(UrgencyLevelChanged),
    /// The referral was reclassified under a different topic
    TopicUpdated(TopicUpdated),
    /// The title was rewritten
    TitleUpdated(TitleUpdated),
    /// The subtitle was rewritten
    SubtitleUpdated(SubtitleUpdated),
    /// The sub-question was rewritten
    SubQuestionUpdated(SubQuestionUpdated),
    /// The sensitiveness classification changed
    StatusUpdated(StatusUpdated),
    /// The answer delivery mode was recorded
    AnswerTypeUpdated(AnswerTypeUpdated),

    // User-link events
    /// A requester was linked
    RequesterAdded(RequesterAdded),
    /// A requester was unlinked
    RequesterRemoved(RequesterRemoved),
    /// An observer was linked
    ObserverAdded(ObserverAdded),
    /// An observer was unlinked
    ObserverRemoved(ObserverRemoved),

    // Splitting events
    /// A new section was registered while splitting
    SplitCreated(SplitCreated),
    /// The split was confirmed
    SplitConfirmed(SplitConfirmed),
    /// The split was abandoned
    SplitCancelled(SplitCancelled),
}

// Lifecycle event structs

/// Referral sent event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferralSent {
    /// The referral that was sent
    pub referral: ReferralId,
    /// The requester who sent it
    pub actor: UserId,
    /// When it was sent
    pub sent_at: DateTime<Utc>,
}

/// Answer published event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerPublished {
    /// The referral whose answer was published
    pub referral: ReferralId,
    /// The unit member who published
    pub actor: UserId,
    /// When the answer went out
    pub published_at: DateTime<Utc>,
}

/// Report published event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportPublished {
    /// The referral whose report was published
    pub referral: ReferralId,
    /// The unit member who published
    pub actor: UserId,
    /// When the report went out
    pub published_at: DateTime<Utc>,
}

/// Referral closed event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferralClosed {
    /// The referral that was closed
    pub referral: ReferralId,
    /// Who closed it
    pub actor: UserId,
    /// Why it was closed
    pub explanation: String,
    /// Attached knowledge-base note, to be dropped from the search index
    pub note: Option<NoteId>,
}

/// Referral reopened event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferralReopened {
    /// The referral that was reopened
    pub referral: ReferralId,
    /// Who reopened it
    pub actor: UserId,
    /// Why it was reopened
    pub explanation: String,
    /// The reopening history record created by the transition
    pub history_record: HistoryId,
}

// Assignment event structs

/// Unit assigned event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnitAssigned {
    /// The referral the unit was attached to
    pub referral: ReferralId,
    /// Who attached the unit
    pub actor: UserId,
    /// The attached unit
    pub unit: UnitId,
    /// The assignment record
    pub assignment: AssignmentId,
    /// Why the unit was brought in
    pub explanation: Option<String>,
}

/// Unit unassigned event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnitUnassigned {
    /// The referral the unit was detached from
    pub referral: ReferralId,
    /// Who detached the unit
    pub actor: UserId,
    /// The detached unit
    pub unit: UnitId,
}

/// Unit member assigned event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnitMemberAssigned {
    /// The referral the member was assigned to
    pub referral: ReferralId,
    /// Who created the assignment
    pub actor: UserId,
    /// The assigned member
    pub assignee: UserId,
    /// The unit the member was assigned through
    pub unit: UnitId,
    /// The assignment record
    pub assignment: AssignmentId,
}

/// Unit member unassigned event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnitMemberUnassigned {
    /// The referral the member was removed from
    pub referral: ReferralId,
    /// Who removed the assignment
    pub actor: UserId,
    /// The removed member
    pub assignee: UserId,
    /// The unit the member was assigned through
    pub unit: UnitId,
}

// Answer and validation event structs

/// Version added event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VersionAdded {
    /// The referral whose report grew a version
    pub referral: ReferralId,
    /// The version's author
    pub actor: UserId,
    /// The new answer version
    pub version: AnswerId,
}

/// Answer validation requested event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerValidationRequested {
    /// The referral under validation
    pub referral: ReferralId,
    /// Who asked for the validation
    pub actor: UserId,
    /// The created validation request
    pub request: ValidationRequestId,
    /// The answer version to validate
    pub answer: AnswerId,
    /// The validator whose sign-off is requested
    pub validator: UserId,
}

/// Answer validation performed event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerValidationPerformed {
    /// The referral under validation
    pub referral: ReferralId,
    /// The validator who responded
    pub actor: UserId,
    /// The settled validation request
    pub request: ValidationRequestId,
    /// Validated or denied
    pub verdict: ValidationVerdict,
}

// Descriptive-field event structs

/// Urgency level changed event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UrgencyLevelChanged {
    /// The referral whose urgency changed
    pub referral: ReferralId,
    /// Who changed it
    pub actor: UserId,
    /// The level before the change
    pub old_level: UrgencyLevel,
    /// The level after the change
    pub new_level: UrgencyLevel,
    /// Why the urgency changed
    pub explanation: String,
    /// The history record created by the transition
    pub history_record: HistoryId,
}

/// Topic updated event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TopicUpdated {
    /// The referral that was reclassified
    pub referral: ReferralId,
    /// Who reclassified it
    pub actor: UserId,
    /// The topic before the change
    pub old_topic: TopicId,
    /// The topic after the change
    pub new_topic: TopicId,
    /// The history record created by the transition
    pub history_record: HistoryId,
}

/// Title updated event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TitleUpdated {
    /// The referral whose title changed
    pub referral: ReferralId,
    /// Who rewrote the title
    pub actor: UserId,
    /// The title before the rewrite
    pub old_title: String,
    /// The title after the rewrite
    pub new_title: String,
    /// The history record created by the transition
    pub history_record: HistoryId,
}

/// Subtitle updated event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubtitleUpdated {
    /// The referral whose subtitle changed
    pub referral: ReferralId,
    /// Who rewrote the subtitle
    pub actor: UserId,
    /// The new subtitle
    pub subtitle: String,
}

/// Sub-question updated event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubQuestionUpdated {
    /// The referral whose sub-question changed
    pub referral: ReferralId,
    /// Who rewrote the sub-question
    pub actor: UserId,
    /// The new sub-question
    pub sub_question: String,
}

/// Status updated event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusUpdated {
    /// The referral whose classification changed
    pub referral: ReferralId,
    /// Who reclassified it
    pub actor: UserId,
    /// The new classification
    pub status: ReferralStatus,
}

/// Answer type updated event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerTypeUpdated {
    /// The referral whose delivery mode was recorded
    pub referral: ReferralId,
    /// Who recorded it
    pub actor: UserId,
    /// The new delivery mode
    pub answer_type: AnswerType,
}

// User-link event structs

/// Requester added event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RequesterAdded {
    /// The referral the requester was linked to
    pub referral: ReferralId,
    /// Who linked them
    pub actor: UserId,
    /// The linked requester
    pub requester: UserId,
}

/// Requester removed event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RequesterRemoved {
    /// The referral the requester was unlinked from
    pub referral: ReferralId,
    /// Who unlinked them
    pub actor: UserId,
    /// The unlinked requester
    pub requester: UserId,
}

/// Observer added event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObserverAdded {
    /// The referral the observer was linked to
    pub referral: ReferralId,
    /// Who linked them
    pub actor: UserId,
    /// The linked observer
    pub observer: UserId,
}

/// Observer removed event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObserverRemoved {
    /// The referral the observer was unlinked from
    pub referral: ReferralId,
    /// Who unlinked them
    pub actor: UserId,
    /// The unlinked observer
    pub observer: UserId,
}

// Splitting event structs

/// Split created event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SplitCreated {
    /// The referral being split
    pub referral: ReferralId,
    /// Who registered the new section
    pub actor: UserId,
}

/// Split confirmed event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SplitConfirmed {
    /// The referral whose split was confirmed
    pub referral: ReferralId,
    /// Who confirmed it
    pub actor: UserId,
    /// The state the referral resolved to
    pub confirmed_state: ReferralState,
}

/// Split cancelled event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SplitCancelled {
    /// The referral whose split was abandoned
    pub referral: ReferralId,
    /// Who abandoned it
    pub actor: UserId,
}

// DomainEvent implementations for lifecycle events

impl DomainEvent for ReferralSent {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "ReferralSent"
    }

    fn subject(&self) -> String {
        "referrals.referral.sent.v1".to_string()
    }
}

impl DomainEvent for AnswerPublished {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "AnswerPublished"
    }

    fn subject(&self) -> String {
        "referrals.answer.published.v1".to_string()
    }
}

impl DomainEvent for ReportPublished {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "ReportPublished"
    }

    fn subject(&self) -> String {
        "referrals.report.published.v1".to_string()
    }
}

impl DomainEvent for ReferralClosed {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "ReferralClosed"
    }

    fn subject(&self) -> String {
        "referrals.referral.closed.v1".to_string()
    }
}

impl DomainEvent for ReferralReopened {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "ReferralReopened"
    }

    fn subject(&self) -> String {
        "referrals.referral.reopened.v1".to_string()
    }
}

// DomainEvent implementations for assignment events

impl DomainEvent for UnitAssigned {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "UnitAssigned"
    }

    fn subject(&self) -> String {
        "referrals.unit.assigned.v1".to_string()
    }
}

impl DomainEvent for UnitUnassigned {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "UnitUnassigned"
    }

    fn subject(&self) -> String {
        "referrals.unit.unassigned.v1".to_string()
    }
}

impl DomainEvent for UnitMemberAssigned {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "UnitMemberAssigned"
    }

    fn subject(&self) -> String {
        "referrals.member.assigned.v1".to_string()
    }
}

impl DomainEvent for UnitMemberUnassigned {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "UnitMemberUnassigned"
    }

    fn subject(&self) -> String {
        "referrals.member.unassigned.v1".to_string()
    }
}

// DomainEvent implementations for answer and validation events

impl DomainEvent for VersionAdded {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "VersionAdded"
    }

    fn subject(&self) -> String {
        "referrals.version.added.v1".to_string()
    }
}

impl DomainEvent for AnswerValidationRequested {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "AnswerValidationRequested"
    }

    fn subject(&self) -> String {
        "referrals.validation.requested.v1".to_string()
    }
}

impl DomainEvent for AnswerValidationPerformed {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "AnswerValidationPerformed"
    }

    fn subject(&self) -> String {
        "referrals.validation.performed.v1".to_string()
    }
}

// DomainEvent implementations for descriptive-field events

impl DomainEvent for UrgencyLevelChanged {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "UrgencyLevelChanged"
    }

    fn subject(&self) -> String {
        "referrals.urgency.changed.v1".to_string()
    }
}

impl DomainEvent for TopicUpdated {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "TopicUpdated"
    }

    fn subject(&self) -> String {
        "referrals.topic.updated.v1".to_string()
    }
}

impl DomainEvent for TitleUpdated {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "TitleUpdated"
    }

    fn subject(&self) -> String {
        "referrals.title.updated.v1".to_string()
    }
}

impl DomainEvent for SubtitleUpdated {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "SubtitleUpdated"
    }

    fn subject(&self) -> String {
        "referrals.subtitle.updated.v1".to_string()
    }
}

impl DomainEvent for SubQuestionUpdated {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "SubQuestionUpdated"
    }

    fn subject(&self) -> String {
        "referrals.subquestion.updated.v1".to_string()
    }
}

impl DomainEvent for StatusUpdated {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "StatusUpdated"
    }

    fn subject(&self) -> String {
        "referrals.status.updated.v1".to_string()
    }
}

impl DomainEvent for AnswerTypeUpdated {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "AnswerTypeUpdated"
    }

    fn subject(&self) -> String {
        "referrals.answer_type.updated.v1".to_string()
    }
}

// DomainEvent implementations for user-link events

impl DomainEvent for RequesterAdded {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "RequesterAdded"
    }

    fn subject(&self) -> String {
        "referrals.requester.added.v1".to_string()
    }
}

impl DomainEvent for RequesterRemoved {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "RequesterRemoved"
    }

    fn subject(&self) -> String {
        "referrals.requester.removed.v1".to_string()
    }
}

impl DomainEvent for ObserverAdded {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "ObserverAdded"
    }

    fn subject(&self) -> String {
        "referrals.observer.added.v1".to_string()
    }
}

impl DomainEvent for ObserverRemoved {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "ObserverRemoved"
    }

    fn subject(&self) -> String {
        "referrals.observer.removed.v1".to_string()
    }
}

// DomainEvent implementations for splitting events

impl DomainEvent for SplitCreated {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "SplitCreated"
    }

    fn subject(&self) -> String {
        "referrals.split.created.v1".to_string()
    }
}

impl DomainEvent for SplitConfirmed {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "SplitConfirmed"
    }

    fn subject(&self) -> String {
        "referrals.split.confirmed.v1".to_string()
    }
}

impl DomainEvent for SplitCancelled {
    fn aggregate_id(&self) -> Uuid {
        self.referral.into()
    }

    fn event_type(&self) -> &'static str {
        "SplitCancelled"
    }

    fn subject(&self) -> String {
        "referrals.split.cancelled.v1".to_string()
    }
}

impl ReferralEvent {
    /// The user whose action produced this event
    pub fn actor(&self) -> UserId {
        match self {
            Self::Sent(e) => e.actor,
            Self::AnswerPublished(e) => e.actor,
            Self::ReportPublished(e) => e.actor,
            Self::Closed(e) => e.actor,
            Self::Reopened(e) => e.actor,
            Self::UnitAssigned(e) => e.actor,
            Self::UnitUnassigned(e) => e.actor,
            Self::UnitMemberAssigned(e) => e.actor,
            Self::UnitMemberUnassigned(e) => e.actor,
            Self::VersionAdded(e) => e.actor,
            Self::AnswerValidationRequested(e) => e.actor,
            Self::AnswerValidationPerformed(e) => e.actor,
            Self::UrgencyLevelChanged(e) => e.actor,
            Self::TopicUpdated(e) => e.actor,
            Self::TitleUpdated(e) => e.actor,
            Self::SubtitleUpdated(e) => e.actor,
            Self::SubQuestionUpdated(e) => e.actor,
            Self::StatusUpdated(e) => e.actor,
            Self::AnswerTypeUpdated(e) => e.actor,
            Self::RequesterAdded(e) => e.actor,
            Self::RequesterRemoved(e) => e.actor,
            Self::ObserverAdded(e) => e.actor,
            Self::ObserverRemoved(e) => e.actor,
            Self::SplitCreated(e) => e.actor,
            Self::SplitConfirmed(e) => e.actor,
            Self::SplitCancelled(e) => e.actor,
        }
    }

    /// The referral this event belongs to
    pub fn referral(&self) -> ReferralId {
        match self {
            Self::Sent(e) => e.referral,
            Self::AnswerPublished(e) => e.referral,
            Self::ReportPublished(e) => e.referral,
            Self::Closed(e) => e.referral,
            Self::Reopened(e) => e.referral,
            Self::UnitAssigned(e) => e.referral,
            Self::UnitUnassigned(e) => e.referral,
            Self::UnitMemberAssigned(e) => e.referral,
            Self::UnitMemberUnassigned(e) => e.referral,
            Self::VersionAdded(e) => e.referral,
            Self::AnswerValidationRequested(e) => e.referral,
            Self::AnswerValidationPerformed(e) => e.referral,
            Self::UrgencyLevelChanged(e) => e.referral,
            Self::TopicUpdated(e) => e.referral,
            Self::TitleUpdated(e) => e.referral,
            Self::SubtitleUpdated(e) => e.referral,
            Self::SubQuestionUpdated(e) => e.referral,
            Self::StatusUpdated(e) => e.referral,
            Self::AnswerTypeUpdated(e) => e.referral,
            Self::RequesterAdded(e) => e.referral,
            Self::RequesterRemoved(e) => e.referral,
            Self::ObserverAdded(e) => e.referral,
            Self::ObserverRemoved(e) => e.referral,
            Self::SplitCreated(e) => e.referral,
            Self::SplitConfirmed(e) => e.referral,
            Self::SplitCancelled(e) => e.referral,
        }
    }
}

impl DomainEvent for ReferralEvent {
    fn aggregate_id(&self) -> Uuid {
        self.referral().into()
    }

    fn event_type(&self) -> &'static str {
        match self {
            Self::Sent(e) => e.event_type(),
            Self::AnswerPublished(e) => e.event_type(),
            Self::ReportPublished(e) => e.event_type(),
            Self::Closed(e) => e.event_type(),
            Self::Reopened(e) => e.event_type(),
            Self::UnitAssigned(e) => e.event_type(),
            Self::UnitUnassigned(e) => e.event_type(),
            Self::UnitMemberAssigned(e) => e.event_type(),
            Self::UnitMemberUnassigned(e) => e.event_type(),
            Self::VersionAdded(e) => e.event_type(),
            Self::AnswerValidationRequested(e) => e.event_type(),
            Self::AnswerValidationPerformed(e) => e.event_type(),
            Self::UrgencyLevelChanged(e) => e.event_type(),
            Self::TopicUpdated(e) => e.event_type(),
            Self::TitleUpdated(e) => e.event_type(),
            Self::SubtitleUpdated(e) => e.event_type(),
            Self::SubQuestionUpdated(e) => e.event_type(),
            Self::StatusUpdated(e) => e.event_type(),
            Self::AnswerTypeUpdated(e) => e.event_type(),
            Self::RequesterAdded(e) => e.event_type(),
            Self::RequesterRemoved(e) => e.event_type(),
            Self::ObserverAdded(e) => e.event_type(),
            Self::ObserverRemoved(e) => e.event_type(),
            Self::SplitCreated(e) => e.event_type(),
            Self::SplitConfirmed(e) => e.event_type(),
            Self::SplitCancelled(e) => e.event_type(),
        }
    }

    fn subject(&self) -> String {
        match self {
            Self::Sent(e) => e.subject(),
            Self::AnswerPublished(e) => e.subject(),
            Self::ReportPublished(e) => e.subject(),
            Self::Closed(e) => e.subject(),
            Self::Reopened(e) => e.subject(),
            Self::UnitAssigned(e) => e.subject(),
            Self::UnitUnassigned(e) => e.subject(),
            Self::UnitMemberAssigned(e) => e.subject(),
            Self::UnitMemberUnassigned(e) => e.subject(),
            Self::VersionAdded(e) => e.subject(),
            Self::AnswerValidationRequested(e) => e.subject(),
            Self::AnswerValidationPerformed(e) => e.subject(),
            Self::UrgencyLevelChanged(e) => e.subject(),
            Self::TopicUpdated(e) => e.subject(),
            Self::TitleUpdated(e) => e.subject(),
            Self::SubtitleUpdated(e) => e.subject(),
            Self::SubQuestionUpdated(e) => e.subject(),
            Self::StatusUpdated(e) => e.subject(),
            Self::AnswerTypeUpdated(e) => e.subject(),
            Self::RequesterAdded(e) => e.subject(),
            Self::RequesterRemoved(e) => e.subject(),
            Self::ObserverAdded(e) => e.subject(),
            Self::ObserverRemoved(e) => e.subject(),
            Self::SplitCreated(e) => e.subject(),
            Self::SplitConfirmed(e) => e.subject(),
            Self::SplitCancelled(e) => e.subject(),
        }
    }
}
