// Copyright 2025 Cowboy AI, LLC.

//! Recipient resolution and event dispatch
//!
//! Transitions return their events explicitly; this module routes each event
//! to its recipients and to the activity log. Routing is role-driven: an
//! event kind picks requester links by notification preference, unit owners,
//! or the single affected user. Delivery itself is the [`Notifier`]'s
//! problem: a failing notifier is logged and never unwinds the committed
//! transition.

use crate::events::{DomainEvent, ReferralEvent};
use crate::identifiers::{
    AnswerId, AssignmentId, HistoryId, NoteId, ReferralId, UnitId, UserId, ValidationRequestId,
};
use crate::referral::{NotificationPreference, Referral};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Read-only view of the unit roster
///
/// The unit directory belongs to the enclosing application; the resolver only
/// needs owners, members and the unit memberships of a user.
pub trait UnitDirectory: Send + Sync {
    /// Users with the owner role in the given unit
    fn owners_of(&self, unit: UnitId) -> Vec<UserId>;

    /// All members of the given unit
    fn members_of(&self, unit: UnitId) -> Vec<UserId>;

    /// Units the given user belongs to
    fn units_of(&self, user: UserId) -> Vec<UnitId>;

    /// Human-readable name of the unit
    fn unit_name(&self, unit: UnitId) -> Option<String>;
}

/// Delivers one event to one recipient (email, in-app, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the event to the recipient
    async fn notify(&self, event: &ReferralEvent, recipient: UserId) -> anyhow::Result<()>;
}

/// Writes the human-readable activity timeline
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Append one record to the timeline
    async fn record(&self, record: ActivityRecord) -> anyhow::Result<()>;
}

/// The entity an activity record points at
///
/// A closed sum over the linked-entity kinds the transition table can
/// produce; there is deliberately no "any object" escape hatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkedEntity {
    /// A linked or assigned user
    User(UserId),
    /// A handling unit
    Unit(UnitId),
    /// A unit or member assignment
    Assignment(AssignmentId),
    /// An answer version
    Answer(AnswerId),
    /// A validation request (or its response)
    ValidationRequest(ValidationRequestId),
    /// A history record
    History(HistoryId),
    /// A knowledge-base note
    Note(NoteId),
}

/// Verb of an activity record, one per event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityVerb {
    /// The referral was sent
    Sent,
    /// A unit was attached
    UnitAssigned,
    /// A unit was detached
    UnitUnassigned,
    /// A member was assigned
    MemberAssigned,
    /// A member assignment was removed
    MemberUnassigned,
    /// An answer version was recorded
    VersionAdded,
    /// Validator sign-off was requested
    ValidationRequested,
    /// The validator responded
    ValidationPerformed,
    /// The answer was published
    AnswerPublished,
    /// The report was published
    ReportPublished,
    /// The referral was closed
    Closed,
    /// The referral was reopened
    Reopened,
    /// The urgency level changed
    UrgencyLevelChanged,
    /// The topic changed
    TopicUpdated,
    /// The title changed
    TitleUpdated,
    /// The subtitle changed
    SubtitleUpdated,
    /// The sub-question changed
    SubQuestionUpdated,
    /// The sensitiveness classification changed
    StatusUpdated,
    /// The answer delivery mode was recorded
    AnswerTypeUpdated,
    /// A requester was linked
    RequesterAdded,
    /// A requester was unlinked
    RequesterRemoved,
    /// An observer was linked
    ObserverAdded,
    /// An observer was unlinked
    ObserverRemoved,
    /// A split section was registered
    SplitCreated,
    /// The split was confirmed
    SplitConfirmed,
    /// The split was abandoned
    SplitCancelled,
}

impl ActivityVerb {
    /// Snake-case verb used in the timeline storage
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::UnitAssigned => "unit_assigned",
            Self::UnitUnassigned => "unit_unassigned",
            Self::MemberAssigned => "member_assigned",
            Self::MemberUnassigned => "member_unassigned",
            Self::VersionAdded => "version_added",
            Self::ValidationRequested => "validation_requested",
            Self::ValidationPerformed => "validation_performed",
            Self::AnswerPublished => "answer_published",
            Self::ReportPublished => "report_published",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::UrgencyLevelChanged => "urgency_level_changed",
            Self::TopicUpdated => "topic_updated",
            Self::TitleUpdated => "title_updated",
            Self::SubtitleUpdated => "subtitle_updated",
            Self::SubQuestionUpdated => "subquestion_updated",
            Self::StatusUpdated => "status_updated",
            Self::AnswerTypeUpdated => "answer_type_updated",
            Self::RequesterAdded => "requester_added",
            Self::RequesterRemoved => "requester_removed",
            Self::ObserverAdded => "observer_added",
            Self::ObserverRemoved => "observer_removed",
            Self::SplitCreated => "split_created",
            Self::SplitConfirmed => "split_confirmed",
            Self::SplitCancelled => "split_cancelled",
        }
    }
}

impl fmt::Display for ActivityVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One entry of the human-readable activity timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Who acted
    pub actor: UserId,

    /// What happened
    pub verb: ActivityVerb,

    /// The referral the activity belongs to
    pub referral: ReferralId,

    /// The entity the activity points at, if any
    pub linked: Option<LinkedEntity>,

    /// Free-text detail (explanations, comments)
    pub message: Option<String>,

    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Build the timeline entry for one event
    pub fn from_event(event: &ReferralEvent) -> Self {
        let (verb, linked, message) = match event {
            ReferralEvent::Sent(_) => (ActivityVerb::Sent, None, None),
            ReferralEvent::UnitAssigned(e) => (
                ActivityVerb::UnitAssigned,
                Some(LinkedEntity::Unit(e.unit)),
                e.explanation.clone(),
            ),
            ReferralEvent::UnitUnassigned(e) => (
                ActivityVerb::UnitUnassigned,
                Some(LinkedEntity::Unit(e.unit)),
                None,
            ),
            ReferralEvent::UnitMemberAssigned(e) => (
                ActivityVerb::MemberAssigned,
                Some(LinkedEntity::User(e.assignee)),
                None,
            ),
            ReferralEvent::UnitMemberUnassigned(e) => (
                ActivityVerb::MemberUnassigned,
                Some(LinkedEntity::User(e.assignee)),
                None,
            ),
            ReferralEvent::VersionAdded(e) => (
                ActivityVerb::VersionAdded,
                Some(LinkedEntity::Answer(e.version)),
                None,
            ),
            ReferralEvent::AnswerValidationRequested(e) => (
                ActivityVerb::ValidationRequested,
                Some(LinkedEntity::ValidationRequest(e.request)),
                None,
            ),
            ReferralEvent::AnswerValidationPerformed(e) => (
                ActivityVerb::ValidationPerformed,
                Some(LinkedEntity::ValidationRequest(e.request)),
                None,
            ),
            ReferralEvent::AnswerPublished(_) => (ActivityVerb::AnswerPublished, None, None),
            ReferralEvent::ReportPublished(_) => (ActivityVerb::ReportPublished, None, None),
            ReferralEvent::Closed(e) => (
                ActivityVerb::Closed,
                e.note.map(LinkedEntity::Note),
                Some(e.explanation.clone()),
            ),
            ReferralEvent::Reopened(e) => (
                ActivityVerb::Reopened,
                Some(LinkedEntity::History(e.history_record)),
                Some(e.explanation.clone()),
            ),
            ReferralEvent::UrgencyLevelChanged(e) => (
                ActivityVerb::UrgencyLevelChanged,
                Some(LinkedEntity::History(e.history_record)),
                Some(e.explanation.clone()),
            ),
            ReferralEvent::TopicUpdated(e) => (
                ActivityVerb::TopicUpdated,
                Some(LinkedEntity::History(e.history_record)),
                None,
            ),
            ReferralEvent::TitleUpdated(e) => (
                ActivityVerb::TitleUpdated,
                Some(LinkedEntity::History(e.history_record)),
                None,
            ),
            ReferralEvent::SubtitleUpdated(_) => (ActivityVerb::SubtitleUpdated, None, None),
            ReferralEvent::SubQuestionUpdated(_) => {
                (ActivityVerb::SubQuestionUpdated, None, None)
            }
            ReferralEvent::StatusUpdated(_) => (ActivityVerb::StatusUpdated, None, None),
            ReferralEvent::AnswerTypeUpdated(_) => (ActivityVerb::AnswerTypeUpdated, None, None),
            ReferralEvent::RequesterAdded(e) => (
                ActivityVerb::RequesterAdded,
                Some(LinkedEntity::User(e.requester)),
                None,
            ),
            ReferralEvent::RequesterRemoved(e) => (
                ActivityVerb::RequesterRemoved,
                Some(LinkedEntity::User(e.requester)),
                None,
            ),
            ReferralEvent::ObserverAdded(e) => (
                ActivityVerb::ObserverAdded,
                Some(LinkedEntity::User(e.observer)),
                None,
            ),
            ReferralEvent::ObserverRemoved(e) => (
                ActivityVerb::ObserverRemoved,
                Some(LinkedEntity::User(e.observer)),
                None,
            ),
            ReferralEvent::SplitCreated(_) => (ActivityVerb::SplitCreated, None, None),
            ReferralEvent::SplitConfirmed(_) => (ActivityVerb::SplitConfirmed, None, None),
            ReferralEvent::SplitCancelled(_) => (ActivityVerb::SplitCancelled, None, None),
        };

        Self {
            actor: event.actor(),
            verb,
            referral: event.referral(),
            linked,
            message,
            recorded_at: Utc::now(),
        }
    }
}

/// Computes the recipients of one event
///
/// Stateless; every rule reads the aggregate snapshot and the unit
/// directory. The actor never receives their own notification, and a user is
/// notified at most once per event.
pub struct RecipientResolver;

impl RecipientResolver {
    /// Compute the recipients for an event
    pub fn recipients(
        referral: &Referral,
        event: &ReferralEvent,
        directory: &dyn UnitDirectory,
    ) -> Vec<UserId> {
        let mut recipients = match event {
            ReferralEvent::Sent(_) => {
                // Owners of the attached units, minus owners who sit on the
                // requester side anyway.
                let mut owners = Self::unit_owners(referral, directory);
                owners.retain(|owner| {
                    !Self::is_user_from_requesters_unit(referral, *owner, directory)
                });
                owners
            }
            ReferralEvent::UnitAssigned(e) => directory.owners_of(e.unit),
            ReferralEvent::UnitUnassigned(e) => directory.owners_of(e.unit),
            ReferralEvent::UnitMemberAssigned(e) => vec![e.assignee],
            ReferralEvent::UnitMemberUnassigned(e) => vec![e.assignee],
            ReferralEvent::VersionAdded(_) | ReferralEvent::Reopened(_) => {
                Self::assignees_or_owners(referral, directory)
            }
            ReferralEvent::AnswerValidationRequested(e) => vec![e.validator],
            ReferralEvent::AnswerValidationPerformed(e) => referral
                .validations()
                .iter()
                .find(|r| r.id == e.request)
                .map(|r| vec![r.requested_by])
                .unwrap_or_default(),
            ReferralEvent::AnswerPublished(_)
            | ReferralEvent::Closed(_)
            | ReferralEvent::UrgencyLevelChanged(_)
            | ReferralEvent::StatusUpdated(_) => Self::requester_recipients(
                referral,
                &[NotificationPreference::All, NotificationPreference::Restricted],
            ),
            ReferralEvent::ReportPublished(_)
            | ReferralEvent::TopicUpdated(_)
            | ReferralEvent::TitleUpdated(_) => {
                Self::requester_recipients(referral, &[NotificationPreference::All])
            }
            ReferralEvent::RequesterAdded(e) => vec![e.requester],
            ReferralEvent::ObserverAdded(e) => vec![e.observer],
            // Unlinked users, delivery-mode notes, sub-fields and split
            // bookkeeping stay on the timeline only.
            ReferralEvent::RequesterRemoved(_)
            | ReferralEvent::ObserverRemoved(_)
            | ReferralEvent::AnswerTypeUpdated(_)
            | ReferralEvent::SubtitleUpdated(_)
            | ReferralEvent::SubQuestionUpdated(_)
            | ReferralEvent::SplitCreated(_)
            | ReferralEvent::SplitConfirmed(_)
            | ReferralEvent::SplitCancelled(_) => Vec::new(),
        };

        let actor = event.actor();
        recipients.retain(|r| *r != actor);
        let mut seen = Vec::with_capacity(recipients.len());
        recipients.retain(|r| {
            if seen.contains(r) {
                false
            } else {
                seen.push(*r);
                true
            }
        });
        recipients
    }

    /// Whether the user belongs to a unit of one of the referral's requesters
    ///
    /// Matches by unit-name prefix ("DAJ/SDA" counts as part of "DAJ"), which
    /// also makes units match whenever one unit's name is a prefix of
    /// another's. This mirrors the behavior observed in production rather
    /// than a stricter identity comparison.
    pub fn is_user_from_requesters_unit(
        referral: &Referral,
        user: UserId,
        directory: &dyn UnitDirectory,
    ) -> bool {
        let user_unit_names: Vec<String> = directory
            .units_of(user)
            .into_iter()
            .filter_map(|u| directory.unit_name(u))
            .collect();
        if user_unit_names.is_empty() {
            return false;
        }

        referral.requesters().any(|(requester, _)| {
            directory
                .units_of(requester)
                .into_iter()
                .filter_map(|u| directory.unit_name(u))
                .any(|requester_unit| {
                    user_unit_names
                        .iter()
                        .any(|user_unit| user_unit.starts_with(&requester_unit))
                })
        })
    }

    fn requester_recipients(
        referral: &Referral,
        preferences: &[NotificationPreference],
    ) -> Vec<UserId> {
        referral
            .requesters()
            .filter(|(_, link)| preferences.contains(&link.notification_preference))
            .map(|(id, _)| id)
            .collect()
    }

    fn unit_owners(referral: &Referral, directory: &dyn UnitDirectory) -> Vec<UserId> {
        referral
            .unit_ids()
            .into_iter()
            .flat_map(|unit| directory.owners_of(unit))
            .collect()
    }

    /// Current assignees; when nobody is assigned yet, fall back to the
    /// owners of every attached unit.
    fn assignees_or_owners(referral: &Referral, directory: &dyn UnitDirectory) -> Vec<UserId> {
        if referral.assignees().is_empty() {
            Self::unit_owners(referral, directory)
        } else {
            referral.assignees().values().map(|a| a.assignee).collect()
        }
    }
}

/// Routes transition events to the notifier and the activity log
///
/// Dispatch is fire-and-forget from the state machine's perspective: by the
/// time events reach this component the transition is committed, so
/// collaborator failures are logged and swallowed.
pub struct EventDispatcher {
    notifier: Arc<dyn Notifier>,
    activity_log: Arc<dyn ActivityLog>,
}

impl EventDispatcher {
    /// Create a dispatcher over the given collaborators
    pub fn new(notifier: Arc<dyn Notifier>, activity_log: Arc<dyn ActivityLog>) -> Self {
        Self {
            notifier,
            activity_log,
        }
    }

    /// Route each event to its recipients and to the activity log
    ///
    /// Returns the number of `(event, recipient)` pairs handed to the
    /// notifier, delivered or not.
    pub async fn dispatch(
        &self,
        referral: &Referral,
        events: &[ReferralEvent],
        directory: &dyn UnitDirectory,
    ) -> usize {
        let mut pairs = 0;

        for event in events {
            for recipient in RecipientResolver::recipients(referral, event, directory) {
                pairs += 1;
                if let Err(error) = self.notifier.notify(event, recipient).await {
                    warn!(
                        event = event.event_type(),
                        %recipient,
                        %error,
                        "notification delivery failed"
                    );
                }
            }

            let record = ActivityRecord::from_event(event);
            if let Err(error) = self.activity_log.record(record).await {
                warn!(
                    event = event.event_type(),
                    %error,
                    "activity log write failed"
                );
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::TopicId;
    use crate::referral::UrgencyLevel;
    use std::collections::HashMap;

    /// Directory fixture with explicit rosters
    #[derive(Default)]
    struct StaticDirectory {
        owners: HashMap<UnitId, Vec<UserId>>,
        members: HashMap<UnitId, Vec<UserId>>,
        memberships: HashMap<UserId, Vec<UnitId>>,
        names: HashMap<UnitId, String>,
    }

    impl UnitDirectory for StaticDirectory {
        fn owners_of(&self, unit: UnitId) -> Vec<UserId> {
            self.owners.get(&unit).cloned().unwrap_or_default()
        }

        fn members_of(&self, unit: UnitId) -> Vec<UserId> {
            self.members.get(&unit).cloned().unwrap_or_default()
        }

        fn units_of(&self, user: UserId) -> Vec<UnitId> {
            self.memberships.get(&user).cloned().unwrap_or_default()
        }

        fn unit_name(&self, unit: UnitId) -> Option<String> {
            self.names.get(&unit).cloned()
        }
    }

    fn referral_with_requester() -> (Referral, UserId) {
        let requester = UserId::new();
        let mut referral = Referral::new(
            ReferralId::new(),
            requester,
            TopicId::new(),
            UrgencyLevel::Normal,
            "VAT treatment of cross-border training",
        );
        referral.send(requester).unwrap();
        (referral, requester)
    }

    #[test]
    fn test_actor_is_never_notified() {
        let (mut referral, requester) = referral_with_requester();
        let directory = StaticDirectory::default();

        let events = referral
            .change_urgency_level(requester, UrgencyLevel::Urgent, "court deadline")
            .unwrap();
        let recipients = RecipientResolver::recipients(&referral, &events[0], &directory);

        // The only requester is the actor, so nobody is left.
        assert!(recipients.is_empty());
    }

    #[test]
    fn test_preference_none_is_excluded() {
        let (mut referral, requester) = referral_with_requester();
        let directory = StaticDirectory::default();

        let muted = UserId::new();
        referral
            .add_requester(muted, requester, NotificationPreference::None)
            .unwrap();
        let noisy = UserId::new();
        referral
            .add_requester(noisy, requester, NotificationPreference::Restricted)
            .unwrap();

        let events = referral.close(requester, "withdrawn").unwrap();
        let recipients = RecipientResolver::recipients(&referral, &events[0], &directory);

        assert_eq!(recipients, vec![noisy]);
    }

    #[test]
    fn test_prefix_match_includes_sub_units() {
        let (referral, requester) = referral_with_requester();

        let requester_unit = UnitId::new();
        let sub_unit = UnitId::new();
        let user = UserId::new();

        let mut directory = StaticDirectory::default();
        directory.names.insert(requester_unit, "DAJ".to_string());
        directory.names.insert(sub_unit, "DAJ/SDA".to_string());
        directory
            .memberships
            .insert(requester, vec![requester_unit]);
        directory.memberships.insert(user, vec![sub_unit]);

        assert!(RecipientResolver::is_user_from_requesters_unit(
            &referral, user, &directory
        ));

        // Prefix comparison also matches units that merely share a name
        // prefix, which is the observed production behavior.
        let lookalike_unit = UnitId::new();
        let lookalike = UserId::new();
        directory
            .names
            .insert(lookalike_unit, "DAJOINT".to_string());
        directory.memberships.insert(lookalike, vec![lookalike_unit]);
        assert!(RecipientResolver::is_user_from_requesters_unit(
            &referral, lookalike, &directory
        ));
    }

    #[test]
    fn test_reopened_falls_back_to_unit_owners() {
        let (mut referral, requester) = referral_with_requester();

        let unit = UnitId::new();
        let owner = UserId::new();
        referral.assign_unit(unit, requester, None).unwrap();

        let mut directory = StaticDirectory::default();
        directory.owners.insert(unit, vec![owner]);

        // Straight to Closed without any assignee, then reopen.
        referral.close(requester, "stale").unwrap();
        let events = referral.reopen(requester, "new elements").unwrap();

        let recipients = RecipientResolver::recipients(&referral, &events[0], &directory);
        assert_eq!(recipients, vec![owner]);
    }

    #[test]
    fn test_activity_record_carries_linked_entity() {
        use crate::entity::AggregateRoot;

        let (mut referral, requester) = referral_with_requester();

        referral.close(requester, "settled by phone").unwrap();
        let events = referral.reopen(requester, "new elements").unwrap();
        let record = ActivityRecord::from_event(&events[0]);

        assert_eq!(record.verb, ActivityVerb::Reopened);
        assert_eq!(record.verb.name(), "reopened");
        assert!(matches!(record.linked, Some(LinkedEntity::History(_))));
        assert_eq!(record.message.as_deref(), Some("new elements"));
        assert_eq!(record.referral, referral.id());
    }

    #[tokio::test]
    async fn test_dispatch_survives_notifier_failure() {
        use std::sync::Mutex;

        struct FailingNotifier;

        #[async_trait]
        impl Notifier for FailingNotifier {
            async fn notify(&self, _: &ReferralEvent, _: UserId) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("smtp down"))
            }
        }

        #[derive(Default)]
        struct RecordingLog {
            records: Mutex<Vec<ActivityRecord>>,
        }

        #[async_trait]
        impl ActivityLog for RecordingLog {
            async fn record(&self, record: ActivityRecord) -> anyhow::Result<()> {
                self.records.lock().unwrap().push(record);
                Ok(())
            }
        }

        let (mut referral, requester) = referral_with_requester();
        let extra = UserId::new();
        referral
            .add_requester(extra, requester, NotificationPreference::All)
            .unwrap();
        let events = referral.close(requester, "settled out of band").unwrap();

        let log = Arc::new(RecordingLog::default());
        let dispatcher = EventDispatcher::new(Arc::new(FailingNotifier), log.clone());
        let directory = StaticDirectory::default();

        // The failing notifier must not abort the dispatch.
        let pairs = dispatcher.dispatch(&referral, &events, &directory).await;
        assert_eq!(pairs, 1);
        assert_eq!(log.records.lock().unwrap().len(), 1);
    }
}
