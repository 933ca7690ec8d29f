//! Referral aggregate and its guarded transitions
//!
//! A Referral is the aggregate root of the crate: it owns the lifecycle
//! state, the user links, the unit and member assignments, the validation
//! requests and the history records. Every mutation goes through one of the
//! transition methods below, which validate references, check the guard
//! table, check invariants, and only then mutate, so a failed transition leaves
//! the aggregate byte-for-byte unchanged.
//!
//! Transitions return the list of [`ReferralEvent`]s they produced. The
//! caller persists the aggregate and forwards that list to the dispatcher;
//! nothing is published from inside the aggregate.

use crate::assignment::{UnitAssignment, UserAssignment};
use crate::entity::{AggregateRoot, Entity, ReferralMarker};
use crate::errors::{ReferralError, ReferralResult};
use crate::events::{
    AnswerPublished, AnswerTypeUpdated, AnswerValidationPerformed, AnswerValidationRequested,
    ObserverAdded, ObserverRemoved, ReferralClosed, ReferralEvent, ReferralReopened, ReferralSent,
    ReportPublished, RequesterAdded, RequesterRemoved, SplitCancelled, SplitConfirmed,
    SplitCreated, StatusUpdated, SubQuestionUpdated, SubtitleUpdated, TitleUpdated, TopicUpdated,
    UnitAssigned, UnitMemberAssigned, UnitMemberUnassigned, UnitUnassigned, UrgencyLevelChanged,
    VersionAdded,
};
use crate::history::{ReopeningRecord, TitleRecord, TopicRecord, UrgencyLevelRecord};
use crate::identifiers::{
    AnswerId, AssignmentId, NoteId, ReferralId, TopicId, UnitId, UserId, ValidationRequestId,
};
use crate::state_machine::{ReferralState, Transition};
use crate::validation::{ValidationRequest, ValidationResponse, ValidationVerdict};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Secondary classification, decoupled from the lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum ReferralStatus {
    /// Normal handling
    #[default]
    Normal,
    /// Restricted visibility while being handled
    Sensitive,
}

/// How the answer will be delivered to the requesters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum AnswerType {
    /// The answer is an attached document
    Attachment,
    /// The answer is written in the editor
    Editor,
    /// Not decided yet
    #[default]
    None,
}

/// Urgency of a referral
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum UrgencyLevel {
    /// Standard three-week handling
    #[default]
    Normal,
    /// One-week handling
    Urgent,
    /// Three-day handling
    VeryUrgent,
    /// Same-day handling
    AbsoluteEmergency,
}

impl UrgencyLevel {
    /// Whether changing *to* this level demands an explanation
    pub fn requires_justification(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Role of a user linked to a referral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum ReferralRole {
    /// Asked the question and receives the answer
    Requester,
    /// Follows the referral without owning it
    Observer,
}

/// How much notification traffic a linked user wants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum NotificationPreference {
    /// Every event
    #[default]
    All,
    /// Only the events that change the outcome (urgency, closing, answer)
    Restricted,
    /// Nothing
    None,
}

/// A user linked to the referral with a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLink {
    /// Requester or observer
    pub role: ReferralRole,

    /// The user's notification preference for this referral
    pub notification_preference: NotificationPreference,

    /// When the link was created
    pub linked_at: DateTime<Utc>,
}

impl UserLink {
    fn new(role: ReferralRole, notification_preference: NotificationPreference) -> Self {
        Self {
            role,
            notification_preference,
            linked_at: Utc::now(),
        }
    }
}

/// The core's read-only gate onto the document subsystem
///
/// The report itself (version contents, publishment records) belongs to the
/// reporting subsystem; the aggregate only tracks how many versions exist and
/// whether the report was published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of versions recorded so far
    pub version_count: u32,

    /// The most recent version
    pub last_version: Option<AnswerId>,

    /// Set when the answer or report was published
    pub published_at: Option<DateTime<Utc>>,
}

impl ReportSummary {
    /// Whether at least one version has been recorded
    pub fn has_versions(&self) -> bool {
        self.version_count > 0
    }

    fn record_version(&mut self, version: AnswerId) {
        self.version_count += 1;
        self.last_version = Some(version);
    }
}

/// Referral aggregate - a formal request routed to handling units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    /// Core entity data
    entity: Entity<ReferralMarker>,

    /// Version for optimistic concurrency control
    version: u64,

    state: ReferralState,
    status: ReferralStatus,
    answer_type: AnswerType,

    topic: TopicId,
    urgency_level: UrgencyLevel,
    title: String,
    sub_title: String,
    sub_question: String,

    /// Ordered set of linked users; at least one requester at all times
    users: IndexMap<UserId, UserLink>,

    /// Unit members assigned to work on the referral
    assignees: IndexMap<AssignmentId, UserAssignment>,

    /// Handling units attached to the referral
    units: IndexMap<AssignmentId, UnitAssignment>,

    /// Validation requests, in creation order
    validations: Vec<ValidationRequest>,

    report: Option<ReportSummary>,
    note: Option<NoteId>,
    sent_at: Option<DateTime<Utc>>,

    urgency_history: Vec<UrgencyLevelRecord>,
    topic_history: Vec<TopicRecord>,
    title_history: Vec<TitleRecord>,
    reopenings: Vec<ReopeningRecord>,
}

impl Referral {
    /// Create a new draft with its first requester
    pub fn new(
        id: ReferralId,
        requester: UserId,
        topic: TopicId,
        urgency_level: UrgencyLevel,
        title: impl Into<String>,
    ) -> Self {
        let mut users = IndexMap::new();
        users.insert(
            requester,
            UserLink::new(ReferralRole::Requester, NotificationPreference::All),
        );

        Self {
            entity: Entity::with_id(id),
            version: 0,
            state: ReferralState::Draft,
            status: ReferralStatus::Normal,
            answer_type: AnswerType::None,
            topic,
            urgency_level,
            title: title.into(),
            sub_title: String::new(),
            sub_question: String::new(),
            users,
            assignees: IndexMap::new(),
            units: IndexMap::new(),
            validations: Vec::new(),
            report: None,
            note: None,
            sent_at: None,
            urgency_history: Vec::new(),
            topic_history: Vec::new(),
            title_history: Vec::new(),
            reopenings: Vec::new(),
        }
    }

    /// Create a sub-referral entering the splitting family
    ///
    /// The child copies the parent's descriptive fields, user links and
    /// assignments. A parent that was still plain Received yields a child in
    /// ReceivedSplitting; any further-along parent yields Splitting, so that
    /// confirming the split resolves back into the matching branch.
    pub fn split_of(parent: &Referral, _actor: UserId) -> Self {
        let state = if parent.state == ReferralState::Received {
            ReferralState::ReceivedSplitting
        } else {
            ReferralState::Splitting
        };

        Self {
            entity: Entity::new(),
            version: 0,
            state,
            status: parent.status,
            answer_type: AnswerType::None,
            topic: parent.topic,
            urgency_level: parent.urgency_level,
            title: parent.title.clone(),
            sub_title: parent.sub_title.clone(),
            sub_question: String::new(),
            users: parent.users.clone(),
            assignees: parent.assignees.clone(),
            units: parent.units.clone(),
            validations: Vec::new(),
            report: None,
            note: None,
            sent_at: parent.sent_at,
            urgency_history: Vec::new(),
            topic_history: Vec::new(),
            title_history: Vec::new(),
            reopenings: Vec::new(),
        }
    }

    // Accessors

    /// Current lifecycle state
    pub fn state(&self) -> ReferralState {
        self.state
    }

    /// Current sensitiveness classification
    pub fn status(&self) -> ReferralStatus {
        self.status
    }

    /// How the answer will be delivered
    pub fn answer_type(&self) -> AnswerType {
        self.answer_type
    }

    /// Current topic
    pub fn topic(&self) -> TopicId {
        self.topic
    }

    /// Current urgency level
    pub fn urgency_level(&self) -> UrgencyLevel {
        self.urgency_level
    }

    /// Current title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current subtitle
    pub fn sub_title(&self) -> &str {
        &self.sub_title
    }

    /// Current sub-question
    pub fn sub_question(&self) -> &str {
        &self.sub_question
    }

    /// When the referral left Draft, if it has
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    /// All linked users with their roles, in link order
    pub fn users(&self) -> &IndexMap<UserId, UserLink> {
        &self.users
    }

    /// Linked users with the requester role, in link order
    pub fn requesters(&self) -> impl Iterator<Item = (UserId, &UserLink)> {
        self.users
            .iter()
            .filter(|(_, link)| link.role == ReferralRole::Requester)
            .map(|(id, link)| (*id, link))
    }

    /// Linked users with the observer role, in link order
    pub fn observers(&self) -> impl Iterator<Item = (UserId, &UserLink)> {
        self.users
            .iter()
            .filter(|(_, link)| link.role == ReferralRole::Observer)
            .map(|(id, link)| (*id, link))
    }

    /// Current unit-member assignments
    pub fn assignees(&self) -> &IndexMap<AssignmentId, UserAssignment> {
        &self.assignees
    }

    /// Current unit assignments
    pub fn units(&self) -> &IndexMap<AssignmentId, UnitAssignment> {
        &self.units
    }

    /// IDs of the attached units, in assignment order
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.values().map(|u| u.unit).collect()
    }

    /// Validation requests, in creation order
    pub fn validations(&self) -> &[ValidationRequest] {
        &self.validations
    }

    /// True while any validation request awaits its response
    pub fn has_pending_validation(&self) -> bool {
        self.validations.iter().any(ValidationRequest::is_pending)
    }

    /// The report summary, if any version was recorded
    pub fn report(&self) -> Option<&ReportSummary> {
        self.report.as_ref()
    }

    /// The attached knowledge-base note, if any
    pub fn note(&self) -> Option<NoteId> {
        self.note
    }

    /// Urgency-level history, oldest first
    pub fn urgency_history(&self) -> &[UrgencyLevelRecord] {
        &self.urgency_history
    }

    /// Topic history, oldest first
    pub fn topic_history(&self) -> &[TopicRecord] {
        &self.topic_history
    }

    /// Title history, oldest first
    pub fn title_history(&self) -> &[TitleRecord] {
        &self.title_history
    }

    /// Reopening history, oldest first
    pub fn reopenings(&self) -> &[ReopeningRecord] {
        &self.reopenings
    }

    /// Attach the knowledge-base note produced by the answer
    ///
    /// The note itself belongs to the knowledge-base subsystem; the aggregate
    /// only keeps the reference so that closing can surface it for deletion.
    pub fn attach_note(&mut self, note: NoteId) {
        self.note = Some(note);
        self.touch();
    }

    fn requester_count(&self) -> usize {
        self.requesters().count()
    }

    fn has_assignee_from(&self, unit: UnitId) -> bool {
        self.assignees.values().any(|a| a.unit == unit)
    }

    fn guard(&self, transition: Transition) -> ReferralResult<()> {
        if transition.allowed_from(self.state) {
            Ok(())
        } else {
            Err(ReferralError::TransitionNotAllowed {
                transition,
                from: self.state,
            })
        }
    }

    fn touch(&mut self) {
        self.entity.touch();
        self.version += 1;
    }

    // Lifecycle transitions

    /// Send the draft to its handling units
    pub fn send(&mut self, actor: UserId) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::Send)?;

        let sent_at = Utc::now();
        self.state = ReferralState::Received;
        self.sent_at = Some(sent_at);
        self.touch();

        Ok(vec![ReferralEvent::Sent(ReferralSent {
            referral: self.id(),
            actor,
            sent_at,
        })])
    }

    /// Assign a unit member to work on the referral
    pub fn assign(
        &mut self,
        assignee: UserId,
        unit: UnitId,
        created_by: UserId,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::AssignUser)?;

        if let Some(existing) = self.assignees.values().find(|a| a.assignee == assignee) {
            return Err(ReferralError::AlreadyAssigned {
                assignee,
                unit: existing.unit,
            });
        }

        let assignment = UserAssignment::new(assignee, unit, created_by);
        let assignment_id = assignment.id;
        self.assignees.insert(assignment_id, assignment);

        // Work in progress keeps its state; otherwise the first assignment
        // moves the referral to Assigned.
        if !matches!(
            self.state,
            ReferralState::Processing
                | ReferralState::InValidation
                | ReferralState::Splitting
                | ReferralState::ReceivedSplitting
        ) {
            self.state = ReferralState::Assigned;
        }
        self.touch();

        Ok(vec![ReferralEvent::UnitMemberAssigned(UnitMemberAssigned {
            referral: self.id(),
            actor: created_by,
            assignee,
            unit,
            assignment: assignment_id,
        })])
    }

    /// Remove a unit-member assignment
    pub fn unassign(
        &mut self,
        assignment: AssignmentId,
        actor: UserId,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UnassignUser)?;

        let removed = self
            .assignees
            .shift_remove(&assignment)
            .ok_or(ReferralError::AssignmentNotFound { assignment })?;

        // The splitting family keeps its state until the split is confirmed;
        // only a plain Assigned referral falls back to Received when the last
        // assignee leaves.
        if !self.state.is_splitting()
            && self.assignees.is_empty()
            && self.state == ReferralState::Assigned
        {
            self.state = ReferralState::Received;
        }
        self.touch();

        Ok(vec![ReferralEvent::UnitMemberUnassigned(
            UnitMemberUnassigned {
                referral: self.id(),
                actor,
                assignee: removed.assignee,
                unit: removed.unit,
            },
        )])
    }

    /// Attach an additional handling unit
    pub fn assign_unit(
        &mut self,
        unit: UnitId,
        created_by: UserId,
        explanation: Option<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::AssignUnit)?;

        if self.units.values().any(|u| u.unit == unit) {
            return Err(ReferralError::UnitAlreadyAssigned { unit });
        }

        let assignment = UnitAssignment::new(unit, created_by, explanation.clone());
        let assignment_id = assignment.id;
        self.units.insert(assignment_id, assignment);
        self.touch();

        Ok(vec![ReferralEvent::UnitAssigned(UnitAssigned {
            referral: self.id(),
            actor: created_by,
            unit,
            assignment: assignment_id,
            explanation,
        })])
    }

    /// Detach a handling unit
    pub fn unassign_unit(
        &mut self,
        assignment: AssignmentId,
        actor: UserId,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UnassignUnit)?;

        let unit = self
            .units
            .get(&assignment)
            .ok_or(ReferralError::AssignmentNotFound { assignment })?
            .unit;

        if self.units.len() == 1 {
            return Err(ReferralError::LastUnitCannotBeRemoved);
        }
        if self.has_assignee_from(unit) {
            return Err(ReferralError::UnitHasActiveAssignee { unit });
        }

        self.units.shift_remove(&assignment);
        self.touch();

        Ok(vec![ReferralEvent::UnitUnassigned(UnitUnassigned {
            referral: self.id(),
            actor,
            unit,
        })])
    }

    /// Record a new answer version on the report
    ///
    /// The version itself is owned by the document subsystem; the caller
    /// passes its ID together with the author and the author's unit
    /// memberships. A first contribution from an unassigned member
    /// self-assigns the author to their first unit that handles the referral.
    pub fn add_version(
        &mut self,
        version: AnswerId,
        author: UserId,
        author_units: &[UnitId],
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::AddVersion)?;

        // Resolve the self-assignment before mutating anything.
        let auto_assignment = if self.assignees.is_empty() {
            let unit = author_units
                .iter()
                .find(|u| self.units.values().any(|a| a.unit == **u))
                .copied()
                .ok_or(ReferralError::AuthorNotInAssignedUnits { author })?;
            Some(UserAssignment::new(author, unit, author))
        } else {
            None
        };

        let mut events = Vec::new();

        if let Some(assignment) = auto_assignment {
            let assignment_id = assignment.id;
            let unit = assignment.unit;
            self.assignees.insert(assignment_id, assignment);
            events.push(ReferralEvent::UnitMemberAssigned(UnitMemberAssigned {
                referral: self.id(),
                actor: author,
                assignee: author,
                unit,
                assignment: assignment_id,
            }));
        }

        self.report
            .get_or_insert_with(ReportSummary::default)
            .record_version(version);

        if self.state != ReferralState::InValidation {
            self.state = ReferralState::Processing;
        }
        self.touch();

        events.push(ReferralEvent::VersionAdded(VersionAdded {
            referral: self.id(),
            actor: author,
            version,
        }));
        Ok(events)
    }

    /// Move the referral into validation once a version exists
    ///
    /// Invoked redundantly, or before any version was drafted, this is an
    /// idempotent no-op that returns the current state untouched and emits
    /// nothing.
    pub fn ask_for_validation(&mut self, _actor: UserId) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::AskForValidation)?;

        let has_versions = self.report.as_ref().is_some_and(ReportSummary::has_versions);
        if !has_versions {
            return Ok(Vec::new());
        }

        self.state = ReferralState::InValidation;
        self.touch();
        Ok(Vec::new())
    }

    /// Request validator sign-off on an answer version
    pub fn request_answer_validation(
        &mut self,
        answer: AnswerId,
        validator: UserId,
        requested_by: UserId,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::RequestAnswerValidation)?;

        if self.validations.iter().any(|r| r.matches(answer, validator)) {
            return Err(ReferralError::ValidationAlreadyRequested { answer, validator });
        }

        let request = ValidationRequest::new(answer, validator, requested_by);
        let request_id = request.id;
        self.validations.push(request);
        self.state = ReferralState::InValidation;
        self.touch();

        Ok(vec![ReferralEvent::AnswerValidationRequested(
            AnswerValidationRequested {
                referral: self.id(),
                actor: requested_by,
                request: request_id,
                answer,
                validator,
            },
        )])
    }

    /// Record the validator's verdict on a pending request
    pub fn perform_answer_validation(
        &mut self,
        request: ValidationRequestId,
        validator: UserId,
        verdict: ValidationVerdict,
        comment: impl Into<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::PerformAnswerValidation)?;

        let pending = self
            .validations
            .iter_mut()
            .find(|r| r.id == request)
            .ok_or(ReferralError::ValidationRequestNotFound { request })?;

        if pending.response.is_some() {
            return Err(ReferralError::ValidationAlreadyPerformed { request });
        }
        if pending.validator != validator {
            return Err(ReferralError::ValidatorMismatch {
                request,
                responder: validator,
            });
        }

        pending.response = Some(ValidationResponse::new(verdict, comment));
        self.touch();

        Ok(vec![ReferralEvent::AnswerValidationPerformed(
            AnswerValidationPerformed {
                referral: self.id(),
                actor: validator,
                request,
                verdict,
            },
        )])
    }

    /// Publish the answer to the requesters
    pub fn publish_answer(&mut self, actor: UserId) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::PublishAnswer)?;

        let published_at = Utc::now();
        self.state = ReferralState::Answered;
        if let Some(report) = self.report.as_mut() {
            report.published_at = Some(published_at);
        }
        self.touch();

        Ok(vec![ReferralEvent::AnswerPublished(AnswerPublished {
            referral: self.id(),
            actor,
            published_at,
        })])
    }

    /// Publish the whole report to the requesters
    pub fn publish_report(&mut self, actor: UserId) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::PublishReport)?;

        let published_at = Utc::now();
        self.state = ReferralState::Answered;
        if let Some(report) = self.report.as_mut() {
            report.published_at = Some(published_at);
        }
        self.touch();

        Ok(vec![ReferralEvent::ReportPublished(ReportPublished {
            referral: self.id(),
            actor,
            published_at,
        })])
    }

    /// Reopen an answered or closed referral
    pub fn reopen(
        &mut self,
        actor: UserId,
        explanation: impl Into<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::Reopen)?;

        let explanation = explanation.into();
        let record = ReopeningRecord::new(self.state, explanation.clone(), actor);
        let history_record = record.id;
        self.reopenings.push(record);
        self.state = ReferralState::Processing;
        self.touch();

        Ok(vec![ReferralEvent::Reopened(ReferralReopened {
            referral: self.id(),
            actor,
            explanation,
            history_record,
        })])
    }

    /// Close the referral without publishing an answer
    pub fn close(
        &mut self,
        actor: UserId,
        explanation: impl Into<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::Close)?;

        self.state = ReferralState::Closed;
        self.touch();

        Ok(vec![ReferralEvent::Closed(ReferralClosed {
            referral: self.id(),
            actor,
            explanation: explanation.into(),
            note: self.note,
        })])
    }

    // Descriptive-field transitions. Each keeps the lifecycle state and
    // returns it unchanged; history is recorded where the field is audited.
    // Notification events are suppressed while the referral is being split.

    /// Change the urgency level
    pub fn change_urgency_level(
        &mut self,
        actor: UserId,
        new_level: UrgencyLevel,
        explanation: impl Into<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::ChangeUrgencyLevel)?;

        let explanation = explanation.into();
        if new_level.requires_justification() && explanation.trim().is_empty() {
            return Err(ReferralError::MissingJustification { level: new_level });
        }

        let old_level = self.urgency_level;
        let record =
            UrgencyLevelRecord::new(old_level, new_level, explanation.clone(), actor);
        let history_record = record.id;
        self.urgency_history.push(record);
        self.urgency_level = new_level;
        self.touch();

        if self.state.is_splitting() {
            return Ok(Vec::new());
        }
        Ok(vec![ReferralEvent::UrgencyLevelChanged(UrgencyLevelChanged {
            referral: self.id(),
            actor,
            old_level,
            new_level,
            explanation,
            history_record,
        })])
    }

    /// Reclassify the referral under a different topic
    pub fn update_topic(
        &mut self,
        actor: UserId,
        new_topic: TopicId,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UpdateTopic)?;

        let old_topic = self.topic;
        let record = TopicRecord::new(old_topic, new_topic, actor);
        let history_record = record.id;
        self.topic_history.push(record);
        self.topic = new_topic;
        self.touch();

        if self.state.is_splitting() {
            return Ok(Vec::new());
        }
        Ok(vec![ReferralEvent::TopicUpdated(TopicUpdated {
            referral: self.id(),
            actor,
            old_topic,
            new_topic,
            history_record,
        })])
    }

    /// Rewrite the title
    pub fn update_title(
        &mut self,
        actor: UserId,
        new_title: impl Into<String>,
        explanation: Option<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UpdateTitle)?;

        let new_title = new_title.into();
        let old_title = std::mem::replace(&mut self.title, new_title.clone());
        let record = TitleRecord::new(old_title.clone(), new_title.clone(), explanation, actor);
        let history_record = record.id;
        self.title_history.push(record);
        self.touch();

        if self.state.is_splitting() {
            return Ok(Vec::new());
        }
        Ok(vec![ReferralEvent::TitleUpdated(TitleUpdated {
            referral: self.id(),
            actor,
            old_title,
            new_title,
            history_record,
        })])
    }

    /// Rewrite the subtitle
    pub fn update_subtitle(
        &mut self,
        actor: UserId,
        subtitle: impl Into<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UpdateSubtitle)?;

        self.sub_title = subtitle.into();
        self.touch();

        if self.state.is_splitting() {
            return Ok(Vec::new());
        }
        Ok(vec![ReferralEvent::SubtitleUpdated(SubtitleUpdated {
            referral: self.id(),
            actor,
            subtitle: self.sub_title.clone(),
        })])
    }

    /// Rewrite the sub-question
    pub fn update_subquestion(
        &mut self,
        actor: UserId,
        sub_question: impl Into<String>,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UpdateSubQuestion)?;

        self.sub_question = sub_question.into();
        self.touch();

        if self.state.is_splitting() {
            return Ok(Vec::new());
        }
        Ok(vec![ReferralEvent::SubQuestionUpdated(SubQuestionUpdated {
            referral: self.id(),
            actor,
            sub_question: self.sub_question.clone(),
        })])
    }

    /// Flip the sensitiveness classification
    ///
    /// Sensitiveness changes are always notified, splitting or not.
    pub fn update_status(
        &mut self,
        actor: UserId,
        status: ReferralStatus,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UpdateStatus)?;

        self.status = status;
        self.touch();

        Ok(vec![ReferralEvent::StatusUpdated(StatusUpdated {
            referral: self.id(),
            actor,
            status,
        })])
    }

    /// Record how the answer will be delivered
    pub fn update_answer_type(
        &mut self,
        actor: UserId,
        answer_type: AnswerType,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::UpdateAnswerType)?;

        self.answer_type = answer_type;
        self.touch();

        Ok(vec![ReferralEvent::AnswerTypeUpdated(AnswerTypeUpdated {
            referral: self.id(),
            actor,
            answer_type,
        })])
    }

    // Splitting transitions

    /// Register a new section while the referral is being split
    pub fn create_split(&mut self, actor: UserId) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::CreateSplit)?;

        self.touch();
        Ok(vec![ReferralEvent::SplitCreated(SplitCreated {
            referral: self.id(),
            actor,
        })])
    }

    /// Confirm the split and resolve back into the regular lifecycle
    pub fn confirm_split(&mut self, actor: UserId) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::ConfirmSplit)?;

        let confirmed_state = if !self.assignees.is_empty() {
            ReferralState::Assigned
        } else if self.state == ReferralState::Splitting {
            ReferralState::ReceivedVisible
        } else {
            ReferralState::Received
        };

        self.state = confirmed_state;
        self.touch();

        Ok(vec![ReferralEvent::SplitConfirmed(SplitConfirmed {
            referral: self.id(),
            actor,
            confirmed_state,
        })])
    }

    /// Abandon the split; the caller deletes the sub-referral afterwards
    pub fn cancel_split(&mut self, actor: UserId) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::CancelSplit)?;

        self.touch();
        Ok(vec![ReferralEvent::SplitCancelled(SplitCancelled {
            referral: self.id(),
            actor,
        })])
    }

    // Requester/observer management. Source state equals target state; the
    // guard still applies and the all-or-nothing contract holds.

    /// Link an additional requester
    ///
    /// A user already linked as observer is promoted instead of duplicated.
    pub fn add_requester(
        &mut self,
        requester: UserId,
        actor: UserId,
        notification_preference: NotificationPreference,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::AddRequester)?;

        match self.users.get(&requester).map(|link| link.role) {
            Some(ReferralRole::Requester) => {
                return Err(ReferralError::UserAlreadyLinked { user: requester });
            }
            Some(ReferralRole::Observer) => {
                if let Some(link) = self.users.get_mut(&requester) {
                    link.role = ReferralRole::Requester;
                    link.notification_preference = notification_preference;
                }
            }
            None => {
                self.users.insert(
                    requester,
                    UserLink::new(ReferralRole::Requester, notification_preference),
                );
            }
        }
        self.touch();

        Ok(vec![ReferralEvent::RequesterAdded(RequesterAdded {
            referral: self.id(),
            actor,
            requester,
        })])
    }

    /// Unlink a requester; the last requester can never be removed
    pub fn remove_requester(
        &mut self,
        requester: UserId,
        actor: UserId,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::RemoveRequester)?;

        match self.users.get(&requester) {
            Some(link) if link.role == ReferralRole::Requester => {}
            _ => return Err(ReferralError::UserNotLinked { user: requester }),
        }
        if self.requester_count() == 1 {
            return Err(ReferralError::LastRequesterCannotBeRemoved);
        }

        self.users.shift_remove(&requester);
        self.touch();

        Ok(vec![ReferralEvent::RequesterRemoved(RequesterRemoved {
            referral: self.id(),
            actor,
            requester,
        })])
    }

    /// Link an observer
    ///
    /// A user already linked as requester is demoted, unless they are the
    /// last requester.
    pub fn add_observer(
        &mut self,
        observer: UserId,
        actor: UserId,
        notification_preference: NotificationPreference,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::AddObserver)?;

        match self.users.get(&observer).map(|link| link.role) {
            Some(ReferralRole::Observer) => {
                return Err(ReferralError::UserAlreadyLinked { user: observer });
            }
            Some(ReferralRole::Requester) if self.requester_count() == 1 => {
                return Err(ReferralError::LastRequesterCannotBeRemoved);
            }
            Some(ReferralRole::Requester) => {
                if let Some(link) = self.users.get_mut(&observer) {
                    link.role = ReferralRole::Observer;
                    link.notification_preference = notification_preference;
                }
            }
            None => {
                self.users.insert(
                    observer,
                    UserLink::new(ReferralRole::Observer, notification_preference),
                );
            }
        }
        self.touch();

        Ok(vec![ReferralEvent::ObserverAdded(ObserverAdded {
            referral: self.id(),
            actor,
            observer,
        })])
    }

    /// Unlink an observer
    pub fn remove_observer(
        &mut self,
        observer: UserId,
        actor: UserId,
    ) -> ReferralResult<Vec<ReferralEvent>> {
        self.guard(Transition::RemoveObserver)?;

        match self.users.get(&observer) {
            Some(link) if link.role == ReferralRole::Observer => {}
            _ => return Err(ReferralError::UserNotLinked { user: observer }),
        }

        self.users.shift_remove(&observer);
        self.touch();

        Ok(vec![ReferralEvent::ObserverRemoved(ObserverRemoved {
            referral: self.id(),
            actor,
            observer,
        })])
    }

    /// Change how much notification traffic a linked user receives
    pub fn update_notification_preference(
        &mut self,
        user: UserId,
        preference: NotificationPreference,
    ) -> ReferralResult<()> {
        let link = self
            .users
            .get_mut(&user)
            .ok_or(ReferralError::UserNotLinked { user })?;
        link.notification_preference = preference;
        self.touch();
        Ok(())
    }
}

impl AggregateRoot for Referral {
    type Id = ReferralId;

    fn id(&self) -> Self::Id {
        self.entity.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
        self.entity.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> (Referral, UserId) {
        let requester = UserId::new();
        let referral = Referral::new(
            ReferralId::new(),
            requester,
            TopicId::new(),
            UrgencyLevel::Normal,
            "Telework eligibility of seasonal staff",
        );
        (referral, requester)
    }

    #[test]
    fn test_new_referral_is_draft_with_one_requester() {
        let (referral, requester) = draft();

        assert_eq!(referral.state(), ReferralState::Draft);
        assert_eq!(referral.version(), 0);
        assert!(referral.sent_at().is_none());
        assert_eq!(referral.requesters().count(), 1);
        assert_eq!(referral.requesters().next().unwrap().0, requester);
    }

    #[test]
    fn test_send_sets_sent_at_once() {
        let (mut referral, requester) = draft();

        let events = referral.send(requester).unwrap();
        assert_eq!(referral.state(), ReferralState::Received);
        assert!(referral.sent_at().is_some());
        assert_eq!(events.len(), 1);

        // A second send is a guard violation, not a silent overwrite.
        let err = referral.send(requester).unwrap_err();
        assert!(err.is_guard_violation());
    }

    #[test]
    fn test_failed_transition_leaves_aggregate_unchanged() {
        let (mut referral, requester) = draft();
        let snapshot = referral.clone();

        // Close is not allowed from Draft.
        let err = referral.close(requester, "mistake").unwrap_err();
        assert!(err.is_guard_violation());
        assert_eq!(referral, snapshot);
    }

    #[test]
    fn test_assign_moves_received_to_assigned() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let unit = UnitId::new();
        referral.assign_unit(unit, requester, None).unwrap();
        let events = referral
            .assign(UserId::new(), unit, UserId::new())
            .unwrap();

        assert_eq!(referral.state(), ReferralState::Assigned);
        assert_eq!(referral.assignees().len(), 1);
        assert!(matches!(
            events.as_slice(),
            [ReferralEvent::UnitMemberAssigned(_)]
        ));
    }

    #[test]
    fn test_assign_keeps_processing_state() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let unit = UnitId::new();
        let member = UserId::new();
        referral.assign_unit(unit, requester, None).unwrap();
        referral
            .add_version(AnswerId::new(), member, &[unit])
            .unwrap();
        assert_eq!(referral.state(), ReferralState::Processing);

        referral.assign(UserId::new(), unit, member).unwrap();
        assert_eq!(referral.state(), ReferralState::Processing);
    }

    #[test]
    fn test_duplicate_assignment_is_conflict() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let unit = UnitId::new();
        let member = UserId::new();
        referral.assign_unit(unit, requester, None).unwrap();
        referral.assign(member, unit, member).unwrap();

        let err = referral.assign(member, unit, member).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_add_version_self_assigns_author() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let unit = UnitId::new();
        let author = UserId::new();
        referral.assign_unit(unit, requester, None).unwrap();

        let events = referral
            .add_version(AnswerId::new(), author, &[UnitId::new(), unit])
            .unwrap();

        assert_eq!(referral.state(), ReferralState::Processing);
        assert_eq!(referral.assignees().len(), 1);
        let assignment = referral.assignees().values().next().unwrap();
        assert_eq!(assignment.assignee, author);
        assert_eq!(assignment.unit, unit);
        assert!(matches!(
            events.as_slice(),
            [
                ReferralEvent::UnitMemberAssigned(_),
                ReferralEvent::VersionAdded(_)
            ]
        ));
    }

    #[test]
    fn test_ask_for_validation_without_versions_is_noop() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let events = referral.ask_for_validation(requester).unwrap();
        assert_eq!(referral.state(), ReferralState::Received);
        assert!(events.is_empty());
    }

    #[test]
    fn test_ask_for_validation_with_version_moves_state() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let unit = UnitId::new();
        let author = UserId::new();
        referral.assign_unit(unit, requester, None).unwrap();
        referral
            .add_version(AnswerId::new(), author, &[unit])
            .unwrap();

        referral.ask_for_validation(author).unwrap();
        assert_eq!(referral.state(), ReferralState::InValidation);
    }

    #[test]
    fn test_urgency_requires_justification() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let err = referral
            .change_urgency_level(requester, UrgencyLevel::Urgent, "  ")
            .unwrap_err();
        assert!(matches!(
            err,
            ReferralError::MissingJustification {
                level: UrgencyLevel::Urgent
            }
        ));
        assert_eq!(referral.urgency_level(), UrgencyLevel::Normal);
        assert!(referral.urgency_history().is_empty());

        referral
            .change_urgency_level(requester, UrgencyLevel::Urgent, "committee hearing")
            .unwrap();
        assert_eq!(referral.urgency_level(), UrgencyLevel::Urgent);
        assert_eq!(referral.urgency_history().len(), 1);
    }

    #[test]
    fn test_descriptive_events_suppressed_while_splitting() {
        let (mut parent, requester) = draft();
        parent.send(requester).unwrap();

        let mut child = Referral::split_of(&parent, requester);
        assert_eq!(child.state(), ReferralState::ReceivedSplitting);

        let events = child
            .change_urgency_level(requester, UrgencyLevel::Urgent, "deadline")
            .unwrap();
        assert!(events.is_empty());
        // The history record is still written.
        assert_eq!(child.urgency_history().len(), 1);
    }

    #[test]
    fn test_confirm_split_resolves_by_assignees() {
        let (mut parent, requester) = draft();
        parent.send(requester).unwrap();

        let mut child = Referral::split_of(&parent, requester);
        let events = child.confirm_split(requester).unwrap();
        assert_eq!(child.state(), ReferralState::Received);
        assert!(matches!(
            events.as_slice(),
            [ReferralEvent::SplitConfirmed(_)]
        ));

        // With an assignee the split resolves to Assigned instead.
        let unit = UnitId::new();
        parent.assign_unit(unit, requester, None).unwrap();
        parent.assign(UserId::new(), unit, requester).unwrap();
        let mut assigned_child = Referral::split_of(&parent, requester);
        assert_eq!(assigned_child.state(), ReferralState::Splitting);
        assigned_child.confirm_split(requester).unwrap();
        assert_eq!(assigned_child.state(), ReferralState::Assigned);
    }

    #[test]
    fn test_last_requester_cannot_become_observer() {
        let (mut referral, requester) = draft();

        let err = referral
            .add_observer(requester, requester, NotificationPreference::All)
            .unwrap_err();
        assert!(matches!(err, ReferralError::LastRequesterCannotBeRemoved));
        assert_eq!(referral.requesters().count(), 1);
    }

    #[test]
    fn test_observer_promotion_to_requester() {
        let (mut referral, requester) = draft();
        let observer = UserId::new();

        referral
            .add_observer(observer, requester, NotificationPreference::Restricted)
            .unwrap();
        assert_eq!(referral.observers().count(), 1);

        referral
            .add_requester(observer, requester, NotificationPreference::All)
            .unwrap();
        assert_eq!(referral.requesters().count(), 2);
        assert_eq!(referral.observers().count(), 0);
    }

    #[test]
    fn test_update_status_allowed_from_draft() {
        let (mut referral, requester) = draft();

        let events = referral
            .update_status(requester, ReferralStatus::Sensitive)
            .unwrap();
        assert_eq!(referral.status(), ReferralStatus::Sensitive);
        assert_eq!(referral.state(), ReferralState::Draft);
        assert!(matches!(
            events.as_slice(),
            [ReferralEvent::StatusUpdated(_)]
        ));
    }

    #[test]
    fn test_close_carries_note_for_index_deletion() {
        let (mut referral, requester) = draft();
        referral.send(requester).unwrap();

        let note = NoteId::new();
        referral.attach_note(note);

        let events = referral.close(requester, "answered by phone").unwrap();
        assert_eq!(referral.state(), ReferralState::Closed);
        match events.as_slice() {
            [ReferralEvent::Closed(e)] => assert_eq!(e.note, Some(note)),
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_version_increments_on_transition() {
        let (mut referral, requester) = draft();
        let before = referral.version();

        referral.send(requester).unwrap();
        assert!(referral.version() > before);
    }
}
