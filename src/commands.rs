// Copyright 2025 Cowboy AI, LLC.

//! Commands targeting the referral aggregate
//!
//! A command is the typed input of one transition. [`Referral::apply`] maps
//! each command onto its transition method, so command handlers never match
//! on command kinds themselves. Commands do not return data; the handler
//! answers with a [`CommandAcknowledgment`] and the events flow to the
//! dispatcher.

use crate::entity::{CommandMarker, EntityId};
use crate::errors::ReferralResult;
use crate::events::ReferralEvent;
use crate::identifiers::{
    AnswerId, AssignmentId, ReferralId, TopicId, UnitId, UserId, ValidationRequestId,
};
use crate::referral::{
    AnswerType, NotificationPreference, Referral, ReferralStatus, UrgencyLevel,
};
use crate::validation::ValidationVerdict;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Type alias for command IDs
pub type CommandId = EntityId<CommandMarker>;

/// The typed input of one referral transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReferralCommand {
    /// Send the draft to its handling units
    Send {
        /// The requester sending the draft
        actor: UserId,
    },
    /// Assign a unit member
    AssignUser {
        /// The member to assign
        assignee: UserId,
        /// The unit the member is assigned through
        unit: UnitId,
        /// Who creates the assignment
        actor: UserId,
    },
    /// Remove a unit-member assignment
    UnassignUser {
        /// The assignment to delete
        assignment: AssignmentId,
        /// Who removes it
        actor: UserId,
    },
    /// Attach an additional handling unit
    AssignUnit {
        /// The unit to attach
        unit: UnitId,
        /// Who attaches it
        actor: UserId,
        /// Why the unit is brought in
        explanation: Option<String>,
    },
    /// Detach a handling unit
    UnassignUnit {
        /// The unit assignment to delete
        assignment: AssignmentId,
        /// Who detaches it
        actor: UserId,
    },
    /// Record a new answer version
    AddVersion {
        /// The version created by the document subsystem
        version: AnswerId,
        /// The version's author
        author: UserId,
        /// The author's unit memberships
        author_units: Vec<UnitId>,
    },
    /// Move into validation once a version exists
    AskForValidation {
        /// Who asks
        actor: UserId,
    },
    /// Request validator sign-off
    RequestAnswerValidation {
        /// The answer version to validate
        answer: AnswerId,
        /// The validator whose sign-off is requested
        validator: UserId,
        /// Who asks for the validation
        actor: UserId,
    },
    /// Record the validator's verdict
    PerformAnswerValidation {
        /// The pending request
        request: ValidationRequestId,
        /// The responding validator
        validator: UserId,
        /// Validated or denied
        verdict: ValidationVerdict,
        /// The validator's comment
        comment: String,
    },
    /// Publish the answer
    PublishAnswer {
        /// Who publishes
        actor: UserId,
    },
    /// Publish the whole report
    PublishReport {
        /// Who publishes
        actor: UserId,
    },
    /// Reopen an answered or closed referral
    Reopen {
        /// Who reopens
        actor: UserId,
        /// Why it is reopened
        explanation: String,
    },
    /// Close the referral
    Close {
        /// Who closes
        actor: UserId,
        /// Why it is closed
        explanation: String,
    },
    /// Change the urgency level
    ChangeUrgencyLevel {
        /// Who changes it
        actor: UserId,
        /// The new level
        level: UrgencyLevel,
        /// Why the urgency changed
        explanation: String,
    },
    /// Reclassify under a different topic
    UpdateTopic {
        /// Who reclassifies
        actor: UserId,
        /// The new topic
        topic: TopicId,
    },
    /// Rewrite the title
    UpdateTitle {
        /// Who rewrites it
        actor: UserId,
        /// The new title
        title: String,
        /// Optional note on the change
        explanation: Option<String>,
    },
    /// Rewrite the subtitle
    UpdateSubtitle {
        /// Who rewrites it
        actor: UserId,
        /// The new subtitle
        subtitle: String,
    },
    /// Rewrite the sub-question
    UpdateSubQuestion {
        /// Who rewrites it
        actor: UserId,
        /// The new sub-question
        sub_question: String,
    },
    /// Flip the sensitiveness classification
    UpdateStatus {
        /// Who reclassifies
        actor: UserId,
        /// The new classification
        status: ReferralStatus,
    },
    /// Record how the answer will be delivered
    UpdateAnswerType {
        /// Who records it
        actor: UserId,
        /// The new delivery mode
        answer_type: AnswerType,
    },
    /// Register a new section while splitting
    CreateSplit {
        /// Who registers it
        actor: UserId,
    },
    /// Confirm the split
    ConfirmSplit {
        /// Who confirms
        actor: UserId,
    },
    /// Abandon the split
    CancelSplit {
        /// Who abandons
        actor: UserId,
    },
    /// Link an additional requester
    AddRequester {
        /// The requester to link
        requester: UserId,
        /// Who links them
        actor: UserId,
        /// The link's notification preference
        preference: NotificationPreference,
    },
    /// Unlink a requester
    RemoveRequester {
        /// The requester to unlink
        requester: UserId,
        /// Who unlinks them
        actor: UserId,
    },
    /// Link an observer
    AddObserver {
        /// The observer to link
        observer: UserId,
        /// Who links them
        actor: UserId,
        /// The link's notification preference
        preference: NotificationPreference,
    },
    /// Unlink an observer
    RemoveObserver {
        /// The observer to unlink
        observer: UserId,
        /// Who unlinks them
        actor: UserId,
    },
}

/// A command addressed to one referral
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// The command ID, for acknowledgment correlation
    pub command_id: CommandId,

    /// The referral the command targets
    pub referral: ReferralId,

    /// The command itself
    pub command: ReferralCommand,
}

/// Status of command acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CommandStatus {
    /// Command was accepted and the transition committed
    Accepted,
    /// Command was rejected (guard, invariant, conflict or reference error)
    Rejected,
}

/// Acknowledgment returned when a command was handled
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommandAcknowledgment {
    /// The command ID that was acknowledged
    pub command_id: CommandId,
    /// Status of command acceptance
    pub status: CommandStatus,
    /// Optional rejection reason
    pub reason: Option<String>,
}

impl CommandAcknowledgment {
    /// Acknowledge a committed command
    pub fn accepted(command_id: CommandId) -> Self {
        Self {
            command_id,
            status: CommandStatus::Accepted,
            reason: None,
        }
    }

    /// Reject a command with a reason
    pub fn rejected(command_id: CommandId, reason: impl Into<String>) -> Self {
        Self {
            command_id,
            status: CommandStatus::Rejected,
            reason: Some(reason.into()),
        }
    }
}

impl Referral {
    /// Apply one command to the aggregate
    ///
    /// This is the single entry point the command handler uses; it maps each
    /// command onto the corresponding transition method and inherits its
    /// all-or-nothing contract.
    pub fn apply(&mut self, command: &ReferralCommand) -> ReferralResult<Vec<ReferralEvent>> {
        match command {
            ReferralCommand::Send { actor } => self.send(*actor),
            ReferralCommand::AssignUser {
                assignee,
                unit,
                actor,
            } => self.assign(*assignee, *unit, *actor),
            ReferralCommand::UnassignUser { assignment, actor } => {
                self.unassign(*assignment, *actor)
            }
            ReferralCommand::AssignUnit {
                unit,
                actor,
                explanation,
            } => self.assign_unit(*unit, *actor, explanation.clone()),
            ReferralCommand::UnassignUnit { assignment, actor } => {
                self.unassign_unit(*assignment, *actor)
            }
            ReferralCommand::AddVersion {
                version,
                author,
                author_units,
            } => self.add_version(*version, *author, author_units),
            ReferralCommand::AskForValidation { actor } => self.ask_for_validation(*actor),
            ReferralCommand::RequestAnswerValidation {
                answer,
                validator,
                actor,
            } => self.request_answer_validation(*answer, *validator, *actor),
            ReferralCommand::PerformAnswerValidation {
                request,
                validator,
                verdict,
                comment,
            } => self.perform_answer_validation(*request, *validator, *verdict, comment.clone()),
            ReferralCommand::PublishAnswer { actor } => self.publish_answer(*actor),
            ReferralCommand::PublishReport { actor } => self.publish_report(*actor),
            ReferralCommand::Reopen { actor, explanation } => {
                self.reopen(*actor, explanation.clone())
            }
            ReferralCommand::Close { actor, explanation } => {
                self.close(*actor, explanation.clone())
            }
            ReferralCommand::ChangeUrgencyLevel {
                actor,
                level,
                explanation,
            } => self.change_urgency_level(*actor, *level, explanation.clone()),
            ReferralCommand::UpdateTopic { actor, topic } => self.update_topic(*actor, *topic),
            ReferralCommand::UpdateTitle {
                actor,
                title,
                explanation,
            } => self.update_title(*actor, title.clone(), explanation.clone()),
            ReferralCommand::UpdateSubtitle { actor, subtitle } => {
                self.update_subtitle(*actor, subtitle.clone())
            }
            ReferralCommand::UpdateSubQuestion {
                actor,
                sub_question,
            } => self.update_subquestion(*actor, sub_question.clone()),
            ReferralCommand::UpdateStatus { actor, status } => {
                self.update_status(*actor, *status)
            }
            ReferralCommand::UpdateAnswerType { actor, answer_type } => {
                self.update_answer_type(*actor, *answer_type)
            }
            ReferralCommand::CreateSplit { actor } => self.create_split(*actor),
            ReferralCommand::ConfirmSplit { actor } => self.confirm_split(*actor),
            ReferralCommand::CancelSplit { actor } => self.cancel_split(*actor),
            ReferralCommand::AddRequester {
                requester,
                actor,
                preference,
            } => self.add_requester(*requester, *actor, *preference),
            ReferralCommand::RemoveRequester { requester, actor } => {
                self.remove_requester(*requester, *actor)
            }
            ReferralCommand::AddObserver {
                observer,
                actor,
                preference,
            } => self.add_observer(*observer, *actor, *preference),
            ReferralCommand::RemoveObserver { observer, actor } => {
                self.remove_observer(*observer, *actor)
            }
        }
    }
}
