// Copyright 2025 Cowboy AI, LLC.

//! Referral lifecycle state machine
//!
//! The referral aggregate enforces valid state transitions through an
//! explicit guard table: every [`Transition`] declares the set of source
//! states it may fire from, and the aggregate computes the target state from
//! the transition and the referral's sub-state (assignment count, pending
//! validations, splitting family).
//!
//! Invoking a transition outside its source set fails with
//! [`ReferralError::TransitionNotAllowed`](crate::ReferralError::TransitionNotAllowed)
//! and leaves the aggregate untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Lifecycle states of a referral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum ReferralState {
    /// Initial state - the requester is still composing the referral
    Draft,
    /// Sent by the requester, not yet visible to unit members
    Received,
    /// Received and made visible to the whole unit
    ReceivedVisible,
    /// At least one unit member has been assigned
    Assigned,
    /// A unit member is drafting the answer
    Processing,
    /// The draft answer awaits validator sign-off
    InValidation,
    /// Being split into sub-referrals while work was in progress
    Splitting,
    /// Being split into sub-referrals before any work started
    ReceivedSplitting,
    /// The answer has been published to the requesters
    Answered,
    /// Closed without (or after) an answer
    Closed,
    /// Legacy classification for referrals migrated with incomplete data
    Incomplete,
}

impl ReferralState {
    /// Every lifecycle state, in declaration order
    pub const ALL: [ReferralState; 11] = [
        ReferralState::Draft,
        ReferralState::Received,
        ReferralState::ReceivedVisible,
        ReferralState::Assigned,
        ReferralState::Processing,
        ReferralState::InValidation,
        ReferralState::Splitting,
        ReferralState::ReceivedSplitting,
        ReferralState::Answered,
        ReferralState::Closed,
        ReferralState::Incomplete,
    ];

    /// True for the two splitting-family states
    ///
    /// The splitting family short-circuits most target computations: a
    /// referral being split keeps its state until the split is confirmed.
    pub fn is_splitting(&self) -> bool {
        matches!(self, Self::Splitting | Self::ReceivedSplitting)
    }
}

impl State for ReferralState {
    fn name(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Received => "Received",
            Self::ReceivedVisible => "ReceivedVisible",
            Self::Assigned => "Assigned",
            Self::Processing => "Processing",
            Self::InValidation => "InValidation",
            Self::Splitting => "Splitting",
            Self::ReceivedSplitting => "ReceivedSplitting",
            Self::Answered => "Answered",
            Self::Closed => "Closed",
            Self::Incomplete => "Incomplete",
        }
    }
}

impl fmt::Display for ReferralState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Source-state sets shared between transitions. All guard knowledge lives
// in these tables; the aggregate never checks states ad hoc.

const SEND: &[ReferralState] = &[ReferralState::Draft];

const ASSIGN_USER: &[ReferralState] = &[
    ReferralState::Received,
    ReferralState::ReceivedVisible,
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
    ReferralState::Splitting,
    ReferralState::ReceivedSplitting,
];

const UNASSIGN_USER: &[ReferralState] = &[
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
    ReferralState::Splitting,
    ReferralState::ReceivedSplitting,
];

const UNIT_ASSIGNMENT: &[ReferralState] = &[
    ReferralState::Received,
    ReferralState::ReceivedVisible,
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
    ReferralState::Splitting,
    ReferralState::ReceivedSplitting,
];

const DRAFT_ANSWER: &[ReferralState] = &[
    ReferralState::Received,
    ReferralState::ReceivedVisible,
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
];

const REQUEST_VALIDATION: &[ReferralState] =
    &[ReferralState::InValidation, ReferralState::Processing];

const PERFORM_VALIDATION: &[ReferralState] = &[ReferralState::InValidation];

const PUBLISH: &[ReferralState] = &[ReferralState::InValidation, ReferralState::Processing];

const REOPEN: &[ReferralState] = &[ReferralState::Closed, ReferralState::Answered];

const CLOSE: &[ReferralState] = &[
    ReferralState::Received,
    ReferralState::ReceivedVisible,
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
];

const DESCRIPTIVE_UPDATE: &[ReferralState] = &[
    ReferralState::Received,
    ReferralState::ReceivedVisible,
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
    ReferralState::Splitting,
    ReferralState::ReceivedSplitting,
    ReferralState::Answered,
    ReferralState::Incomplete,
];

const STATUS_UPDATE: &[ReferralState] = &[
    ReferralState::Draft,
    ReferralState::Received,
    ReferralState::ReceivedVisible,
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
    ReferralState::Splitting,
    ReferralState::ReceivedSplitting,
    ReferralState::Answered,
    ReferralState::Incomplete,
];

const SPLIT: &[ReferralState] = &[ReferralState::Splitting, ReferralState::ReceivedSplitting];

const USER_LINK: &[ReferralState] = &[
    ReferralState::Draft,
    ReferralState::Received,
    ReferralState::Assigned,
    ReferralState::Processing,
    ReferralState::InValidation,
    ReferralState::Answered,
];

/// The closed set of guarded referral transitions
///
/// Each variant names one operation on the aggregate; [`Transition::sources`]
/// is the full guard table. The aggregate consults this table before touching
/// any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Send the draft to its handling units
    Send,
    /// Assign a unit member to the referral
    AssignUser,
    /// Remove a unit-member assignment
    UnassignUser,
    /// Attach an additional handling unit
    AssignUnit,
    /// Detach a handling unit
    UnassignUnit,
    /// Record a new answer version on the report
    AddVersion,
    /// Move the referral into validation once a version exists
    AskForValidation,
    /// Request validator sign-off on an answer version
    RequestAnswerValidation,
    /// Record the validator's verdict
    PerformAnswerValidation,
    /// Publish the answer to the requesters
    PublishAnswer,
    /// Publish the whole report to the requesters
    PublishReport,
    /// Reopen an answered or closed referral
    Reopen,
    /// Close the referral without publishing
    Close,
    /// Change the urgency level
    ChangeUrgencyLevel,
    /// Reclassify under a different topic
    UpdateTopic,
    /// Rewrite the title
    UpdateTitle,
    /// Rewrite the subtitle
    UpdateSubtitle,
    /// Rewrite the sub-question
    UpdateSubQuestion,
    /// Flip the sensitiveness classification
    UpdateStatus,
    /// Record how the answer will be delivered
    UpdateAnswerType,
    /// Register a new section while splitting
    CreateSplit,
    /// Confirm the split and leave the splitting family
    ConfirmSplit,
    /// Abandon the split
    CancelSplit,
    /// Link an additional requester
    AddRequester,
    /// Unlink a requester
    RemoveRequester,
    /// Link an observer
    AddObserver,
    /// Unlink an observer
    RemoveObserver,
}

impl Transition {
    /// Every transition, in declaration order
    pub const ALL: [Transition; 27] = [
        Transition::Send,
        Transition::AssignUser,
        Transition::UnassignUser,
        Transition::AssignUnit,
        Transition::UnassignUnit,
        Transition::AddVersion,
        Transition::AskForValidation,
        Transition::RequestAnswerValidation,
        Transition::PerformAnswerValidation,
        Transition::PublishAnswer,
        Transition::PublishReport,
        Transition::Reopen,
        Transition::Close,
        Transition::ChangeUrgencyLevel,
        Transition::UpdateTopic,
        Transition::UpdateTitle,
        Transition::UpdateSubtitle,
        Transition::UpdateSubQuestion,
        Transition::UpdateStatus,
        Transition::UpdateAnswerType,
        Transition::CreateSplit,
        Transition::ConfirmSplit,
        Transition::CancelSplit,
        Transition::AddRequester,
        Transition::RemoveRequester,
        Transition::AddObserver,
        Transition::RemoveObserver,
    ];

    /// The set of states this transition may fire from
    pub fn sources(&self) -> &'static [ReferralState] {
        match self {
            Self::Send => SEND,
            Self::AssignUser => ASSIGN_USER,
            Self::UnassignUser => UNASSIGN_USER,
            Self::AssignUnit | Self::UnassignUnit => UNIT_ASSIGNMENT,
            Self::AddVersion | Self::AskForValidation => DRAFT_ANSWER,
            Self::RequestAnswerValidation => REQUEST_VALIDATION,
            Self::PerformAnswerValidation => PERFORM_VALIDATION,
            Self::PublishAnswer | Self::PublishReport => PUBLISH,
            Self::Reopen => REOPEN,
            Self::Close => CLOSE,
            Self::ChangeUrgencyLevel
            | Self::UpdateTopic
            | Self::UpdateTitle
            | Self::UpdateSubtitle
            | Self::UpdateSubQuestion => DESCRIPTIVE_UPDATE,
            Self::UpdateStatus | Self::UpdateAnswerType => STATUS_UPDATE,
            Self::CreateSplit | Self::ConfirmSplit | Self::CancelSplit => SPLIT,
            Self::AddRequester
            | Self::RemoveRequester
            | Self::AddObserver
            | Self::RemoveObserver => USER_LINK,
        }
    }

    /// Check whether the transition may fire from the given state
    pub fn allowed_from(&self, state: ReferralState) -> bool {
        self.sources().contains(&state)
    }

    /// Get the name of this transition for logging/debugging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Send => "Send",
            Self::AssignUser => "AssignUser",
            Self::UnassignUser => "UnassignUser",
            Self::AssignUnit => "AssignUnit",
            Self::UnassignUnit => "UnassignUnit",
            Self::AddVersion => "AddVersion",
            Self::AskForValidation => "AskForValidation",
            Self::RequestAnswerValidation => "RequestAnswerValidation",
            Self::PerformAnswerValidation => "PerformAnswerValidation",
            Self::PublishAnswer => "PublishAnswer",
            Self::PublishReport => "PublishReport",
            Self::Reopen => "Reopen",
            Self::Close => "Close",
            Self::ChangeUrgencyLevel => "ChangeUrgencyLevel",
            Self::UpdateTopic => "UpdateTopic",
            Self::UpdateTitle => "UpdateTitle",
            Self::UpdateSubtitle => "UpdateSubtitle",
            Self::UpdateSubQuestion => "UpdateSubQuestion",
            Self::UpdateStatus => "UpdateStatus",
            Self::UpdateAnswerType => "UpdateAnswerType",
            Self::CreateSplit => "CreateSplit",
            Self::ConfirmSplit => "ConfirmSplit",
            Self::CancelSplit => "CancelSplit",
            Self::AddRequester => "AddRequester",
            Self::RemoveRequester => "RemoveRequester",
            Self::AddObserver => "AddObserver",
            Self::RemoveObserver => "RemoveObserver",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
