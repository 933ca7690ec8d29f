// Copyright 2025 Cowboy AI, LLC.

//! Error types for referral transitions

use crate::identifiers::{AnswerId, AssignmentId, UnitId, UserId, ValidationRequestId};
use crate::referral::UrgencyLevel;
use crate::state_machine::{ReferralState, Transition};
use thiserror::Error;

/// Errors that can occur while driving a referral through its lifecycle
///
/// Guard and invariant violations are detected before any mutation, so a
/// failed transition leaves the aggregate exactly as it was. The helper
/// predicates group the variants into the caller-facing taxonomy: guard
/// violations, invariant violations, uniqueness conflicts and reference
/// errors.
#[derive(Debug, Clone, Error)]
pub enum ReferralError {
    /// The referral's current state is not in the transition's source set
    #[error("transition {transition} not allowed from state {from}")]
    TransitionNotAllowed {
        /// The transition that was attempted
        transition: Transition,
        /// The state the referral was in
        from: ReferralState,
    },

    /// A referral must keep at least one requester-role link
    #[error("the last requester cannot be removed")]
    LastRequesterCannotBeRemoved,

    /// A referral must keep at least one assigned unit
    #[error("the last assigned unit cannot be removed")]
    LastUnitCannotBeRemoved,

    /// A unit with a current assignee cannot be unassigned
    #[error("unit {unit} still has an active assignee")]
    UnitHasActiveAssignee {
        /// The unit whose removal was attempted
        unit: UnitId,
    },

    /// Changing to this urgency level requires an explanation
    #[error("urgency level {level:?} requires a justification")]
    MissingJustification {
        /// The level that was requested
        level: UrgencyLevel,
    },

    /// The (assignee, unit) pair is already assigned
    #[error("user {assignee} is already assigned through unit {unit}")]
    AlreadyAssigned {
        /// The user already assigned
        assignee: UserId,
        /// The unit of the existing assignment
        unit: UnitId,
    },

    /// The unit is already attached to the referral
    #[error("unit {unit} is already assigned")]
    UnitAlreadyAssigned {
        /// The duplicate unit
        unit: UnitId,
    },

    /// A live validation request already exists for this (answer, validator)
    #[error("validation of answer {answer} by {validator} was already requested")]
    ValidationAlreadyRequested {
        /// The answer version
        answer: AnswerId,
        /// The validator already asked
        validator: UserId,
    },

    /// The validation request already carries a response
    #[error("validation request {request} was already performed")]
    ValidationAlreadyPerformed {
        /// The request that was answered twice
        request: ValidationRequestId,
    },

    /// The responder is not the validator named on the request
    #[error("user {responder} is not the validator of request {request}")]
    ValidatorMismatch {
        /// The request being responded to
        request: ValidationRequestId,
        /// The user who tried to respond
        responder: UserId,
    },

    /// The user is already linked with that role
    #[error("user {user} is already linked to the referral")]
    UserAlreadyLinked {
        /// The duplicate user
        user: UserId,
    },

    /// The user is not linked to the referral
    #[error("user {user} is not linked to the referral")]
    UserNotLinked {
        /// The missing user
        user: UserId,
    },

    /// No assignment with the given ID exists on this referral
    #[error("assignment {assignment} not found")]
    AssignmentNotFound {
        /// The missing assignment
        assignment: AssignmentId,
    },

    /// No validation request with the given ID exists on this referral
    #[error("validation request {request} not found")]
    ValidationRequestNotFound {
        /// The missing request
        request: ValidationRequestId,
    },

    /// The author has no unit in common with the referral's assigned units
    #[error("author {author} belongs to none of the referral's units")]
    AuthorNotInAssignedUnits {
        /// The version author
        author: UserId,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for referral operations
pub type ReferralResult<T> = Result<T, ReferralError>;

impl From<serde_json::Error> for ReferralError {
    fn from(err: serde_json::Error) -> Self {
        ReferralError::SerializationError(err.to_string())
    }
}

impl ReferralError {
    /// Check if this is a guard violation (wrong source state)
    pub fn is_guard_violation(&self) -> bool {
        matches!(self, ReferralError::TransitionNotAllowed { .. })
    }

    /// Check if this is an invariant violation (last requester, last unit,
    /// unit with an active assignee, missing justification)
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            ReferralError::LastRequesterCannotBeRemoved
                | ReferralError::LastUnitCannotBeRemoved
                | ReferralError::UnitHasActiveAssignee { .. }
                | ReferralError::MissingJustification { .. }
        )
    }

    /// Check if this is a uniqueness conflict (duplicate assignment, link or
    /// validation request)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ReferralError::AlreadyAssigned { .. }
                | ReferralError::UnitAlreadyAssigned { .. }
                | ReferralError::ValidationAlreadyRequested { .. }
                | ReferralError::ValidationAlreadyPerformed { .. }
                | ReferralError::UserAlreadyLinked { .. }
        )
    }

    /// Check if this is a caller-supplied reference error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReferralError::UserNotLinked { .. }
                | ReferralError::AssignmentNotFound { .. }
                | ReferralError::ValidationRequestNotFound { .. }
                | ReferralError::AuthorNotInAssignedUnits { .. }
        )
    }
}
