//! # Referral Domain
//!
//! Core domain for routing referrals, formal requests sent by requesters to
//! specialized handling units, through assignment, drafting, validation,
//! publication and closing.
//!
//! The crate is a pure domain library built from DDD building blocks:
//! - **Entity**: Types with identity and lifecycle
//! - **Aggregate**: The [`Referral`] consistency boundary owning every mutation
//! - **State machine**: An explicit guard table over the lifecycle states
//! - **Domain events**: The facts each transition returns to its caller
//! - **Commands**: Typed transition inputs handled through acknowledgments
//! - **Collaborator traits**: Narrow seams for persistence, search indexing,
//!   notification delivery and the activity log
//!
//! ## Design principles
//!
//! 1. **Guarded transitions**: every operation declares its source states;
//!    anything else fails with a typed error before mutating
//! 2. **All-or-nothing**: side-effect records (assignments, validation
//!    requests, history) are created together with the state change or not
//!    at all
//! 3. **Explicit events**: transitions return their events as a list; there
//!    is no hidden signal registry
//! 4. **Isolation of side effects**: notification and indexing failures are
//!    logged, never thrown back into the state machine
//! 5. **Serialized writers**: the persistence boundary provides
//!    at-most-one-writer semantics per referral ID
//!
//! ## Example
//!
//! ```rust
//! use referral_domain::{Referral, ReferralId, ReferralState, TopicId, UrgencyLevel, UserId};
//!
//! let requester = UserId::new();
//! let mut referral = Referral::new(
//!     ReferralId::new(),
//!     requester,
//!     TopicId::new(),
//!     UrgencyLevel::Normal,
//!     "Overtime rules during on-call duty",
//! );
//!
//! let events = referral.send(requester).unwrap();
//! assert_eq!(referral.state(), ReferralState::Received);
//! assert_eq!(events.len(), 1);
//! ```

#![warn(missing_docs)]

mod assignment;
mod commands;
mod command_handlers;
mod entity;
mod errors;
mod events;
mod history;
mod identifiers;
mod notifications;
mod referral;
mod state_machine;
mod validation;

// Re-export core types
pub use assignment::{UnitAssignment, UserAssignment};
pub use commands::{
    CommandAcknowledgment, CommandEnvelope, CommandId, CommandStatus, ReferralCommand,
};
pub use command_handlers::{
    InMemoryReferralRepository, NoopSearchIndexer, ReferralCommandHandler, ReferralRepository,
    SearchIndexer,
};
pub use entity::{AggregateRoot, Entity, EntityId};
pub use errors::{ReferralError, ReferralResult};
pub use events::{
    AnswerPublished, AnswerTypeUpdated, AnswerValidationPerformed, AnswerValidationRequested,
    DomainEvent, ObserverAdded, ObserverRemoved, ReferralClosed, ReferralEvent, ReferralReopened,
    ReferralSent, ReportPublished, RequesterAdded, RequesterRemoved, SplitCancelled,
    SplitConfirmed, SplitCreated, StatusUpdated, SubQuestionUpdated, SubtitleUpdated,
    TitleUpdated, TopicUpdated, UnitAssigned, UnitMemberAssigned, UnitMemberUnassigned,
    UnitUnassigned, UrgencyLevelChanged, VersionAdded,
};
pub use history::{ReopeningRecord, TitleRecord, TopicRecord, UrgencyLevelRecord};
pub use identifiers::{
    AnswerId, AssignmentId, HistoryId, NoteId, ReferralId, TopicId, UnitId, UserId,
    ValidationRequestId,
};
pub use notifications::{
    ActivityLog, ActivityRecord, ActivityVerb, EventDispatcher, LinkedEntity, Notifier,
    RecipientResolver, UnitDirectory,
};
pub use referral::{
    AnswerType, NotificationPreference, Referral, ReferralRole, ReferralStatus, ReportSummary,
    UrgencyLevel, UserLink,
};
pub use state_machine::{ReferralState, State, Transition};
pub use validation::{ValidationRequest, ValidationResponse, ValidationVerdict};

// Re-export common marker types
pub mod markers {
    //! Marker types for phantom type parameters
    pub use crate::entity::{
        AnswerMarker, CommandMarker, NoteMarker, ReferralMarker, TopicMarker, UnitMarker,
        UserMarker, ValidationRequestMarker,
    };
}
