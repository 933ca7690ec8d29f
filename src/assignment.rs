//! Assignment records linking referrals to units and unit members
//!
//! Assignments are immutable once created: a transition either creates a new
//! record or deletes an existing one, never edits it. Creator provenance and
//! the creation timestamp are kept for the activity timeline.

use crate::identifiers::{AssignmentId, UnitId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit member assigned to work on a referral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssignment {
    /// Identifier of this assignment, local to the referral
    pub id: AssignmentId,

    /// The assigned unit member
    pub assignee: UserId,

    /// The unit through which the member was assigned
    pub unit: UnitId,

    /// Who created the assignment
    pub created_by: UserId,

    /// When the assignment was created
    pub created_at: DateTime<Utc>,
}

impl UserAssignment {
    /// Create a new assignment record
    pub fn new(assignee: UserId, unit: UnitId, created_by: UserId) -> Self {
        Self {
            id: AssignmentId::new(),
            assignee,
            unit,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// A handling unit attached to a referral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAssignment {
    /// Identifier of this assignment, local to the referral
    pub id: AssignmentId,

    /// The attached unit
    pub unit: UnitId,

    /// Who attached the unit
    pub created_by: UserId,

    /// When the unit was attached
    pub created_at: DateTime<Utc>,

    /// Why the unit was brought in
    pub explanation: Option<String>,
}

impl UnitAssignment {
    /// Create a new unit-assignment record
    pub fn new(unit: UnitId, created_by: UserId, explanation: Option<String>) -> Self {
        Self {
            id: AssignmentId::new(),
            unit,
            created_by,
            created_at: Utc::now(),
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_assignment_provenance() {
        let assignee = UserId::new();
        let unit = UnitId::new();
        let created_by = UserId::new();

        let assignment = UserAssignment::new(assignee, unit, created_by);

        assert_eq!(assignment.assignee, assignee);
        assert_eq!(assignment.unit, unit);
        assert_eq!(assignment.created_by, created_by);
        assert!(!assignment.id.as_uuid().is_nil());
    }

    #[test]
    fn test_unit_assignment_explanation() {
        let unit = UnitId::new();
        let created_by = UserId::new();

        let with = UnitAssignment::new(unit, created_by, Some("needs tax expertise".into()));
        assert_eq!(with.explanation.as_deref(), Some("needs tax expertise"));

        let without = UnitAssignment::new(unit, created_by, None);
        assert!(without.explanation.is_none());
        assert_ne!(with.id, without.id);
    }

    #[test]
    fn test_assignment_serde_roundtrip() {
        let assignment = UserAssignment::new(UserId::new(), UnitId::new(), UserId::new());

        let json = serde_json::to_string(&assignment).unwrap();
        let back: UserAssignment = serde_json::from_str(&json).unwrap();

        assert_eq!(assignment, back);
    }
}
