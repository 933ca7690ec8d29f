// Copyright 2025 Cowboy AI, LLC.

//! Validation request/response cycle gating answer publication
//!
//! A validation request is created against exactly one `(answer, validator)`
//! pair; the same pair can never carry two live requests. The response, once
//! recorded, is immutable; re-validation means a fresh request on a newer
//! answer version.

use crate::identifiers::{AnswerId, UserId, ValidationRequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The validator's verdict on an answer version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum ValidationVerdict {
    /// The answer can be published as is
    Validated,
    /// The answer needs another pass
    Denied,
}

/// A validator's sign-off request on an answer version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Identifier of this request
    pub id: ValidationRequestId,

    /// The answer version to be validated
    pub answer: AnswerId,

    /// The validator whose sign-off is requested
    pub validator: UserId,

    /// Who asked for the validation
    pub requested_by: UserId,

    /// When the validation was requested
    pub requested_at: DateTime<Utc>,

    /// The validator's response, at most one per request
    pub response: Option<ValidationResponse>,
}

impl ValidationRequest {
    /// Create a new pending request
    pub fn new(answer: AnswerId, validator: UserId, requested_by: UserId) -> Self {
        Self {
            id: ValidationRequestId::new(),
            answer,
            validator,
            requested_by,
            requested_at: Utc::now(),
            response: None,
        }
    }

    /// Check whether the request still awaits its response
    pub fn is_pending(&self) -> bool {
        self.response.is_none()
    }

    /// Check whether this request covers the given pair
    pub fn matches(&self, answer: AnswerId, validator: UserId) -> bool {
        self.answer == answer && self.validator == validator
    }
}

/// The recorded verdict of a validation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Validated or denied
    pub verdict: ValidationVerdict,

    /// The validator's comment to the drafter
    pub comment: String,

    /// When the verdict was recorded
    pub responded_at: DateTime<Utc>,
}

impl ValidationResponse {
    /// Record a verdict with its comment
    pub fn new(verdict: ValidationVerdict, comment: impl Into<String>) -> Self {
        Self {
            verdict,
            comment: comment.into(),
            responded_at: Utc::now(),
        }
    }
}
