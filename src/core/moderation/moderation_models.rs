// Moderation domain models - verdicts handed back to the write path.
//
// These are pure domain types with no storage or transport dependencies.

use thiserror::Error;

/// Why a submission was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing but whitespace was submitted
    Empty,
    /// The text tripped the lexicon
    PolicyViolation,
}

impl RejectReason {
    /// Message safe to show the submitter. Never names the matched phrase.
    pub fn user_message(&self) -> &'static str {
        match self {
            RejectReason::Empty => "Content cannot be empty",
            RejectReason::PolicyViolation => {
                "Your content contains prohibited words, please edit it and submit again"
            }
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Empty => write!(f, "Empty"),
            RejectReason::PolicyViolation => write!(f, "Policy Violation"),
        }
    }
}

/// A submission the gate refused. Final for that attempt: resubmitting the
/// same text gets the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", .reason.user_message())]
pub struct Rejected {
    pub reason: RejectReason,
}

impl Rejected {
    pub fn empty() -> Self {
        Self {
            reason: RejectReason::Empty,
        }
    }

    pub fn policy_violation() -> Self {
        Self {
            reason: RejectReason::PolicyViolation,
        }
    }
}

/// Text that passed review and may be persisted.
///
/// Only the gate constructs these, so holding one proves the text was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    text: String,
}

impl Accepted {
    pub(super) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
