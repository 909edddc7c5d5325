// Moderation gate - the one choke point every submitted text passes through.
//
// Posts and comments share this gate, so there is exactly one policy.
// NO storage dependencies here - the caller persists on Accept.

use super::content_filter::ContentFilter;
use super::moderation_models::{Accepted, Rejected};

pub struct ModerationGate {
    filter: ContentFilter,
}

impl ModerationGate {
    pub fn new(filter: ContentFilter) -> Self {
        Self { filter }
    }

    /// Number of lexicon entries the gate enforces.
    pub fn lexicon_size(&self) -> usize {
        self.filter.entry_count()
    }

    /// Review a submission.
    ///
    /// # Returns
    /// `Accepted` wrapping the text unchanged, or `Rejected` with a reason that
    /// is safe to show the submitter.
    pub fn review(&self, text: &str) -> Result<Accepted, Rejected> {
        if text.trim().is_empty() {
            return Err(Rejected::empty());
        }

        if let Some(entry) = self.filter.find_match(text) {
            // The phrase stays in the logs; the submitter only sees the reason.
            tracing::info!(
                category = %entry.category,
                phrase = entry.phrase,
                "Submission rejected by content filter"
            );
            return Err(Rejected::policy_violation());
        }

        Ok(Accepted::new(text))
    }
}

// ============================================================================
// TESTS
// ============================================================================
