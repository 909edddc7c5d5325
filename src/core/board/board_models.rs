// Board domain models - posts, their child collections, and the composite view.
//
// Plain data with no storage dependencies. Records come out of a BoardStore;
// composites are built fresh per read and never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A top-level entry. The body never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: u64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: u64,
    pub post_id: u64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A "like". At most one per (post, author); the store enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionRecord {
    pub id: u64,
    pub post_id: u64,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// A post merged with its comments and reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositePost {
    #[serde(flatten)]
    pub post: PostRecord,
    /// Oldest first
    pub comments: Vec<CommentRecord>,
    /// Most recent first
    pub reactions: Vec<ReactionRecord>,
    pub reaction_count: usize,
}

impl CompositePost {
    /// Merge a post with both of its child collections.
    ///
    /// Comments end up ascending and reactions descending by creation time,
    /// with the id breaking ties, whatever order they arrived in.
    pub fn assemble(
        post: PostRecord,
        mut comments: Vec<CommentRecord>,
        mut reactions: Vec<ReactionRecord>,
    ) -> Self {
        comments.sort_by_key(|c| (c.created_at, c.id));
        reactions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let reaction_count = reactions.len();

        Self {
            post,
            comments,
            reactions,
            reaction_count,
        }
    }
}

/// Result of toggling a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub liked: bool,
}

/// Tunables for the board service.
#[derive(Debug, Clone)]
pub struct BoardSettings {
    /// Deadline for hydrating one feed request
    pub hydration_timeout: Duration,
    /// Cap on how many posts a feed request loads
    pub feed_limit: Option<usize>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            hydration_timeout: Duration::from_secs(10),
            feed_limit: None,
        }
    }
}
