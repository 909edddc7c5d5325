// In-memory implementation of BoardStore.
//
// Nothing survives a restart. Useful for local runs (BOARD_STORAGE=memory)
// and for exercising the core without a database file.

use crate::core::board::{BoardError, BoardStore, CommentRecord, PostRecord, ReactionRecord};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A reaction is keyed by who reacted to which post, which gives us the
/// one-reaction-per-pair rule for free.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct ReactionKey {
    post_id: u64,
    author: String,
}

/// In-memory implementation of BoardStore.
///
/// **DashMap:**
/// Every map is safe to touch from concurrent tasks without a Mutex, which
/// matters because hydration fetches children for many posts at once.
pub struct InMemoryBoardStore {
    posts: DashMap<u64, PostRecord>,
    comments: DashMap<u64, CommentRecord>,
    reactions: DashMap<ReactionKey, ReactionRecord>,
    next_post_id: AtomicU64,
    next_comment_id: AtomicU64,
    next_reaction_id: AtomicU64,
}

impl InMemoryBoardStore {
    pub fn new() -> Self {
        Self {
            posts: DashMap::new(),
            comments: DashMap::new(),
            reactions: DashMap::new(),
            next_post_id: AtomicU64::new(1),
            next_comment_id: AtomicU64::new(1),
            next_reaction_id: AtomicU64::new(1),
        }
    }
}

impl InMemoryBoardStore {
    fn ensure_post(&self, post_id: u64) -> Result<(), BoardError> {
        if self.posts.contains_key(&post_id) {
            Ok(())
        } else {
            Err(BoardError::NotFound(format!("post {}", post_id)))
        }
    }
}

impl Default for InMemoryBoardStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BoardStore for InMemoryBoardStore {
    async fn insert_post(&self, author: &str, body: &str) -> Result<PostRecord, BoardError> {
        let post = PostRecord {
            id: self.next_post_id.fetch_add(1, Ordering::SeqCst),
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn insert_comment(
        &self,
        post_id: u64,
        author: &str,
        body: &str,
    ) -> Result<CommentRecord, BoardError> {
        self.ensure_post(post_id)?;
        let comment = CommentRecord {
            id: self.next_comment_id.fetch_add(1, Ordering::SeqCst),
            post_id,
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());

        // A concurrent remove_post may have run between the check and the insert
        if let Err(e) = self.ensure_post(post_id) {
            self.comments.remove(&comment.id);
            return Err(e);
        }
        Ok(comment)
    }

    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<PostRecord>, BoardError> {
        let mut posts: Vec<PostRecord> = self.posts.iter().map(|p| p.value().clone()).collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn post_exists(&self, post_id: u64) -> Result<bool, BoardError> {
        Ok(self.posts.contains_key(&post_id))
    }

    async fn fetch_child_comments(&self, post_id: u64) -> Result<Vec<CommentRecord>, BoardError> {
        let mut comments: Vec<CommentRecord> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.value().clone())
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn fetch_child_reactions(
        &self,
        post_id: u64,
    ) -> Result<Vec<ReactionRecord>, BoardError> {
        let mut reactions: Vec<ReactionRecord> = self
            .reactions
            .iter()
            .filter(|r| r.post_id == post_id)
            .map(|r| r.value().clone())
            .collect();
        reactions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(reactions)
    }

    async fn find_reaction(
        &self,
        post_id: u64,
        author: &str,
    ) -> Result<Option<ReactionRecord>, BoardError> {
        let key = ReactionKey {
            post_id,
            author: author.to_string(),
        };
        Ok(self.reactions.get(&key).map(|r| r.value().clone()))
    }

    async fn insert_reaction(
        &self,
        post_id: u64,
        author: &str,
    ) -> Result<ReactionRecord, BoardError> {
        self.ensure_post(post_id)?;
        let key = ReactionKey {
            post_id,
            author: author.to_string(),
        };

        // entry() holds the shard lock, so check-and-insert is atomic
        let reaction = match self.reactions.entry(key.clone()) {
            Entry::Occupied(_) => {
                return Err(BoardError::Conflict(format!(
                    "{} already reacted to post {}",
                    author, post_id
                )))
            }
            Entry::Vacant(slot) => {
                let reaction = ReactionRecord {
                    id: self.next_reaction_id.fetch_add(1, Ordering::SeqCst),
                    post_id,
                    author: author.to_string(),
                    created_at: Utc::now(),
                };
                slot.insert(reaction.clone());
                reaction
            }
        };

        if let Err(e) = self.ensure_post(post_id) {
            self.reactions.remove(&key);
            return Err(e);
        }
        Ok(reaction)
    }

    async fn delete_reaction(&self, post_id: u64, author: &str) -> Result<(), BoardError> {
        let key = ReactionKey {
            post_id,
            author: author.to_string(),
        };
        self.reactions
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| {
                BoardError::NotFound(format!("reaction by {} on post {}", author, post_id))
            })
    }

    async fn remove_post(&self, post_id: u64) -> Result<bool, BoardError> {
        // Post goes first so child inserts racing this call see it missing
        let removed = self.posts.remove(&post_id).is_some();
        self.comments.retain(|_, c| c.post_id != post_id);
        self.reactions.retain(|key, _| key.post_id != post_id);
        Ok(removed)
    }
}
