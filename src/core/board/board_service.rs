// Board service - core business logic for the posting board.
//
// This service handles:
// - The write path (posts and comments go through the moderation gate first)
// - The read path (list posts, then hydrate them with their children)
// - Reaction toggling
// - Post removal
//
// NO transport or database dependencies here - storage is a trait (port).

use super::board_models::{
    BoardSettings, CommentRecord, CompositePost, PostRecord, ReactionRecord, ToggleOutcome,
};
use super::hydration::{hydrate, HydrationError};
use crate::core::moderation::{ModerationGate, Rejected};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{0}")]
    Rejected(#[from] Rejected),

    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error("Loading the feed timed out")]
    HydrationTimeout,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting board records.
///
/// Implementations own all mutable shared state; the service never caches
/// records across calls.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Persist a new post and return it with its assigned id and timestamp.
    async fn insert_post(&self, author: &str, body: &str) -> Result<PostRecord, BoardError>;

    /// Persist a new comment on an existing post.
    /// Must fail with `NotFound` if the post does not exist.
    async fn insert_comment(
        &self,
        post_id: u64,
        author: &str,
        body: &str,
    ) -> Result<CommentRecord, BoardError>;

    /// Posts newest first, optionally capped.
    async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<PostRecord>, BoardError>;

    async fn post_exists(&self, post_id: u64) -> Result<bool, BoardError>;

    /// Comments on a post, oldest first.
    async fn fetch_child_comments(&self, post_id: u64)
        -> Result<Vec<CommentRecord>, BoardError>;

    /// Reactions on a post, most recent first.
    async fn fetch_child_reactions(
        &self,
        post_id: u64,
    ) -> Result<Vec<ReactionRecord>, BoardError>;

    async fn find_reaction(
        &self,
        post_id: u64,
        author: &str,
    ) -> Result<Option<ReactionRecord>, BoardError>;

    /// Add a reaction. Must fail with `Conflict` if (post, author) already has one,
    /// and with `NotFound` if the post does not exist.
    async fn insert_reaction(&self, post_id: u64, author: &str)
        -> Result<ReactionRecord, BoardError>;

    /// Remove a reaction. Must fail with `NotFound` if there is none.
    async fn delete_reaction(&self, post_id: u64, author: &str) -> Result<(), BoardError>;

    /// Delete a post along with its comments and reactions.
    /// Returns false if the post did not exist.
    async fn remove_post(&self, post_id: u64) -> Result<bool, BoardError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct BoardService<S: BoardStore> {
    store: S,
    gate: Arc<ModerationGate>,
    settings: BoardSettings,
}

impl<S: BoardStore> BoardService<S> {
    pub fn new(store: S, gate: Arc<ModerationGate>, settings: BoardSettings) -> Self {
        Self {
            store,
            gate,
            settings,
        }
    }

    /// Review and persist a new post.
    pub async fn submit_post(&self, author: &str, body: &str) -> Result<PostRecord, BoardError> {
        let accepted = self.gate.review(body)?;
        let post = self.store.insert_post(author, accepted.as_str()).await?;

        tracing::info!(post_id = post.id, author = author, "Post created");
        Ok(post)
    }

    /// Review and persist a comment on an existing post.
    pub async fn submit_comment(
        &self,
        post_id: u64,
        author: &str,
        body: &str,
    ) -> Result<CommentRecord, BoardError> {
        let accepted = self.gate.review(body)?;
        self.ensure_post(post_id).await?;
        let comment = self
            .store
            .insert_comment(post_id, author, accepted.as_str())
            .await?;

        tracing::info!(
            post_id = post_id,
            comment_id = comment.id,
            author = author,
            "Comment created"
        );
        Ok(comment)
    }

    /// All posts, newest first, each with its comments and reactions.
    ///
    /// Built from scratch on every call. If the configured deadline passes,
    /// every in-flight child fetch is dropped and nothing partial is returned.
    pub async fn feed(&self) -> Result<Vec<CompositePost>, BoardError> {
        let posts = self.store.list_posts(self.settings.feed_limit).await?;
        let post_count = posts.len();

        let composites =
            tokio::time::timeout(self.settings.hydration_timeout, hydrate(&self.store, posts))
                .await
                .map_err(|_| {
                    tracing::warn!(post_count, "Feed hydration timed out");
                    BoardError::HydrationTimeout
                })?
                .map_err(|e| {
                    tracing::warn!("Feed hydration failed: {}", e);
                    BoardError::from(e)
                })?;

        tracing::debug!(post_count, "Feed hydrated");
        Ok(composites)
    }

    /// Comments on one post, oldest first.
    pub async fn comments_for(&self, post_id: u64) -> Result<Vec<CommentRecord>, BoardError> {
        self.ensure_post(post_id).await?;
        self.store.fetch_child_comments(post_id).await
    }

    /// Reactions on one post, most recent first.
    pub async fn reactions_for(&self, post_id: u64) -> Result<Vec<ReactionRecord>, BoardError> {
        self.ensure_post(post_id).await?;
        self.store.fetch_child_reactions(post_id).await
    }

    /// Like the post if `actor` hasn't yet, otherwise take the like back.
    ///
    /// A concurrent toggle by the same actor can slip in between the read and
    /// the write; the store reports that as `Conflict` (or `NotFound` on delete)
    /// and we re-read and try once more.
    pub async fn toggle_reaction(
        &self,
        post_id: u64,
        actor: &str,
    ) -> Result<ToggleOutcome, BoardError> {
        self.ensure_post(post_id).await?;

        let outcome = match self.try_toggle(post_id, actor).await {
            Err(BoardError::Conflict(_)) | Err(BoardError::NotFound(_)) => {
                tracing::warn!(post_id, actor = actor, "Reaction toggle raced, retrying");
                self.try_toggle(post_id, actor).await?
            }
            other => other?,
        };

        tracing::debug!(post_id, actor = actor, liked = outcome.liked, "Reaction toggled");
        Ok(outcome)
    }

    async fn try_toggle(&self, post_id: u64, actor: &str) -> Result<ToggleOutcome, BoardError> {
        match self.store.find_reaction(post_id, actor).await? {
            Some(_) => {
                self.store.delete_reaction(post_id, actor).await?;
                Ok(ToggleOutcome { liked: false })
            }
            None => {
                self.store.insert_reaction(post_id, actor).await?;
                Ok(ToggleOutcome { liked: true })
            }
        }
    }

    /// Delete a post with everything hanging off it.
    pub async fn remove_post(&self, post_id: u64) -> Result<(), BoardError> {
        if !self.store.remove_post(post_id).await? {
            return Err(BoardError::NotFound(format!("post {}", post_id)));
        }
        tracing::info!(post_id, "Post removed");
        Ok(())
    }

    async fn ensure_post(&self, post_id: u64) -> Result<(), BoardError> {
        if self.store.post_exists(post_id).await? {
            Ok(())
        } else {
            Err(BoardError::NotFound(format!("post {}", post_id)))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::RejectReason;
    use crate::core::moderation::ContentFilter;
    use chrono::Utc;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory store for testing
    struct MockBoardStore {
        posts: DashMap<u64, PostRecord>,
        comments: DashMap<u64, Vec<CommentRecord>>,
        reactions: DashMap<(u64, String), ReactionRecord>,
        next_id: AtomicU64,
        inserts: AtomicUsize,
        /// Fail this many upcoming insert_reaction calls with Conflict
        conflicts_pending: AtomicUsize,
        /// Whether a simulated conflict leaves the racing reaction behind
        race_inserts: bool,
        fetch_delay: Option<Duration>,
    }

    impl MockBoardStore {
        fn new() -> Self {
            Self {
                posts: DashMap::new(),
                comments: DashMap::new(),
                reactions: DashMap::new(),
                next_id: AtomicU64::new(1),
                inserts: AtomicUsize::new(0),
                conflicts_pending: AtomicUsize::new(0),
                race_inserts: true,
                fetch_delay: None,
            }
        }

        fn next_id(&self) -> u64 {
            self.next_id.fetch_add(1, Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BoardStore for MockBoardStore {
        async fn insert_post(&self, author: &str, body: &str) -> Result<PostRecord, BoardError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let post = PostRecord {
                id: self.next_id(),
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
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let comment = CommentRecord {
                id: self.next_id(),
                post_id,
                author: author.to_string(),
                body: body.to_string(),
                created_at: Utc::now(),
            };
            self.comments
                .entry(post_id)
                .or_insert_with(Vec::new)
                .push(comment.clone());
            Ok(comment)
        }

        async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<PostRecord>, BoardError> {
            let mut posts: Vec<PostRecord> = self.posts.iter().map(|p| p.clone()).collect();
            posts.sort_by(|a, b| b.id.cmp(&a.id));
            if let Some(limit) = limit {
                posts.truncate(limit);
            }
            Ok(posts)
        }

        async fn post_exists(&self, post_id: u64) -> Result<bool, BoardError> {
            Ok(self.posts.contains_key(&post_id))
        }

        async fn fetch_child_comments(
            &self,
            post_id: u64,
        ) -> Result<Vec<CommentRecord>, BoardError> {
            if let Some(delay) = self.fetch_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self
                .comments
                .get(&post_id)
                .map(|c| c.clone())
                .unwrap_or_default())
        }

        async fn fetch_child_reactions(
            &self,
            post_id: u64,
        ) -> Result<Vec<ReactionRecord>, BoardError> {
            Ok(self
                .reactions
                .iter()
                .filter(|r| r.post_id == post_id)
                .map(|r| r.clone())
                .collect())
        }

        async fn find_reaction(
            &self,
            post_id: u64,
            author: &str,
        ) -> Result<Option<ReactionRecord>, BoardError> {
            Ok(self
                .reactions
                .get(&(post_id, author.to_string()))
                .map(|r| r.clone()))
        }

        async fn insert_reaction(
            &self,
            post_id: u64,
            author: &str,
        ) -> Result<ReactionRecord, BoardError> {
            if self
                .conflicts_pending
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                if self.race_inserts {
                    // Simulate another toggle landing first
                    let raced = ReactionRecord {
                        id: self.next_id(),
                        post_id,
                        author: author.to_string(),
                        created_at: Utc::now(),
                    };
                    self.reactions.insert((post_id, author.to_string()), raced);
                }
                return Err(BoardError::Conflict("reaction exists".to_string()));
            }
            let reaction = ReactionRecord {
                id: self.next_id(),
                post_id,
                author: author.to_string(),
                created_at: Utc::now(),
            };
            self.reactions
                .insert((post_id, author.to_string()), reaction.clone());
            Ok(reaction)
        }

        async fn delete_reaction(&self, post_id: u64, author: &str) -> Result<(), BoardError> {
            self.reactions
                .remove(&(post_id, author.to_string()))
                .map(|_| ())
                .ok_or_else(|| BoardError::NotFound("reaction".to_string()))
        }

        async fn remove_post(&self, post_id: u64) -> Result<bool, BoardError> {
            self.comments.remove(&post_id);
            self.reactions.retain(|(p, _), _| *p != post_id);
            Ok(self.posts.remove(&post_id).is_some())
        }
    }

    fn service_with(store: MockBoardStore) -> BoardService<MockBoardStore> {
        let gate = ModerationGate::new(ContentFilter::from_standard_lexicon().unwrap());
        BoardService::new(store, Arc::new(gate), BoardSettings::default())
    }

    #[tokio::test]
    async fn test_clean_post_is_persisted() {
        let service = service_with(MockBoardStore::new());

        let post = service.submit_post("alice", "今天天气很好").await.unwrap();

        assert_eq!(post.author, "alice");
        assert_eq!(post.body, "今天天气很好");
        assert!(service.store.post_exists(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_post_never_reaches_store() {
        let service = service_with(MockBoardStore::new());

        let err = service.submit_post("alice", "我 喜 欢 赌 博").await.unwrap_err();
        assert!(matches!(
            err,
            BoardError::Rejected(Rejected {
                reason: RejectReason::PolicyViolation
            })
        ));

        let err = service.submit_post("alice", "   ").await.unwrap_err();
        assert!(matches!(
            err,
            BoardError::Rejected(Rejected {
                reason: RejectReason::Empty
            })
        ));

        assert_eq!(service.store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_comments_share_the_post_policy() {
        let service = service_with(MockBoardStore::new());
        let post = service.submit_post("alice", "周末去爬山").await.unwrap();

        let err = service
            .submit_comment(post.id, "bob", "赌 场见")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Rejected(_)));

        let comment = service
            .submit_comment(post.id, "bob", "一起去！")
            .await
            .unwrap();
        assert_eq!(comment.post_id, post.id);
        // One post and one comment
        assert_eq!(service.store.inserts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let service = service_with(MockBoardStore::new());

        let err = service.submit_comment(42, "bob", "hello").await.unwrap_err();

        assert!(matches!(err, BoardError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_cycle() {
        let service = service_with(MockBoardStore::new());
        let post = service.submit_post("bob", "第一条").await.unwrap();

        let first = service.toggle_reaction(post.id, "alice").await.unwrap();
        assert!(first.liked);
        assert_eq!(service.reactions_for(post.id).await.unwrap().len(), 1);

        let second = service.toggle_reaction(post.id, "alice").await.unwrap();
        assert!(!second.liked);
        assert!(service.reactions_for(post.id).await.unwrap().is_empty());

        let third = service.toggle_reaction(post.id, "alice").await.unwrap();
        assert!(third.liked);
    }

    #[tokio::test]
    async fn test_toggle_retries_once_after_conflict() {
        let store = MockBoardStore::new();
        store.conflicts_pending.store(1, Ordering::SeqCst);
        let service = service_with(store);
        let post = service.submit_post("bob", "第一条").await.unwrap();

        // The racing toggle inserted first, so the retry sees it and removes it
        let outcome = service.toggle_reaction(post.id, "alice").await.unwrap();

        assert!(!outcome.liked);
        assert!(service.reactions_for(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_gives_up_after_second_conflict() {
        let mut store = MockBoardStore::new();
        store.conflicts_pending.store(2, Ordering::SeqCst);
        store.race_inserts = false;
        let service = service_with(store);
        let post = service.submit_post("bob", "第一条").await.unwrap();

        let err = service.toggle_reaction(post.id, "alice").await.unwrap_err();

        assert!(matches!(err, BoardError::Conflict(_)));
        assert_eq!(service.store.conflicts_pending.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_toggle_on_missing_post() {
        let service = service_with(MockBoardStore::new());

        let err = service.toggle_reaction(9, "alice").await.unwrap_err();

        assert!(matches!(err, BoardError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggles_by_different_actors_add_up() {
        let service = service_with(MockBoardStore::new());
        let post = service.submit_post("bob", "第一条").await.unwrap();

        for actor in ["alice", "carol", "dave"] {
            assert!(service.toggle_reaction(post.id, actor).await.unwrap().liked);
        }

        let feed = service.feed().await.unwrap();
        assert_eq!(feed[0].reaction_count, 3);
    }

    #[tokio::test]
    async fn test_feed_is_newest_first_and_hydrated() {
        let service = service_with(MockBoardStore::new());
        let older = service.submit_post("alice", "第一条").await.unwrap();
        let newer = service.submit_post("bob", "第二条").await.unwrap();
        service.submit_comment(older.id, "bob", "沙发").await.unwrap();
        service.submit_comment(older.id, "carol", "板凳").await.unwrap();
        service.toggle_reaction(older.id, "carol").await.unwrap();

        let feed = service.feed().await.unwrap();

        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].post.id, newer.id);
        assert_eq!(feed[1].post.id, older.id);
        assert_eq!(feed[1].comments.len(), 2);
        assert_eq!(feed[1].comments[0].body, "沙发");
        assert_eq!(feed[1].reaction_count, 1);
    }

    #[tokio::test]
    async fn test_feed_respects_limit() {
        let gate = ModerationGate::new(ContentFilter::from_standard_lexicon().unwrap());
        let settings = BoardSettings {
            feed_limit: Some(1),
            ..Default::default()
        };
        let service = BoardService::new(MockBoardStore::new(), Arc::new(gate), settings);
        service.submit_post("alice", "第一条").await.unwrap();
        service.submit_post("alice", "第二条").await.unwrap();

        assert_eq!(service.feed().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_times_out_without_partial_result() {
        let mut store = MockBoardStore::new();
        store.fetch_delay = Some(Duration::from_secs(30));
        let gate = ModerationGate::new(ContentFilter::from_standard_lexicon().unwrap());
        let settings = BoardSettings {
            hydration_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let service = BoardService::new(store, Arc::new(gate), settings);
        service.submit_post("alice", "第一条").await.unwrap();

        let err = service.feed().await.unwrap_err();

        assert!(matches!(err, BoardError::HydrationTimeout));
    }

    #[tokio::test]
    async fn test_remove_post_cascades() {
        let service = service_with(MockBoardStore::new());
        let post = service.submit_post("alice", "第一条").await.unwrap();
        service.submit_comment(post.id, "bob", "沙发").await.unwrap();
        service.toggle_reaction(post.id, "bob").await.unwrap();

        service.remove_post(post.id).await.unwrap();

        assert!(service.feed().await.unwrap().is_empty());
        assert!(service.store.reactions.is_empty());
        assert!(matches!(
            service.remove_post(post.id).await,
            Err(BoardError::NotFound(_))
        ));
    }
}
