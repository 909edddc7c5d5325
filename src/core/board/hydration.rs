// Hydration engine - merges each post with its comments and reactions.
//
// Fan-out: every post gets two independent child fetches, run concurrently.
// Fan-in: the engine waits for all of them before returning anything, and the
// output keeps the input order no matter which fetch finished first.
// The first failed fetch fails the whole batch; the remaining fetches are
// dropped, and dropping the returned future cancels everything in flight.

use super::board_models::{CompositePost, PostRecord};
use super::board_service::BoardStore;
use futures::future::try_join_all;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("Failed to load children of post {post_id}: {reason}")]
    ChildFetchFailure { post_id: u64, reason: String },
}

/// Hydrate `posts` into composites, preserving their order.
///
/// An empty input returns immediately without touching the store.
pub async fn hydrate<S>(
    store: &S,
    posts: Vec<PostRecord>,
) -> Result<Vec<CompositePost>, HydrationError>
where
    S: BoardStore + ?Sized,
{
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let fetches = posts.into_iter().map(|post| async move {
        let post_id = post.id;
        let (comments, reactions) = tokio::try_join!(
            store.fetch_child_comments(post_id),
            store.fetch_child_reactions(post_id),
        )
        .map_err(|e| HydrationError::ChildFetchFailure {
            post_id,
            reason: e.to_string(),
        })?;

        Ok::<_, HydrationError>(CompositePost::assemble(post, comments, reactions))
    });

    try_join_all(fetches).await
}

// ============================================================================
// TESTS
// ============================================================================
