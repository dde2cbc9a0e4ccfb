use async_trait::async_trait;

use crate::domain::{Post, Profile};
use crate::error::RepoError;

/// Fields a post listing can be filtered on.
///
/// A closed set: callers never pass raw field names through to the query
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Category,
    AuthorUsername,
}

/// Fields a post listing can be sorted on. Sorting is always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Score,
    Created,
}

/// Post store façade: create, fetch, delete, and the vote/view mutators.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a new aggregate, assigning its content-derived id and
    /// creation timestamp. Returns the post as stored.
    async fn save(&self, post: Post) -> Result<Post, RepoError>;

    /// Fetch a single post by id.
    async fn get_one(&self, id: &str) -> Result<Post, RepoError>;

    /// All posts, highest score first.
    async fn get_all(&self) -> Result<Vec<Post>, RepoError>;

    /// Posts where `field == value`, sorted by `sort` descending.
    async fn get_by(
        &self,
        field: FilterField,
        value: &str,
        sort: SortField,
    ) -> Result<Vec<Post>, RepoError>;

    /// Cast (`+1`/`-1`), change, or retract (`0`) `user_id`'s vote, then
    /// recompute the post's score and upvote percentage as a second,
    /// non-atomic step.
    async fn update_metrics(&self, post_id: &str, inc: i8, user_id: &str)
        -> Result<(), RepoError>;

    /// Add 1 to the post's view counter.
    async fn incr_views(&self, post_id: &str) -> Result<(), RepoError>;

    /// Remove the post entirely. No soft-delete, no cascade.
    async fn delete(&self, post_id: &str) -> Result<(), RepoError>;
}

/// Comment sub-store: append/remove on a post's embedded comment list.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Append a comment authored by `author`, generating its content id.
    async fn add(&self, author: Profile, body: &str, post_id: &str) -> Result<(), RepoError>;

    /// Remove the single comment whose id matches.
    async fn delete(&self, post_id: &str, comment_id: &str) -> Result<(), RepoError>;
}
