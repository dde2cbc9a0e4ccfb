//! In-memory post store - used as fallback when no database is configured.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use agora_core::domain::{Comment, Post, Profile, Tally, VoteChange};
use agora_core::error::RepoError;
use agora_core::id::IdGenerator;
use agora_core::ports::{CommentRepository, FilterField, PostRepository, SortField};

/// In-memory post table behind an async RwLock.
///
/// Implements both the post store and the comment sub-store, like the
/// database-backed pair, which operate on one posts collection. Error
/// semantics match the SQL store exactly, including the strict
/// zero-modification rule. Data is lost on process restart.
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
    ids: IdGenerator,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            ids: IdGenerator::new(),
        }
    }

    /// Use a caller-supplied generator, e.g. one with a fixed namespace.
    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            ids,
        }
    }

    /// Mirror of the SQL store's score write-back: rewriting identical
    /// values counts as a write that modified nothing.
    fn apply_tally(post: &mut Post) -> Result<(), RepoError> {
        let tally = Tally::of(&post.votes);
        if post.score == tally.score && post.upvote_percentage == tally.upvote_percentage {
            return Err(RepoError::ZeroRowsAffected);
        }

        post.score = tally.score;
        post.upvote_percentage = tally.upvote_percentage;
        Ok(())
    }
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostStore {
    async fn save(&self, mut post: Post) -> Result<Post, RepoError> {
        post.id = self.ids.content_id(&[
            post.title.as_str(),
            post.author.username.as_str(),
            post.category.as_str(),
        ]);
        post.created = Utc::now();

        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Duplicate(post.id));
        }

        posts.push(post.clone());
        Ok(post)
    }

    async fn get_one(&self, id: &str) -> Result<Post, RepoError> {
        let posts = self.posts.read().await;
        posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;
        let mut all: Vec<Post> = posts.clone();
        all.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(all)
    }

    async fn get_by(
        &self,
        field: FilterField,
        value: &str,
        sort: SortField,
    ) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;
        let mut matched: Vec<Post> = posts
            .iter()
            .filter(|p| match field {
                FilterField::Category => p.category == value,
                FilterField::AuthorUsername => p.author.username == value,
            })
            .cloned()
            .collect();

        match sort {
            SortField::Score => matched.sort_by(|a, b| b.score.cmp(&a.score)),
            SortField::Created => matched.sort_by(|a, b| b.created.cmp(&a.created)),
        }

        Ok(matched)
    }

    async fn update_metrics(
        &self,
        post_id: &str,
        inc: i8,
        user_id: &str,
    ) -> Result<(), RepoError> {
        if !matches!(inc, -1 | 0 | 1) {
            return Err(RepoError::InvalidIncrement(inc));
        }

        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(RepoError::NotFound)?;

        if inc == 0 {
            // Retracting a vote that was never cast is not an error at the
            // ledger; the recompute below still applies its checks.
            post.votes.retract(user_id);
        } else if post.votes.set(user_id, inc) == VoteChange::Unchanged {
            return Err(RepoError::ZeroRowsAffected);
        }

        Self::apply_tally(post)
    }

    async fn incr_views(&self, post_id: &str) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(RepoError::ZeroRowsAffected)?;

        post.views += 1;
        Ok(())
    }

    async fn delete(&self, post_id: &str) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != post_id);

        if posts.len() == before {
            return Err(RepoError::ZeroRowsAffected);
        }

        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryPostStore {
    async fn add(&self, author: Profile, body: &str, post_id: &str) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(RepoError::NotFound)?;

        let created = Utc::now();
        let stamp = created.to_rfc3339();
        let id = self
            .ids
            .content_id(&[body, author.username.as_str(), author.id.as_str(), &stamp]);

        post.comments.push(Comment {
            created,
            author,
            body: body.to_owned(),
            id,
        });

        Ok(())
    }

    async fn delete(&self, post_id: &str, comment_id: &str) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(RepoError::ZeroRowsAffected)?;

        if !post.comments.remove(comment_id) {
            return Err(RepoError::ZeroRowsAffected);
        }

        Ok(())
    }
}
