//! PostgreSQL post and comment store implementations.
//!
//! The vote and comment mutators follow the same shape: read the aggregate,
//! apply the list mutation in the domain layer, write the list back filtered
//! by post id, and treat zero affected rows as the strict
//! write-matched-nothing failure. Score recomputation is always a second,
//! non-atomic step after a vote mutation.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use agora_core::domain::{Comment, CommentThread, Post, Profile, Tally, VoteChange, VoteLedger};
use agora_core::error::RepoError;
use agora_core::id::IdGenerator;
use agora_core::ports::{CommentRepository, FilterField, PostRepository, SortField};

use super::entity::post::{self, Comments, Entity as PostEntity, Votes};

fn filter_column(field: FilterField) -> post::Column {
    match field {
        FilterField::Category => post::Column::Category,
        FilterField::AuthorUsername => post::Column::AuthorUsername,
    }
}

fn sort_column(field: SortField) -> post::Column {
    match field {
        SortField::Score => post::Column::Score,
        SortField::Created => post::Column::Created,
    }
}

/// PostgreSQL post store.
pub struct PostgresPostRepository {
    db: DbConn,
    ids: IdGenerator,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            ids: IdGenerator::new(),
        }
    }

    /// Use a caller-supplied generator, e.g. one with a fixed namespace.
    pub fn with_ids(db: DbConn, ids: IdGenerator) -> Self {
        Self { db, ids }
    }

    async fn fetch(&self, post_id: &str) -> Result<Option<post::Model>, DbErr> {
        PostEntity::find_by_id(post_id).one(&self.db).await
    }

    /// Write a mutated ledger back to the post row.
    async fn write_votes(&self, post_id: &str, votes: VoteLedger) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Votes, Expr::value(Votes(votes)))
            .filter(post::Column::Id.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::ZeroRowsAffected);
        }

        Ok(())
    }

    async fn set_vote(&self, post_id: &str, user_id: &str, inc: i8) -> Result<(), RepoError> {
        let model = self
            .fetch(post_id)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .ok_or(RepoError::NotFound)?;

        let mut votes = model.votes.0;
        if votes.set(user_id, inc) == VoteChange::Unchanged {
            // The stored entry already holds this value; the write would
            // modify nothing.
            return Err(RepoError::ZeroRowsAffected);
        }

        self.write_votes(post_id, votes).await
    }

    async fn retract_vote(&self, post_id: &str, user_id: &str) -> Result<(), RepoError> {
        let model = self
            .fetch(post_id)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .ok_or(RepoError::NotFound)?;

        let mut votes = model.votes.0;
        if votes.retract(user_id) == VoteChange::NoEntry {
            // Nothing to pull. The post exists, so this is not an error
            // here; the recompute step still applies its own checks.
            return Ok(());
        }

        self.write_votes(post_id, votes).await
    }

    /// Second half of every vote mutation: re-derive score and upvote
    /// percentage from the stored ledger and write them back.
    ///
    /// The write filters on value inequality so that an update rewriting
    /// identical values matches zero rows, the modified-count distinction
    /// the error taxonomy relies on.
    async fn recompute_score(&self, post_id: &str) -> Result<(), RepoError> {
        let model = self
            .fetch(post_id)
            .await
            .map_err(|e| RepoError::Aggregation(e.to_string()))?
            .ok_or(RepoError::NotFound)?;

        let tally = Tally::of(&model.votes.0);
        let percentage = tally.upvote_percentage as i32;

        let result = PostEntity::update_many()
            .col_expr(post::Column::Score, Expr::value(tally.score))
            .col_expr(post::Column::UpvotePercentage, Expr::value(percentage))
            .filter(post::Column::Id.eq(post_id))
            .filter(
                Condition::any()
                    .add(post::Column::Score.ne(tally.score))
                    .add(post::Column::UpvotePercentage.ne(percentage)),
            )
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::ZeroRowsAffected);
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn save(&self, mut post: Post) -> Result<Post, RepoError> {
        post.id = self.ids.content_id(&[
            post.title.as_str(),
            post.author.username.as_str(),
            post.category.as_str(),
        ]);
        post.created = Utc::now();
        let post_id = post.id.clone();

        tracing::debug!(post_id = %post_id, "saving post");

        let active: post::ActiveModel = post.into();
        let model = active.insert(&self.db).await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                RepoError::Duplicate(post_id)
            } else {
                RepoError::Query(err_str)
            }
        })?;

        Post::try_from(model).map_err(|e| RepoError::Query(e.to_string()))
    }

    async fn get_one(&self, id: &str) -> Result<Post, RepoError> {
        let model = self
            .fetch(id)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .ok_or(RepoError::NotFound)?;

        // A row that no longer decodes into the aggregate reads as absent.
        Post::try_from(model).map_err(|_| RepoError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .order_by_desc(post::Column::Score)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        models
            .into_iter()
            .map(|m| Post::try_from(m).map_err(|e| RepoError::Query(e.to_string())))
            .collect()
    }

    async fn get_by(
        &self,
        field: FilterField,
        value: &str,
        sort: SortField,
    ) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(filter_column(field).eq(value))
            .order_by_desc(sort_column(sort))
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        models
            .into_iter()
            .map(|m| Post::try_from(m).map_err(|e| RepoError::Query(e.to_string())))
            .collect()
    }

    async fn update_metrics(
        &self,
        post_id: &str,
        inc: i8,
        user_id: &str,
    ) -> Result<(), RepoError> {
        tracing::debug!(post_id = %post_id, inc, "updating post metrics");

        match inc {
            0 => self.retract_vote(post_id, user_id).await?,
            1 | -1 => self.set_vote(post_id, user_id, inc).await?,
            other => return Err(RepoError::InvalidIncrement(other)),
        }

        self.recompute_score(post_id).await
    }

    async fn incr_views(&self, post_id: &str) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Views, Expr::col(post::Column::Views).add(1))
            .filter(post::Column::Id.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::ZeroRowsAffected);
        }

        Ok(())
    }

    async fn delete(&self, post_id: &str) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(post_id)
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::ZeroRowsAffected);
        }

        Ok(())
    }
}

/// PostgreSQL comment store. Operates on the same `posts` table as the post
/// store; comments only exist embedded in their aggregate.
pub struct PostgresCommentRepository {
    db: DbConn,
    ids: IdGenerator,
}

impl PostgresCommentRepository {
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            ids: IdGenerator::new(),
        }
    }

    pub fn with_ids(db: DbConn, ids: IdGenerator) -> Self {
        Self { db, ids }
    }

    async fn write_comments(&self, post_id: &str, comments: CommentThread) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Comments, Expr::value(Comments(comments)))
            .filter(post::Column::Id.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::ZeroRowsAffected);
        }

        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn add(&self, author: Profile, body: &str, post_id: &str) -> Result<(), RepoError> {
        let model = PostEntity::find_by_id(post_id)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .ok_or(RepoError::NotFound)?;

        let created = Utc::now();
        let stamp = created.to_rfc3339();
        let id = self
            .ids
            .content_id(&[body, author.username.as_str(), author.id.as_str(), &stamp]);

        let mut comments = model.comments.0;
        comments.push(Comment {
            created,
            author,
            body: body.to_owned(),
            id,
        });

        self.write_comments(post_id, comments).await
    }

    async fn delete(&self, post_id: &str, comment_id: &str) -> Result<(), RepoError> {
        // A missing post and a missing comment read the same way: the pull
        // matched nothing.
        let model = PostEntity::find_by_id(post_id)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .ok_or(RepoError::ZeroRowsAffected)?;

        let mut comments = model.comments.0;
        if !comments.remove(comment_id) {
            return Err(RepoError::ZeroRowsAffected);
        }

        self.write_comments(post_id, comments).await
    }
}
