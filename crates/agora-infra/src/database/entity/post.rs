//! Post aggregate entity for SeaORM.
//!
//! Scalar fields of the aggregate live in their own columns; the embedded
//! `votes` and `comments` sequences are stored as JSONB. The primary key is
//! the content-derived post id.

use sea_orm::FromJsonQueryResult;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use agora_core::domain::{CommentThread, Post, PostKind, Profile, VoteLedger};
use agora_core::error::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub score: i64,
    pub views: i64,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub title: String,
    pub url: Option<String>,
    pub author_username: String,
    pub author_id: String,
    pub category: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub text: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub votes: Votes,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: Comments,
    pub created: DateTimeWithTimeZone,
    pub upvote_percentage: i32,
}

/// JSONB wrapper for the embedded vote ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Votes(pub VoteLedger);

/// JSONB wrapper for the embedded comment list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Comments(pub CommentThread);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to the domain aggregate. Fails when the
/// stored `type` discriminator is not a known post kind.
impl TryFrom<Model> for Post {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind: PostKind = model.kind.parse()?;

        Ok(Self {
            score: model.score,
            views: model.views as u64,
            kind,
            title: model.title,
            url: model.url,
            author: Profile {
                username: model.author_username,
                id: model.author_id,
            },
            category: model.category,
            text: model.text,
            votes: model.votes.0,
            comments: model.comments.0,
            created: model.created.into(),
            upvote_percentage: model.upvote_percentage as u32,
            id: model.id,
        })
    }
}

/// Conversion from the domain aggregate to a SeaORM ActiveModel.
impl From<Post> for ActiveModel {
    fn from(post: Post) -> Self {
        Self {
            id: Set(post.id),
            score: Set(post.score),
            views: Set(post.views as i64),
            kind: Set(post.kind.as_str().to_owned()),
            title: Set(post.title),
            url: Set(post.url),
            author_username: Set(post.author.username),
            author_id: Set(post.author.id),
            category: Set(post.category),
            text: Set(post.text),
            votes: Set(Votes(post.votes)),
            comments: Set(Comments(post.comments)),
            created: Set(post.created.into()),
            upvote_percentage: Set(post.upvote_percentage as i32),
        }
    }
}
