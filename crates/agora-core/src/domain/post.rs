use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::CommentThread;
use crate::domain::profile::Profile;
use crate::error::DomainError;

/// Post entity - the central aggregate of the board.
///
/// The serialized field names are the wire contract shared with existing
/// consumers; do not rename them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub score: i64,
    pub views: u64,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub author: Profile,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub votes: VoteLedger,
    pub comments: CommentThread,
    pub created: DateTime<Utc>,
    #[serde(rename = "upvotePercentage")]
    pub upvote_percentage: u32,
    pub id: String,
}

impl Post {
    /// Create a new aggregate owned by `author`.
    ///
    /// Every post starts with a single `+1` self-vote from its author:
    /// score 1, views 1, 100% upvoted, no comments. The id and creation
    /// timestamp are assigned by the store on save.
    pub fn new(
        author: Profile,
        title: String,
        category: String,
        kind: PostKind,
        url: Option<String>,
        text: Option<String>,
    ) -> Result<Self, DomainError> {
        match kind {
            PostKind::Link if url.is_none() => {
                return Err(DomainError::Validation("link post requires a url".into()));
            }
            PostKind::Text if text.is_none() => {
                return Err(DomainError::Validation("text post requires a body".into()));
            }
            _ => {}
        }

        let votes = VoteLedger::self_vote(&author.id);
        Ok(Self {
            score: 1,
            views: 1,
            kind,
            title,
            url,
            author,
            category,
            text,
            votes,
            comments: CommentThread::default(),
            created: Utc::now(),
            upvote_percentage: 100,
            id: String::new(),
        })
    }
}

/// Discriminates link submissions from self (text) posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Link,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Text => "text",
            PostKind::Link => "link",
        }
    }
}

impl FromStr for PostKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(PostKind::Text),
            "link" => Ok(PostKind::Link),
            other => Err(DomainError::Validation(format!(
                "unknown post type: {other}"
            ))),
        }
    }
}

/// A single ledger entry: one user's current vote on a post.
///
/// `vote` is always +1 or -1; a retraction removes the entry instead of
/// storing 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user: String,
    pub vote: i8,
}

/// Outcome of a ledger mutation, reported so the store can decide whether
/// anything needs to be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// A new entry was appended.
    Cast,
    /// An existing entry's value was overwritten in place.
    Changed,
    /// The entry already held this value.
    Unchanged,
    /// The entry was removed.
    Retracted,
    /// There was no entry to remove.
    NoEntry,
}

/// Ordered vote list with at most one entry per user id.
///
/// Uniqueness is enforced here rather than left to storage array operators;
/// entries keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteLedger(Vec<Vote>);

impl VoteLedger {
    /// The ledger every new post starts with: the author's own `+1`.
    pub fn self_vote(user_id: &str) -> Self {
        Self(vec![Vote {
            user: user_id.to_owned(),
            vote: 1,
        }])
    }

    /// Record `value` for `user_id`, overwriting an existing entry in place.
    pub fn set(&mut self, user_id: &str, value: i8) -> VoteChange {
        match self.0.iter_mut().find(|v| v.user == user_id) {
            Some(existing) if existing.vote == value => VoteChange::Unchanged,
            Some(existing) => {
                existing.vote = value;
                VoteChange::Changed
            }
            None => {
                self.0.push(Vote {
                    user: user_id.to_owned(),
                    vote: value,
                });
                VoteChange::Cast
            }
        }
    }

    /// Drop `user_id`'s entry, if any.
    pub fn retract(&mut self, user_id: &str) -> VoteChange {
        let before = self.0.len();
        self.0.retain(|v| v.user != user_id);
        if self.0.len() == before {
            VoteChange::NoEntry
        } else {
            VoteChange::Retracted
        }
    }

    /// The value `user_id` currently holds, if any.
    pub fn get(&self, user_id: &str) -> Option<i8> {
        self.0.iter().find(|v| v.user == user_id).map(|v| v.vote)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vote> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Profile {
        Profile {
            username: "gopher".to_owned(),
            id: "u-1".to_owned(),
        }
    }

    fn text_post() -> Post {
        Post::new(
            author(),
            "first".to_owned(),
            "news".to_owned(),
            PostKind::Text,
            None,
            Some("hello".to_owned()),
        )
        .unwrap()
    }

    #[test]
    fn new_post_starts_with_self_vote() {
        let post = text_post();

        assert_eq!(post.score, 1);
        assert_eq!(post.views, 1);
        assert_eq!(post.upvote_percentage, 100);
        assert!(post.comments.is_empty());
        assert_eq!(post.votes.len(), 1);
        assert_eq!(post.votes.get("u-1"), Some(1));
        assert!(post.id.is_empty());
    }

    #[test]
    fn link_post_requires_url() {
        let err = Post::new(
            author(),
            "no url".to_owned(),
            "news".to_owned(),
            PostKind::Link,
            None,
            None,
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn text_post_requires_body() {
        let err = Post::new(
            author(),
            "no body".to_owned(),
            "news".to_owned(),
            PostKind::Text,
            None,
            None,
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn ledger_keeps_one_entry_per_user() {
        let mut ledger = VoteLedger::default();

        assert_eq!(ledger.set("u-1", 1), VoteChange::Cast);
        assert_eq!(ledger.set("u-1", -1), VoteChange::Changed);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("u-1"), Some(-1));
    }

    #[test]
    fn ledger_reports_no_op_votes() {
        let mut ledger = VoteLedger::self_vote("u-1");

        assert_eq!(ledger.set("u-1", 1), VoteChange::Unchanged);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn ledger_retracts_by_removal() {
        let mut ledger = VoteLedger::self_vote("u-1");

        assert_eq!(ledger.retract("u-1"), VoteChange::Retracted);
        assert!(ledger.is_empty());
        assert_eq!(ledger.retract("u-1"), VoteChange::NoEntry);
    }

    #[test]
    fn ledger_preserves_insertion_order() {
        let mut ledger = VoteLedger::default();
        ledger.set("a", 1);
        ledger.set("b", -1);
        ledger.set("c", 1);
        ledger.set("b", 1);

        let users: Vec<&str> = ledger.iter().map(|v| v.user.as_str()).collect();
        assert_eq!(users, vec!["a", "b", "c"]);
    }

    #[test]
    fn serializes_wire_field_names() {
        let post = text_post();
        let value = serde_json::to_value(&post).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            "id",
            "score",
            "views",
            "type",
            "title",
            "author",
            "category",
            "text",
            "votes",
            "comments",
            "created",
            "upvotePercentage",
        ] {
            assert!(obj.contains_key(key), "missing field {key}");
        }
        // A text post carries no url at all.
        assert!(!obj.contains_key("url"));
        assert_eq!(obj["type"], "text");
        assert_eq!(obj["votes"][0]["user"], "u-1");
        assert_eq!(obj["votes"][0]["vote"], 1);
        assert_eq!(obj["author"]["username"], "gopher");
    }

    #[test]
    fn deserializes_wire_representation() {
        let raw = serde_json::json!({
            "id": "p-1",
            "score": 2,
            "views": 7,
            "type": "link",
            "title": "somewhere",
            "url": "https://example.com",
            "author": {"username": "gopher", "id": "u-1"},
            "category": "programming",
            "votes": [{"user": "u-1", "vote": 1}, {"user": "u-2", "vote": 1}],
            "comments": [],
            "created": "2024-01-01T00:00:00Z",
            "upvotePercentage": 100
        });

        let post: Post = serde_json::from_value(raw).unwrap();
        assert_eq!(post.kind, PostKind::Link);
        assert_eq!(post.url.as_deref(), Some("https://example.com"));
        assert_eq!(post.text, None);
        assert_eq!(post.votes.len(), 2);
    }
}
