use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::profile::Profile;

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub created: DateTime<Utc>,
    pub author: Profile,
    pub body: String,
    pub id: String,
}

/// Insertion-ordered comment list with linear removal by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentThread(Vec<Comment>);

impl CommentThread {
    pub fn push(&mut self, comment: Comment) {
        self.0.push(comment);
    }

    /// Remove the single entry whose id matches. Returns false when nothing
    /// matched.
    pub fn remove(&mut self, comment_id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c.id != comment_id);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
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

    fn comment(id: &str) -> Comment {
        Comment {
            created: Utc::now(),
            author: Profile {
                username: "gopher".to_owned(),
                id: "u-1".to_owned(),
            },
            body: "hi".to_owned(),
            id: id.to_owned(),
        }
    }

    #[test]
    fn removes_only_the_matching_comment() {
        let mut thread = CommentThread::default();
        thread.push(comment("c-1"));
        thread.push(comment("c-2"));

        assert!(thread.remove("c-1"));
        assert_eq!(thread.len(), 1);
        assert_eq!(thread.iter().next().unwrap().id, "c-2");
    }

    #[test]
    fn remove_of_unknown_id_reports_false() {
        let mut thread = CommentThread::default();
        thread.push(comment("c-1"));

        assert!(!thread.remove("c-9"));
        assert_eq!(thread.len(), 1);
    }
}
