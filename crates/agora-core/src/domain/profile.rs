use serde::{Deserialize, Serialize};

/// Denormalized author reference embedded in posts and comments.
///
/// A snapshot copied at creation time, not a live foreign key: it does not
/// track later username changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub id: String,
}
