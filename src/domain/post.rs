use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::domain::group::GroupRef;

/// Number of characters of the text used as the post's short display form.
const HEADLINE_CHARS: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub group: Option<GroupRef>,
    pub text: String,
    pub image: Option<String>,
    /// Public URL for `image` (populated at response time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Post {
    pub fn headline(&self) -> String {
        self.text.chars().take(HEADLINE_CHARS).collect()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline())
    }
}

/// Which posts a feed listing selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub text: String,
    pub image: Option<String>,
}

/// Replacement values for the editable fields of a post.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub group_id: Option<i64>,
    pub text: String,
    pub image: Option<String>,
}
