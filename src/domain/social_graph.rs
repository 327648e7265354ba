use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A directed edge: `follower_id` receives `author_id`'s posts in their follow feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: i64,
    pub author_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
