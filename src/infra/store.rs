use anyhow::Result;

use crate::domain::engagement::{Comment, NewComment};
use crate::domain::group::{Group, NewGroup};
use crate::domain::post::{NewPost, Post, PostChanges, PostFilter};
use crate::domain::user::{NewUser, User};

/// Persistence operations the services depend on.
///
/// Every post listing is ordered newest first: `created_at DESC, id DESC`.
/// Implemented by [`PgStore`](crate::infra::postgres::PgStore) and
/// [`MemoryStore`](crate::infra::memory::MemoryStore).
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Returns `None` when the username is already taken.
    async fn create_user(&self, new_user: NewUser) -> Result<Option<User>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// Returns `None` when the slug is already taken.
    async fn create_group(&self, new_group: NewGroup) -> Result<Option<Group>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<u64>;

    async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<Post>>;

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    /// Returns `None` when the post does not exist.
    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>>;

    /// Comments of a post, oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment>;

    async fn is_following(&self, follower_id: i64, author_id: i64) -> Result<bool>;

    /// Inserts the edge unless it exists or would be a self-follow.
    /// Returns whether a row was inserted.
    async fn follow(&self, follower_id: i64, author_id: i64) -> Result<bool>;

    /// Returns whether a row was removed.
    async fn unfollow(&self, follower_id: i64, author_id: i64) -> Result<bool>;
}
