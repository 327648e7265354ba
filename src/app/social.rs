use anyhow::Result;
use std::sync::Arc;

use crate::domain::user::User;
use crate::infra::store::Store;

#[derive(Clone)]
pub struct SocialService {
    store: Arc<dyn Store>,
}

/// Result of a follow or unfollow against an existing author.
#[derive(Debug, Clone)]
pub struct FollowChange {
    pub author: User,
    /// False when the call was a no-op (edge already in the requested state,
    /// or a self-follow).
    pub changed: bool,
}

impl SocialService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// `None` when no user has this username. Following an author twice or
    /// following oneself leaves the graph unchanged.
    pub async fn follow(&self, follower_id: i64, username: &str) -> Result<Option<FollowChange>> {
        let Some(author) = self.store.find_user_by_username(username).await? else {
            return Ok(None);
        };

        let changed = if author.id == follower_id {
            false
        } else {
            self.store.follow(follower_id, author.id).await?
        };

        if changed {
            tracing::info!(follower_id, author_id = author.id, "followed author");
        }
        Ok(Some(FollowChange { author, changed }))
    }

    /// `None` when no user has this username. Removing a missing edge is a no-op.
    pub async fn unfollow(&self, follower_id: i64, username: &str) -> Result<Option<FollowChange>> {
        let Some(author) = self.store.find_user_by_username(username).await? else {
            return Ok(None);
        };

        let changed = self.store.unfollow(follower_id, author.id).await?;
        if changed {
            tracing::info!(follower_id, author_id = author.id, "unfollowed author");
        }
        Ok(Some(FollowChange { author, changed }))
    }
}
