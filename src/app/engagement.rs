use anyhow::Result;
use std::sync::Arc;

use crate::app::forms::cleaned;
use crate::domain::engagement::{Comment, NewComment};
use crate::infra::store::Store;

#[derive(Debug)]
pub enum CommentOutcome {
    Created(Comment),
    /// Blank text; no comment was stored.
    Rejected,
    PostNotFound,
}

#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn Store>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn add_comment(
        &self,
        author_id: i64,
        post_id: i64,
        text: Option<&str>,
    ) -> Result<CommentOutcome> {
        if self.store.find_post(post_id).await?.is_none() {
            return Ok(CommentOutcome::PostNotFound);
        }

        let Some(text) = cleaned(text) else {
            return Ok(CommentOutcome::Rejected);
        };

        let comment = self
            .store
            .create_comment(NewComment {
                post_id,
                author_id,
                text,
            })
            .await?;

        tracing::info!(comment_id = comment.id, post_id, author_id, "comment added");
        Ok(CommentOutcome::Created(comment))
    }
}
