use anyhow::Result;
use std::sync::Arc;

use crate::app::forms::{cleaned, FieldErrors, REQUIRED};
use crate::domain::engagement::Comment;
use crate::domain::post::{NewPost, Post, PostChanges, PostFilter};
use crate::infra::storage::MediaStorage;
use crate::infra::store::Store;

/// Raw fields of a create or edit submission.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: Option<String>,
    /// Slug of the group the post belongs to.
    pub group: Option<String>,
    /// Media key of an already uploaded image.
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub author_post_count: u64,
    pub comments: Vec<Comment>,
}

#[derive(Debug)]
pub enum PostSubmission {
    Saved(Post),
    Invalid(FieldErrors),
}

#[derive(Debug)]
pub enum PostEdit {
    Saved(Post),
    Invalid(FieldErrors),
    NotFound,
    /// The editor is anonymous or not the author; nothing was changed.
    NotAuthor,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn Store>,
    media: MediaStorage,
}

struct ValidPost {
    text: String,
    group_id: Option<i64>,
    image: Option<String>,
}

pub fn with_image_url(mut post: Post, media: &MediaStorage) -> Post {
    post.image_url = post.image.as_deref().and_then(|key| media.public_url(key));
    post
}

impl PostService {
    pub fn new(store: Arc<dyn Store>, media: MediaStorage) -> Self {
        Self { store, media }
    }

    pub async fn detail(&self, post_id: i64) -> Result<Option<PostDetail>> {
        let Some(post) = self.store.find_post(post_id).await? else {
            return Ok(None);
        };

        let author_post_count = self
            .store
            .count_posts(PostFilter::Author(post.author_id))
            .await?;
        let comments = self.store.list_comments(post.id).await?;

        Ok(Some(PostDetail {
            post: with_image_url(post, &self.media),
            author_post_count,
            comments,
        }))
    }

    pub async fn create(&self, author_id: i64, form: PostForm) -> Result<PostSubmission> {
        let valid = match self.validate(&form).await? {
            Ok(valid) => valid,
            Err(errors) => return Ok(PostSubmission::Invalid(errors)),
        };

        let post = self
            .store
            .create_post(NewPost {
                author_id,
                group_id: valid.group_id,
                text: valid.text,
                image: valid.image,
            })
            .await?;

        tracing::info!(post_id = post.id, author_id, headline = %post, "post created");
        Ok(PostSubmission::Saved(with_image_url(post, &self.media)))
    }

    pub async fn edit(
        &self,
        post_id: i64,
        editor_id: Option<i64>,
        form: PostForm,
    ) -> Result<PostEdit> {
        let Some(existing) = self.store.find_post(post_id).await? else {
            return Ok(PostEdit::NotFound);
        };
        if editor_id != Some(existing.author_id) {
            return Ok(PostEdit::NotAuthor);
        }

        let valid = match self.validate(&form).await? {
            Ok(valid) => valid,
            Err(errors) => return Ok(PostEdit::Invalid(errors)),
        };

        // An edit without an image keeps the one already attached.
        let changes = PostChanges {
            group_id: valid.group_id,
            text: valid.text,
            image: valid.image.or(existing.image),
        };
        match self.store.update_post(post_id, changes).await? {
            Some(post) => {
                tracing::info!(post_id, author_id = post.author_id, "post edited");
                Ok(PostEdit::Saved(with_image_url(post, &self.media)))
            }
            None => Ok(PostEdit::NotFound),
        }
    }

    async fn validate(&self, form: &PostForm) -> Result<std::result::Result<ValidPost, FieldErrors>> {
        let mut errors = FieldErrors::new();

        let text = cleaned(form.text.as_deref());
        if text.is_none() {
            errors.add("text", REQUIRED);
        }

        let mut group_id = None;
        if let Some(slug) = cleaned(form.group.as_deref()) {
            match self.store.find_group_by_slug(&slug).await? {
                Some(group) => group_id = Some(group.id),
                None => errors.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                ),
            }
        }

        let image = cleaned(form.image.as_deref());
        if let Some(key) = image.as_deref() {
            if !MediaStorage::is_valid_key(key) {
                errors.add(
                    "image",
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
            }
        }

        match text {
            Some(text) if errors.is_empty() => Ok(Ok(ValidPost {
                text,
                group_id,
                image,
            })),
            _ => Ok(Err(errors)),
        }
    }
}
