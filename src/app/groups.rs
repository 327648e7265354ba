use anyhow::Result;
use std::sync::Arc;

use crate::app::forms::{cleaned, FieldErrors, REQUIRED};
use crate::domain::group::{Group, NewGroup};
use crate::infra::store::Store;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug)]
pub enum GroupCreation {
    Created(Group),
    SlugTaken,
    Invalid(FieldErrors),
}

/// Administrative group management. Groups are never deleted.
#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn Store>,
}

impl GroupService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        slug: Option<&str>,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<GroupCreation> {
        let mut errors = FieldErrors::new();

        let slug = cleaned(slug);
        match slug.as_deref() {
            None => errors.add("slug", REQUIRED),
            Some(slug) if !is_valid_slug(slug) => errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            ),
            Some(_) => {}
        }

        let title = cleaned(title);
        match title.as_deref() {
            None => errors.add("title", REQUIRED),
            Some(title) if title.chars().count() > MAX_TITLE_LEN => {
                errors.add("title", "Ensure this value has at most 200 characters.")
            }
            Some(_) => {}
        }

        let (Some(slug), Some(title)) = (slug, title) else {
            return Ok(GroupCreation::Invalid(errors));
        };
        if !errors.is_empty() {
            return Ok(GroupCreation::Invalid(errors));
        }

        let new_group = NewGroup {
            slug,
            title,
            description: cleaned(description).unwrap_or_default(),
        };
        match self.store.create_group(new_group).await? {
            Some(group) => {
                tracing::info!(group_id = group.id, slug = %group.slug, title = %group, "group created");
                Ok(GroupCreation::Created(group))
            }
            None => Ok(GroupCreation::SlugTaken),
        }
    }
}

fn is_valid_slug(slug: &str) -> bool {
    slug.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
