use anyhow::Result;
use std::sync::Arc;

use crate::app::pagination::{Page, PageWindow};
use crate::app::posts::with_image_url;
use crate::domain::group::Group;
use crate::domain::post::{Post, PostFilter};
use crate::domain::user::User;
use crate::infra::storage::MediaStorage;
use crate::infra::store::Store;

/// Assembles the four post feeds. Every feed is ordered newest first and
/// sliced into pages of `page_size`.
#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn Store>,
    media: MediaStorage,
    page_size: u64,
}

#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: User,
    pub post_count: u64,
    /// Always false for anonymous viewers.
    pub following: bool,
    pub page: Page<Post>,
}

impl FeedService {
    pub fn new(store: Arc<dyn Store>, media: MediaStorage, page_size: u64) -> Self {
        Self {
            store,
            media,
            page_size,
        }
    }

    pub async fn global_feed(&self, page: Option<&str>) -> Result<Page<Post>> {
        self.paged(PostFilter::All, page).await
    }

    /// `None` when no group has this slug.
    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<Option<GroupFeed>> {
        let Some(group) = self.store.find_group_by_slug(slug).await? else {
            return Ok(None);
        };

        let page = self.paged(PostFilter::Group(group.id), page).await?;
        Ok(Some(GroupFeed { group, page }))
    }

    /// `None` when no user has this username.
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer_id: Option<i64>,
        page: Option<&str>,
    ) -> Result<Option<ProfileFeed>> {
        let Some(author) = self.store.find_user_by_username(username).await? else {
            return Ok(None);
        };

        let page = self.paged(PostFilter::Author(author.id), page).await?;
        let following = match viewer_id {
            Some(viewer_id) => self.store.is_following(viewer_id, author.id).await?,
            None => false,
        };

        Ok(Some(ProfileFeed {
            post_count: page.total_items,
            author,
            following,
            page,
        }))
    }

    pub async fn follow_feed(&self, requester_id: i64, page: Option<&str>) -> Result<Page<Post>> {
        self.paged(PostFilter::FollowedBy(requester_id), page).await
    }

    async fn paged(&self, filter: PostFilter, page: Option<&str>) -> Result<Page<Post>> {
        let total = self.store.count_posts(filter).await?;
        let window = PageWindow::new(total, self.page_size, page);
        let posts = self
            .store
            .list_posts(filter, window.limit(), window.offset())
            .await?;

        Ok(Page::new(posts, window).map(|post| with_image_url(post, &self.media)))
    }
}
