use anyhow::{anyhow, Result};
use std::cmp::Reverse;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::domain::engagement::{Comment, NewComment};
use crate::domain::group::{Group, GroupRef, NewGroup};
use crate::domain::post::{NewPost, Post, PostChanges, PostFilter};
use crate::domain::social_graph::Follow;
use crate::domain::user::{NewUser, User};
use crate::infra::store::Store;

/// Process-local [`Store`] used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<PostRow>,
    comments: Vec<CommentRow>,
    follows: Vec<Follow>,
    sequences: HashMap<&'static str, i64>,
}

struct PostRow {
    id: i64,
    author_id: i64,
    group_id: Option<i64>,
    text: String,
    image: Option<String>,
    created_at: OffsetDateTime,
}

struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created_at: OffsetDateTime,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a post stamped with `created_at` instead of the current time,
    /// e.g. to seed posts that share a timestamp.
    pub async fn create_post_at(&self, new_post: NewPost, created_at: OffsetDateTime) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.username(new_post.author_id)?;
        if let Some(group_id) = new_post.group_id {
            tables.group_ref(group_id)?;
        }

        let row = PostRow {
            id: tables.next_id("posts"),
            author_id: new_post.author_id,
            group_id: new_post.group_id,
            text: new_post.text,
            image: new_post.image,
            created_at,
        };
        let post = tables.post(&row)?;
        tables.posts.push(row);
        Ok(post)
    }

    /// Number of stored follow edges from `follower_id` to `author_id`.
    pub async fn follow_edges(&self, follower_id: i64, author_id: i64) -> usize {
        self.tables
            .read()
            .await
            .follows
            .iter()
            .filter(|edge| edge.follower_id == follower_id && edge.author_id == author_id)
            .count()
    }
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn username(&self, user_id: i64) -> Result<String> {
        self.users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.username.clone())
            .ok_or_else(|| anyhow!("user {} does not exist", user_id))
    }

    fn group_ref(&self, group_id: i64) -> Result<GroupRef> {
        self.groups
            .iter()
            .find(|group| group.id == group_id)
            .map(GroupRef::from)
            .ok_or_else(|| anyhow!("group {} does not exist", group_id))
    }

    fn matches(&self, row: &PostRow, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => row.group_id == Some(group_id),
            PostFilter::Author(author_id) => row.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|edge| edge.follower_id == user_id && edge.author_id == row.author_id),
        }
    }

    fn post(&self, row: &PostRow) -> Result<Post> {
        let group = row.group_id.map(|id| self.group_ref(id)).transpose()?;
        Ok(Post {
            id: row.id,
            author_id: row.author_id,
            author_username: self.username(row.author_id)?,
            group,
            text: row.text.clone(),
            image: row.image.clone(),
            image_url: None,
            created_at: row.created_at,
        })
    }

    fn comment(&self, row: &CommentRow) -> Result<Comment> {
        Ok(Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_username: self.username(row.author_id)?,
            text: row.text.clone(),
            created_at: row.created_at,
        })
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.id == user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|user| user.username == new_user.username) {
            return Ok(None);
        }

        let user = User {
            id: tables.next_id("users"),
            username: new_user.username,
            full_name: new_user.full_name,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|group| group.slug == slug).cloned())
    }

    async fn create_group(&self, new_group: NewGroup) -> Result<Option<Group>> {
        let mut tables = self.tables.write().await;
        if tables.groups.iter().any(|group| group.slug == new_group.slug) {
            return Ok(None);
        }

        let group = Group {
            id: tables.next_id("groups"),
            slug: new_group.slug,
            title: new_group.title,
            description: new_group.description,
        };
        tables.groups.push(group.clone());
        Ok(Some(group))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .iter()
            .filter(|row| tables.matches(row, filter))
            .count();
        Ok(count as u64)
    }

    async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&PostRow> = tables
            .posts
            .iter()
            .filter(|row| tables.matches(row, filter))
            .collect();
        rows.sort_by_key(|row| Reverse((row.created_at, row.id)));

        rows.into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| tables.post(row))
            .collect()
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .find(|row| row.id == post_id)
            .map(|row| tables.post(row))
            .transpose()
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        self.create_post_at(new_post, OffsetDateTime::now_utc()).await
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        if let Some(group_id) = changes.group_id {
            tables.group_ref(group_id)?;
        }

        let Some(row) = tables.posts.iter_mut().find(|row| row.id == post_id) else {
            return Ok(None);
        };
        row.group_id = changes.group_id;
        row.text = changes.text;
        row.image = changes.image;

        tables
            .posts
            .iter()
            .find(|row| row.id == post_id)
            .map(|row| tables.post(row))
            .transpose()
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&CommentRow> = tables
            .comments
            .iter()
            .filter(|row| row.post_id == post_id)
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));

        rows.into_iter().map(|row| tables.comment(row)).collect()
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|row| row.id == new_comment.post_id) {
            return Err(anyhow!("post {} does not exist", new_comment.post_id));
        }
        tables.username(new_comment.author_id)?;

        let row = CommentRow {
            id: tables.next_id("comments"),
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            text: new_comment.text,
            created_at: OffsetDateTime::now_utc(),
        };
        let comment = tables.comment(&row)?;
        tables.comments.push(row);
        Ok(comment)
    }

    async fn is_following(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|edge| edge.follower_id == follower_id && edge.author_id == author_id))
    }

    async fn follow(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        if follower_id == author_id {
            return Ok(false);
        }

        let mut tables = self.tables.write().await;
        tables.username(follower_id)?;
        tables.username(author_id)?;
        if tables
            .follows
            .iter()
            .any(|edge| edge.follower_id == follower_id && edge.author_id == author_id)
        {
            return Ok(false);
        }

        tables.follows.push(Follow {
            follower_id,
            author_id,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(true)
    }

    async fn unfollow(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|edge| !(edge.follower_id == follower_id && edge.author_id == author_id));
        Ok(tables.follows.len() < before)
    }
}
