use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::domain::engagement::{Comment, NewComment};
use crate::domain::group::{Group, GroupRef, NewGroup};
use crate::domain::post::{NewPost, Post, PostChanges, PostFilter};
use crate::domain::user::{NewUser, User};
use crate::infra::db::Db;
use crate::infra::store::Store;

const POST_COLUMNS: &str = "p.id, p.author_id, u.username AS author_username, \
     p.group_id, g.slug AS group_slug, g.title AS group_title, \
     p.text, p.image, p.created_at";

const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.author_id, u.username AS author_username, \
     c.text, c.created_at";

#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            query.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            query.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            query
                .push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE follower_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

fn post_from_row(row: &PgRow) -> Post {
    let group_id: Option<i64> = row.get("group_id");
    let group = group_id.map(|id| GroupRef {
        id,
        slug: row.get("group_slug"),
        title: row.get("group_title"),
    });

    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        group,
        text: row.get("text"),
        image: row.get("image"),
        image_url: None,
        created_at: row.get("created_at"),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        created_at: row.get("created_at"),
    }
}

fn group_from_row(row: &PgRow) -> Group {
    Group {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, full_name, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, full_name, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<Option<User>> {
        let row = sqlx::query(
            "INSERT INTO users (username, full_name) VALUES ($1, $2) \
             ON CONFLICT (username) DO NOTHING \
             RETURNING id, username, full_name, created_at",
        )
        .bind(new_user.username)
        .bind(new_user.full_name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let row = sqlx::query(
            "SELECT id, slug, title, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(group_from_row))
    }

    async fn create_group(&self, new_group: NewGroup) -> Result<Option<Group>> {
        let row = sqlx::query(
            "INSERT INTO post_groups (slug, title, description) VALUES ($1, $2, $3) \
             ON CONFLICT (slug) DO NOTHING \
             RETURNING id, slug, title, description",
        )
        .bind(new_group.slug)
        .bind(new_group.title)
        .bind(new_group.description)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(group_from_row))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut query, filter);

        let count: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<Post>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM posts p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN post_groups g ON g.id = p.group_id",
            POST_COLUMNS
        ));
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let rows = query.build().fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN post_groups g ON g.id = p.group_id \
             WHERE p.id = $1",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let row = sqlx::query(&format!(
            "WITH p AS ( \
                INSERT INTO posts (author_id, group_id, text, image) \
                VALUES ($1, $2, $3, $4) \
                RETURNING id, author_id, group_id, text, image, created_at \
             ) \
             SELECT {} FROM p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN post_groups g ON g.id = p.group_id",
            POST_COLUMNS
        ))
        .bind(new_post.author_id)
        .bind(new_post.group_id)
        .bind(new_post.text)
        .bind(new_post.image)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "WITH p AS ( \
                UPDATE posts SET group_id = $2, text = $3, image = $4 \
                WHERE id = $1 \
                RETURNING id, author_id, group_id, text, image, created_at \
             ) \
             SELECT {} FROM p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN post_groups g ON g.id = p.group_id",
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(changes.group_id)
        .bind(changes.text)
        .bind(changes.image)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at ASC, c.id ASC",
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let row = sqlx::query(&format!(
            "WITH c AS ( \
                INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3) \
                RETURNING id, post_id, author_id, text, created_at \
             ) \
             SELECT {} FROM c \
             JOIN users u ON u.id = c.author_id",
            COMMENT_COLUMNS
        ))
        .bind(new_comment.post_id)
        .bind(new_comment.author_id)
        .bind(new_comment.text)
        .fetch_one(self.db.pool())
        .await?;

        Ok(comment_from_row(&row))
    }

    async fn is_following(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND author_id = $2)",
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    async fn follow(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, author_id) \
             SELECT $1, $2 \
             WHERE $1 <> $2 \
             ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(author_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unfollow(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND author_id = $2")
            .bind(follower_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
