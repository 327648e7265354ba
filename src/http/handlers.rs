use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::form_urlencoded::byte_serialize;

use crate::app::engagement::{CommentOutcome, EngagementService};
use crate::app::feed::FeedService;
use crate::app::groups::{GroupCreation, GroupService};
use crate::app::pagination::Page;
use crate::app::posts::{PostEdit, PostForm, PostService, PostSubmission};
use crate::app::social::SocialService;
use crate::app::users::{Provisioned, UserService};
use crate::domain::engagement::Comment;
use crate::domain::group::Group;
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::http::{AdminToken, AppError, Viewer};
use crate::AppState;

const INDEX_TITLE: &str = "Latest updates";
const FOLLOW_TITLE: &str = "Posts from authors you follow";

/// Raw query pairs. A repeated `page` resolves to its last value, so a page
/// lookup never fails on the query string.
#[derive(Deserialize, Default)]
#[serde(transparent)]
pub struct PageQuery(Vec<(String, String)>);

impl PageQuery {
    pub fn page(&self) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(name, _)| name == "page")
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub title: &'static str,
    pub page: Page<Post>,
}

#[derive(Serialize)]
pub struct GroupFeedResponse {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub author: User,
    pub count: u64,
    pub following: bool,
    pub page: Page<Post>,
}

#[derive(Serialize)]
pub struct PostDetailResponse {
    pub post: Post,
    pub author_post_count: u64,
    pub comments: Vec<Comment>,
}

#[derive(Deserialize, Default)]
pub struct PostRequest {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl From<PostRequest> for PostForm {
    fn from(request: PostRequest) -> Self {
        Self {
            text: request.text,
            group: request.group,
            image: request.image,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct CommentRequest {
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct ProvisionUserRequest {
    pub username: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Serialize)]
pub struct ProvisionUserResponse {
    pub user: User,
    pub access_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
}

fn profile_path(username: &str) -> String {
    let username: String = byte_serialize(username.as_bytes()).collect();
    format!("/profile/{}/", username)
}

fn post_path(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Non-numeric ids can never match a post, so they read as a missing page.
fn parse_post_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::not_found("post not found"))
}

fn feed_service(state: &AppState) -> FeedService {
    FeedService::new(state.store.clone(), state.media.clone(), state.page_size)
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(state.store.clone(), state.media.clone())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store.ping().await.is_ok();
    let cache = state.page_cache.ping().await.is_ok();
    let status = if store && cache { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

pub async fn not_found() -> AppError {
    AppError::not_found("page not found")
}

pub async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let target = uri
        .path_and_query()
        .map(|target| target.as_str())
        .unwrap_or("/");
    let key = state.page_cache.key("index", target);

    let service = feed_service(&state);
    let service = &service;
    let page = query.page();
    let body = state
        .page_cache
        .get_or_render(&key, move || async move {
            let page = service.global_feed(page).await?;
            let body = serde_json::to_vec(&FeedResponse {
                title: INDEX_TITLE,
                page,
            })?;
            Ok::<_, anyhow::Error>(Bytes::from(body))
        })
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to render index feed");
            AppError::internal("failed to load feed")
        })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

pub async fn group_posts(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<GroupFeedResponse>, AppError> {
    let feed = feed_service(&state)
        .group_feed(&slug, query.page())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, slug = %slug, "failed to load group feed");
            AppError::internal("failed to load group feed")
        })?
        .ok_or_else(|| AppError::not_found("group not found"))?;

    Ok(Json(GroupFeedResponse {
        group: feed.group,
        page: feed.page,
    }))
}

pub async fn profile(
    Path(username): Path<String>,
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let feed = feed_service(&state)
        .profile_feed(&username, viewer.user_id(), query.page())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to load profile");
            AppError::internal("failed to load profile")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Json(ProfileResponse {
        author: feed.author,
        count: feed.post_count,
        following: feed.following,
        page: feed.page,
    }))
}

pub async fn follow_index(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let user = viewer.authorized_only(&state.login_url)?;

    let page = feed_service(&state)
        .follow_feed(user.id, query.page())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = user.id, "failed to load follow feed");
            AppError::internal("failed to load follow feed")
        })?;

    Ok(Json(FeedResponse {
        title: FOLLOW_TITLE,
        page,
    }))
}

pub async fn post_detail(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PostDetailResponse>, AppError> {
    let post_id = parse_post_id(&id)?;

    let detail = post_service(&state)
        .detail(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to load post");
            AppError::internal("failed to load post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;

    Ok(Json(PostDetailResponse {
        post: detail.post,
        author_post_count: detail.author_post_count,
        comments: detail.comments,
    }))
}

pub async fn post_create(
    viewer: Viewer,
    State(state): State<AppState>,
    payload: Option<Json<PostRequest>>,
) -> Result<Redirect, AppError> {
    let user = viewer.authorized_only(&state.login_url)?;
    let form = payload.map(|Json(request)| request).unwrap_or_default();

    let submission = post_service(&state)
        .create(user.id, form.into())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id = user.id, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    match submission {
        PostSubmission::Saved(_) => Ok(Redirect::to(&profile_path(&user.username))),
        PostSubmission::Invalid(errors) => Err(AppError::validation(errors)),
    }
}

pub async fn post_edit(
    Path(id): Path<String>,
    viewer: Viewer,
    State(state): State<AppState>,
    payload: Option<Json<PostRequest>>,
) -> Result<Redirect, AppError> {
    let post_id = parse_post_id(&id)?;
    let form = payload.map(|Json(request)| request).unwrap_or_default();

    let outcome = post_service(&state)
        .edit(post_id, viewer.user_id(), form.into())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to edit post");
            AppError::internal("failed to edit post")
        })?;

    match outcome {
        PostEdit::Saved(_) => Ok(Redirect::to(&post_path(post_id))),
        PostEdit::Invalid(errors) => Err(AppError::validation(errors)),
        PostEdit::NotFound => Err(AppError::not_found("post not found")),
        PostEdit::NotAuthor => Err(AppError::redirect(post_path(post_id))),
    }
}

pub async fn add_comment(
    Path(id): Path<String>,
    viewer: Viewer,
    State(state): State<AppState>,
    payload: Option<Json<CommentRequest>>,
) -> Result<Redirect, AppError> {
    let user = viewer.authorized_only(&state.login_url)?;
    let post_id = parse_post_id(&id)?;
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let outcome = EngagementService::new(state.store.clone())
        .add_comment(user.id, post_id, request.text.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = user.id, post_id, "failed to comment");
            AppError::internal("failed to comment")
        })?;

    match outcome {
        CommentOutcome::Created(_) | CommentOutcome::Rejected => {
            Ok(Redirect::to(&post_path(post_id)))
        }
        CommentOutcome::PostNotFound => Err(AppError::not_found("post not found")),
    }
}

pub async fn profile_follow(
    Path(username): Path<String>,
    viewer: Viewer,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let user = viewer.authorized_only(&state.login_url)?;

    SocialService::new(state.store.clone())
        .follow(user.id, &username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, follower_id = user.id, username = %username, "failed to follow author");
            AppError::internal("failed to follow author")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Redirect::to(&profile_path(&username)))
}

pub async fn profile_unfollow(
    Path(username): Path<String>,
    viewer: Viewer,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let user = viewer.authorized_only(&state.login_url)?;

    SocialService::new(state.store.clone())
        .unfollow(user.id, &username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, follower_id = user.id, username = %username, "failed to unfollow author");
            AppError::internal("failed to unfollow author")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Redirect::to(&profile_path(&username)))
}

pub async fn clear_cache(
    _admin: AdminToken,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.page_cache.clear().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to clear page cache");
        AppError::internal("failed to clear cache")
    })?;

    tracing::info!("page cache cleared");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_group(
    _admin: AdminToken,
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    let creation = GroupService::new(state.store.clone())
        .create(
            payload.slug.as_deref(),
            payload.title.as_deref(),
            payload.description.as_deref(),
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to create group");
            AppError::internal("failed to create group")
        })?;

    match creation {
        GroupCreation::Created(group) => Ok((StatusCode::CREATED, Json(group))),
        GroupCreation::SlugTaken => Err(AppError::conflict("slug already in use")),
        GroupCreation::Invalid(errors) => Err(AppError::validation(errors)),
    }
}

pub async fn provision_user(
    _admin: AdminToken,
    State(state): State<AppState>,
    Json(payload): Json<ProvisionUserRequest>,
) -> Result<(StatusCode, Json<ProvisionUserResponse>), AppError> {
    let provisioned = UserService::new(state.store.clone())
        .provision(payload.username.as_deref(), payload.full_name.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to provision user");
            AppError::internal("failed to provision user")
        })?;

    let user = match provisioned {
        Provisioned::Created(user) => user,
        Provisioned::Taken => return Err(AppError::conflict("username already in use")),
        Provisioned::Invalid(errors) => return Err(AppError::validation(errors)),
    };

    let token = state.auth.issue_access_token(user.id).map_err(|err| {
        tracing::error!(error = ?err, user_id = user.id, "failed to issue access token");
        AppError::internal("failed to issue access token")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ProvisionUserResponse {
            user,
            access_token: token.token,
            access_expires_at: token.expires_at,
        }),
    ))
}
