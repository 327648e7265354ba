#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

use chronicle::config::AppConfig;
use chronicle::domain::group::{Group, NewGroup};
use chronicle::domain::post::{NewPost, Post};
use chronicle::domain::user::{NewUser, User};
use chronicle::infra::cache::MemoryCache;
use chronicle::infra::memory::MemoryStore;
use chronicle::infra::store::Store;
use chronicle::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Test-only key, never used outside this harness.
const TEST_PASETO_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token-12345";
pub const TEST_LOGIN_URL: &str = "/auth/login/";
pub const PAGE_SIZE: usize = 10;
pub const INDEX_CACHE_TTL_SECONDS: u64 = 20;

// ---------------------------------------------------------------------------
// TestApp: a fresh in-memory application per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn body(&self) -> &[u8] {
        &self.body_bytes
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }

    /// Text of every post on the rendered page, in page order.
    pub fn post_texts(&self) -> Vec<String> {
        self.json()["page"]["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| item["text"].as_str().unwrap_or("").to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct TestUser {
    pub user: User,
    pub access_token: String,
}

impl TestUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn token(&self) -> Option<&str> {
        Some(&self.access_token)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        http_addr: "127.0.0.1:0".into(),
        database_url: None,
        redis_url: None,
        db_max_connections: 5,
        db_connect_timeout_seconds: 5,
        db_idle_timeout_seconds: 0,
        db_max_lifetime_seconds: 1800,
        page_size: PAGE_SIZE,
        index_cache_ttl_seconds: INDEX_CACHE_TTL_SECONDS,
        cache_key_prefix: "chronicle-test:page:".into(),
        login_url: TEST_LOGIN_URL.into(),
        media_base_url: Url::parse("http://media.test/uploads/").unwrap(),
        admin_token: Some(TEST_ADMIN_TOKEN.into()),
        paseto_access_key: TEST_PASETO_ACCESS_KEY,
        access_ttl_minutes: 60,
    }
}

pub fn app() -> TestApp {
    TestApp::with_config(test_config())
}

impl TestApp {
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let state = AppState::with_backends(&config, store.clone(), cache.clone());
        let router = chronicle::http::router(state.clone());

        TestApp {
            router,
            state,
            store,
            cache,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            location,
            body_bytes,
        }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    pub async fn post_empty(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, None, &headers).await
    }

    /// POST with an admin token in the x-admin-token header.
    pub async fn post_admin(
        &self,
        path: &str,
        body: Value,
        admin_token: Option<&str>,
    ) -> TestResponse {
        let mut headers = vec![];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Insert a user directly into the store and issue an access token.
    pub async fn create_user(&self, username: &str) -> TestUser {
        let user = self
            .state
            .store
            .create_user(NewUser {
                username: username.to_string(),
                full_name: format!("Test User {}", username),
            })
            .await
            .expect("insert test user failed")
            .expect("username already taken");

        let token = self
            .state
            .auth
            .issue_access_token(user.id)
            .expect("failed to issue access token");

        TestUser {
            user,
            access_token: token.token,
        }
    }

    pub async fn create_group(&self, slug: &str) -> Group {
        self.state
            .store
            .create_group(NewGroup {
                slug: slug.to_string(),
                title: format!("Group {}", slug),
                description: String::new(),
            })
            .await
            .expect("insert test group failed")
            .expect("slug already taken")
    }

    pub async fn create_post(&self, author: &TestUser, text: &str, group: Option<&Group>) -> Post {
        self.state
            .store
            .create_post(NewPost {
                author_id: author.id(),
                group_id: group.map(|group| group.id),
                text: text.to_string(),
                image: None,
            })
            .await
            .expect("insert test post failed")
    }

    /// Create `count` posts named "post 1" through "post {count}", oldest first.
    pub async fn create_posts(&self, author: &TestUser, count: usize, group: Option<&Group>) -> Vec<Post> {
        let mut posts = Vec::with_capacity(count);
        for n in 1..=count {
            posts.push(self.create_post(author, &format!("post {}", n), group).await);
        }
        posts
    }
}
