use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderName;
use subtle::ConstantTimeEq;

use crate::app::users::UserService;
use crate::domain::user::User;
use crate::http::AppError;
use crate::AppState;

/// The requester behind a request: a known user or anonymous.
///
/// Extraction never rejects a request for lacking identity. Views that need
/// one call [`Viewer::authorized_only`] first.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub user: Option<User>,
}

#[derive(Debug, Clone)]
pub struct AdminToken;

const ADMIN_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-admin-token");

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id)
    }

    /// Gate for views that require a signed-in requester. Anonymous
    /// requesters are redirected to `login_url`.
    pub fn authorized_only(&self, login_url: &str) -> Result<&User, AppError> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::redirect(login_url))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        let Some(token) = token else {
            return Ok(Viewer::anonymous());
        };

        let session = state
            .auth
            .authenticate_access_token(token.trim())
            .map_err(|err| {
                tracing::warn!(error = ?err, "rejected access token");
                err
            })
            .ok()
            .flatten();
        let Some(session) = session else {
            return Ok(Viewer::anonymous());
        };

        let user = UserService::new(state.store.clone())
            .get_user(session.user_id)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = session.user_id, "failed to load requester");
                AppError::internal("failed to authenticate")
            })?;

        Ok(Viewer { user })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .admin_token
            .as_ref()
            .ok_or_else(|| AppError::forbidden("admin token not configured"))?;

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::forbidden("missing admin token"))?;

        if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(AppError::forbidden("invalid admin token"));
        }

        Ok(AdminToken)
    }
}
