//! PUT / DELETE / GET /users/session: login, logout, whoami.

use crate::{
    AppState,
    error::ApiResult,
    routes::{require_user, session_token},
};
use app_core::CoreError;
use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Login. PUT rather than POST: harder to CSRF, not that CSRFing login
/// matters much.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> ApiResult<(CookieJar, Json<StatusResponse>)> {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        // same response as bad credentials
        return Err(CoreError::Unauthorized.into());
    };
    let token = state.core.login(&username, &password).await?;

    let cookie = Cookie::build((state.core.config.session_cookie.clone(), token))
        .path("/")
        .http_only(true)
        .build();
    Ok((jar.add(cookie), Json(StatusResponse { status: "connected" })))
}

/// Logout destroys the session on both sides: server record deleted,
/// client cookie expired.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<StatusResponse>)> {
    let Some(token) = session_token(&state, &jar) else {
        return Err(CoreError::Unauthorized.into());
    };
    state.core.logout(&token).await?;

    let expired = Cookie::build((state.core.config.session_cookie.clone(), ""))
        .path("/")
        .build();
    Ok((
        jar.remove(expired),
        Json(StatusResponse {
            status: "logout success",
        }),
    ))
}

#[derive(Serialize)]
pub struct WhoamiResponse {
    pub username: String,
    pub admin_regions: Vec<String>,
}

/// Whoami; salt and hashed password never leave the server.
pub async fn whoami(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Json<WhoamiResponse>> {
    let user = require_user(&state, &jar).await?;
    Ok(Json(WhoamiResponse {
        username: user.username,
        admin_regions: user.admin_regions.into_iter().collect(),
    }))
}
