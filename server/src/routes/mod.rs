// request handlers, grouped per resource

pub mod matches;
pub mod merges;
pub mod players;
pub mod rankings;
pub mod regions;
pub mod sessions;
pub mod tournaments;

use crate::{
    AppState,
    error::{ApiResult, bad_request},
};
use app_core::{CoreError, DbpRegion, Region, User};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

/// The session token carried by the request, if any.
pub(crate) fn session_token(state: &AppState, jar: &CookieJar) -> Option<String> {
    jar.get(&state.core.config.session_cookie)
        .map(|cookie| cookie.value().to_string())
}

/// Resolve the request's session to a user, or 403.
pub(crate) async fn require_user(state: &AppState, jar: &CookieJar) -> ApiResult<User> {
    let token = session_token(state, jar);
    Ok(state.core.require_user(token.as_deref()).await?)
}

/// Resolve the session and check admin rights for the region, or 403.
pub(crate) async fn require_region_admin(
    state: &AppState,
    jar: &CookieJar,
    region: &str,
) -> ApiResult<User> {
    let user = require_user(state, jar).await?;
    state.core.require_region_admin(&user, region)?;
    Ok(user)
}

/// Every region-scoped route 404s on unknown regions.
pub(crate) async fn require_region(state: &AppState, region_id: &str) -> ApiResult<Region> {
    state
        .core
        .database
        .get_region(region_id)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| CoreError::not_found(format!("region '{region_id}'")).into())
}

/// Opaque ids arrive as strings; malformed ones are a 400.
pub(crate) fn parse_id(raw: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|_| bad_request(format!("invalid id '{raw}'")))
}
