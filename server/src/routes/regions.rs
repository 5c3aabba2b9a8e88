//! GET /regions

use crate::{AppState, dto::RegionDto, error::ApiResult};
use app_core::{CoreError, DbpRegion};
use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Serialize)]
pub struct RegionsResponse {
    pub regions: Vec<RegionDto>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<RegionsResponse>> {
    let regions = state
        .core
        .database
        .get_all_regions()
        .await
        .map_err(CoreError::from)?;
    Ok(Json(RegionsResponse {
        regions: regions.iter().map(RegionDto::from).collect(),
    }))
}
