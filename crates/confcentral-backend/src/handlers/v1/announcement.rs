use std::sync::Arc;

use axum::{Json, extract::State};

use confcentral::data::StringMessage;

use crate::handlers::ApiResult;

/// Handler for the featured-speaker announcement; empty when none is cached
pub async fn featured_speaker(State(state): State<Arc<crate::AppState>>) -> ApiResult<StringMessage> {
    Ok(Json(state.announcements.featured_speaker_announcement().await?))
}

pub async fn nearly_sold_out(State(state): State<Arc<crate::AppState>>) -> ApiResult<StringMessage> {
    Ok(Json(state.announcements.nearly_sold_out_announcement().await?))
}
