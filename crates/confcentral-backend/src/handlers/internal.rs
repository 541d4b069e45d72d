//! Endpoints driven by the scheduler and by task delivery, not by clients.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode};

use confcentral::data::{ConfirmationEmailParams, SpeakerAnnouncementParams};

use crate::handlers::{ApiError, ApiForm};

/// Recomputes the nearly-sold-out announcement
pub async fn set_announcement(State(state): State<Arc<crate::AppState>>) -> Result<StatusCode, ApiError> {
    state.announcements.refresh_nearly_sold_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_confirmation_email(
    State(state): State<Arc<crate::AppState>>,
    ApiForm(params): ApiForm<ConfirmationEmailParams>,
) -> Result<StatusCode, ApiError> {
    state.dispatcher.send_confirmation_email(&params).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_speaker_announcement(
    State(state): State<Arc<crate::AppState>>,
    ApiForm(params): ApiForm<SpeakerAnnouncementParams>,
) -> Result<StatusCode, ApiError> {
    state.dispatcher.set_speaker_announcement(&params).await?;
    Ok(StatusCode::NO_CONTENT)
}
