use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use confcentral::data::{SessionForm, SessionForms, SessionQueryForms, StringMessage};
use confcentral::id::ConferenceKey;

use crate::auth::Caller;
use crate::handlers::{ApiError, ApiJson, ApiPath, ApiResult};

/// Handler to add a session to a conference
#[tracing::instrument(skip(state, caller, form))]
pub async fn create(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiPath(key): ApiPath<ConferenceKey>,
    ApiJson(form): ApiJson<SessionForm>,
) -> Result<(StatusCode, Json<SessionForm>), ApiError> {
    let session = state.sessions.create(&caller, &key, form).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list(
    State(state): State<Arc<crate::AppState>>,
    ApiPath(key): ApiPath<ConferenceKey>,
) -> ApiResult<SessionForms> {
    Ok(Json(state.sessions.by_conference(&key, None).await?))
}

pub async fn by_type(
    State(state): State<Arc<crate::AppState>>,
    ApiPath((key, type_of_session)): ApiPath<(ConferenceKey, String)>,
) -> ApiResult<SessionForms> {
    Ok(Json(
        state.sessions.by_conference(&key, Some(&type_of_session)).await?,
    ))
}

pub async fn query(
    State(state): State<Arc<crate::AppState>>,
    ApiPath(key): ApiPath<ConferenceKey>,
    ApiJson(forms): ApiJson<SessionQueryForms>,
) -> ApiResult<SessionForms> {
    Ok(Json(state.sessions.query(&key, forms).await?))
}

pub async fn by_speaker(
    State(state): State<Arc<crate::AppState>>,
    ApiPath(speaker): ApiPath<String>,
) -> ApiResult<SessionForms> {
    Ok(Json(state.sessions.by_speaker(&speaker).await?))
}

pub async fn featured_speakers(
    State(state): State<Arc<crate::AppState>>,
    ApiPath(key): ApiPath<ConferenceKey>,
) -> ApiResult<StringMessage> {
    Ok(Json(state.sessions.featured_speakers(&key).await?))
}
