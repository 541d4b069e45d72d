use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use confcentral::data::{BooleanMessage, ConferenceForm, ConferenceForms, ConferenceQueryForms};
use confcentral::id::ConferenceKey;

use crate::auth::Caller;
use crate::handlers::{ApiError, ApiJson, ApiPath, ApiResult};

/// Handler to create a new conference organized by the caller
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiJson(form): ApiJson<ConferenceForm>,
) -> Result<(StatusCode, Json<ConferenceForm>), ApiError> {
    let conference = state.conferences.create(&caller, form).await?;
    Ok((StatusCode::CREATED, Json(conference)))
}

/// Handler to get a conference by websafe key
pub async fn get(
    State(state): State<Arc<crate::AppState>>,
    ApiPath(key): ApiPath<ConferenceKey>,
) -> ApiResult<ConferenceForm> {
    Ok(Json(state.conferences.get(&key).await?))
}

pub async fn update(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiPath(key): ApiPath<ConferenceKey>,
    ApiJson(form): ApiJson<ConferenceForm>,
) -> ApiResult<ConferenceForm> {
    Ok(Json(state.conferences.update(&caller, &key, form).await?))
}

pub async fn query(
    State(state): State<Arc<crate::AppState>>,
    ApiJson(forms): ApiJson<ConferenceQueryForms>,
) -> ApiResult<ConferenceForms> {
    Ok(Json(state.conferences.query(forms).await?))
}

pub async fn created(State(state): State<Arc<crate::AppState>>, caller: Caller) -> ApiResult<ConferenceForms> {
    Ok(Json(state.conferences.created_by(&caller).await?))
}

pub async fn attending(State(state): State<Arc<crate::AppState>>, caller: Caller) -> ApiResult<ConferenceForms> {
    Ok(Json(state.conferences.attending(&caller).await?))
}

#[tracing::instrument(skip(state, caller))]
pub async fn register(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiPath(key): ApiPath<ConferenceKey>,
) -> ApiResult<BooleanMessage> {
    Ok(Json(state.conferences.register(&caller, &key).await?))
}

#[tracing::instrument(skip(state, caller))]
pub async fn unregister(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiPath(key): ApiPath<ConferenceKey>,
) -> ApiResult<BooleanMessage> {
    Ok(Json(state.conferences.unregister(&caller, &key).await?))
}
