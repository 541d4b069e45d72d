use std::sync::Arc;

use axum::{Json, extract::State};

use confcentral::data::{ProfileForm, ProfileMiniForm};

use crate::auth::Caller;
use crate::handlers::{ApiJson, ApiResult};

/// Handler to get the caller's profile, creating it on first access
pub async fn get(State(state): State<Arc<crate::AppState>>, caller: Caller) -> ApiResult<ProfileForm> {
    Ok(Json(state.profiles.get_profile(&caller).await?))
}

/// Handler to update the caller's display name and shirt size
pub async fn save(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiJson(form): ApiJson<ProfileMiniForm>,
) -> ApiResult<ProfileForm> {
    Ok(Json(state.profiles.save_profile(&caller, form).await?))
}
