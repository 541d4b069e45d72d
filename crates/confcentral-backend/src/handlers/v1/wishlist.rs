use std::sync::Arc;

use axum::{Json, extract::State};

use confcentral::data::{ProfileForm, StringMessage};
use confcentral::id::SessionKey;

use crate::auth::Caller;
use crate::handlers::{ApiPath, ApiResult};

pub async fn list(State(state): State<Arc<crate::AppState>>, caller: Caller) -> ApiResult<StringMessage> {
    Ok(Json(state.profiles.wishlist(&caller).await?))
}

pub async fn add(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiPath(session_key): ApiPath<SessionKey>,
) -> ApiResult<ProfileForm> {
    Ok(Json(state.profiles.add_to_wishlist(&caller, session_key).await?))
}

pub async fn remove(
    State(state): State<Arc<crate::AppState>>,
    caller: Caller,
    ApiPath(session_key): ApiPath<SessionKey>,
) -> ApiResult<ProfileForm> {
    Ok(Json(state.profiles.remove_from_wishlist(&caller, session_key).await?))
}
