use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use confcentral::log;

use crate::AppState;
use crate::auth::{USER_EMAIL_HEADER, USER_ID_HEADER, USER_NICKNAME_HEADER};
use crate::handlers::{health, internal, v1};

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
            HeaderName::from_static(USER_NICKNAME_HEADER),
        ])
}

fn api_v1() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(v1::profile::get).post(v1::profile::save))
        .route("/conference", post(v1::conference::create))
        .route(
            "/conference/{key}",
            get(v1::conference::get).put(v1::conference::update),
        )
        .route(
            "/conference/{key}/registration",
            post(v1::conference::register).delete(v1::conference::unregister),
        )
        .route(
            "/conference/{key}/sessions",
            get(v1::session::list).post(v1::session::create),
        )
        .route("/conference/{key}/sessions/type/{type}", get(v1::session::by_type))
        .route("/conference/{key}/sessions/query", post(v1::session::query))
        .route(
            "/conference/{key}/featured-speakers",
            get(v1::session::featured_speakers),
        )
        .route("/conferences/query", post(v1::conference::query))
        .route("/conferences/created", get(v1::conference::created))
        .route("/conferences/attending", get(v1::conference::attending))
        .route("/sessions/speaker/{speaker}", get(v1::session::by_speaker))
        .route("/wishlist", get(v1::wishlist::list))
        .route(
            "/wishlist/{session_key}",
            post(v1::wishlist::add).delete(v1::wishlist::remove),
        )
        .route("/announcement", get(v1::announcement::featured_speaker))
        .route(
            "/announcement/nearly-sold-out",
            get(v1::announcement::nearly_sold_out),
        )
}

fn internal() -> Router<Arc<AppState>> {
    Router::new()
        .route("/crons/set_announcement", get(internal::set_announcement))
        .route(
            "/tasks/send_confirmation_email",
            post(internal::send_confirmation_email),
        )
        .route(
            "/tasks/set_speaker_announcement",
            post(internal::set_speaker_announcement),
        )
}

/// Setup the routes for the server and configure CORS
pub fn setup_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", api_v1())
        .merge(internal())
        .route("/health", get(health::get))
        .layer(cors(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
