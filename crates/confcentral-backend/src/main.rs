use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;

use confcentral::errors::Report;
use confcentral::log;

mod auth;
mod cache;
mod config;
mod handlers;
mod mail;
mod mapping;
mod models;
mod routes;
mod services;
mod store;
mod tasks;

use crate::cache::InMemoryCache;
use crate::config::Config;
use crate::mail::LogMailer;
use crate::services::{AnnouncementService, ConferenceService, ProfileService, SessionService, TaskDispatcher};
use crate::store::{Datastore, InMemoryDatastore};
use crate::tasks::{InProcessTaskQueue, RetryPolicy, TaskWorker};

/// State shared by every handler.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Datastore>,
    pub profiles: ProfileService,
    pub conferences: ConferenceService,
    pub sessions: SessionService,
    pub announcements: AnnouncementService,
    pub dispatcher: TaskDispatcher,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wires every service to the in-process collaborators. The returned
    /// worker must be spawned for queued tasks to run.
    pub fn in_memory(config: Config) -> (Arc<Self>, TaskWorker) {
        let store: Arc<dyn Datastore> = Arc::new(InMemoryDatastore::new());
        let cache = Arc::new(InMemoryCache::new());
        let (queue, receiver) = InProcessTaskQueue::new();
        let queue = Arc::new(queue);

        let profiles = ProfileService::new(store.clone());
        let conferences = ConferenceService::new(store.clone(), profiles.clone(), queue.clone());
        let sessions = SessionService::new(store.clone(), queue);
        let announcements = AnnouncementService::new(store.clone(), cache);
        let dispatcher = TaskDispatcher::new(
            announcements.clone(),
            Arc::new(LogMailer),
            config.sender_address(),
        );

        let worker = TaskWorker::new(
            receiver,
            Arc::new(dispatcher.clone()),
            RetryPolicy::with_max_attempts(config.task_max_attempts),
            config.task_concurrency,
        );

        let state = Arc::new(Self {
            config,
            store,
            profiles,
            conferences,
            sessions,
            announcements,
            dispatcher,
            started_at: chrono::Utc::now(),
        });
        (state, worker)
    }
}

#[tokio::main]
async fn main() -> Result<(), Report> {
    // Setup logging
    confcentral::log::setup()?;

    let config = Config::load()?;
    let addr = SocketAddr::new(config.host, config.port);
    let (state, worker) = AppState::in_memory(config);

    // Background work
    worker.spawn();
    let (stop_tx, stop_rx) = watch::channel(false);
    let announcer = spawn_announcement_timer(state.clone(), stop_rx);

    // Setup the routes
    let app = routes::setup_routes(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Starting server on http://{}", listener.local_addr()?);
    log::info!("Press Ctrl+C to stop the server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Shutting down server");
    // The timer may already have exited
    let _ = stop_tx.send(true);
    if let Err(e) = announcer.await {
        log::warn!("Announcement timer ended abnormally: {e}");
    }

    Ok(())
}

/// Periodically recomputes the nearly-sold-out announcement until told to stop.
fn spawn_announcement_timer(
    state: Arc<AppState>,
    mut stop: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(state.config.announcement_interval);
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Err(e) = state.announcements.refresh_nearly_sold_out().await {
                        log::error!("Failed to refresh announcement: {e}");
                    }
                }
                _ = stop.changed() => break,
            }
        }
        log::debug!("Announcement timer stopped");
    })
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Signal received, starting graceful shutdown");
}
