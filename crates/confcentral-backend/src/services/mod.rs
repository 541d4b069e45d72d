//! Backend services for profiles, conferences, sessions and announcements.
//!
//! Services are cheap to clone: each one only holds shared handles to the
//! collaborators behind the [`Datastore`](crate::store::Datastore),
//! [`Cache`](crate::cache::Cache), [`TaskQueue`](crate::tasks::TaskQueue)
//! and [`Mailer`](crate::mail::Mailer) seams.

pub mod announcements;
pub mod conferences;
pub mod dispatcher;
pub mod profiles;
pub mod sessions;

pub use announcements::AnnouncementService;
pub use conferences::ConferenceService;
pub use dispatcher::TaskDispatcher;
pub use profiles::ProfileService;
pub use sessions::SessionService;
