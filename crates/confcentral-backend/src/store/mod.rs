//! Entity storage behind the [`Datastore`] seam.
//!
//! Reads are snapshots. Every mutation of an existing record goes through a
//! transaction closure that receives owned copies of the records; the copies
//! are written back only when the closure succeeds, so a failed closure
//! leaves the store untouched.

pub mod memory;

pub use memory::InMemoryDatastore;

use async_trait::async_trait;

use confcentral::errors::ServiceError;
use confcentral::id::{ConferenceKey, ProfileId};
use confcentral::query::{ConferenceField, QueryPlan, SessionField};

use crate::models::{Conference, Profile, Session};

pub type ProfileTxn = Box<dyn FnOnce(&mut Profile) -> Result<(), ServiceError> + Send>;
pub type ConferenceTxn = Box<dyn FnOnce(&mut Conference) -> Result<(), ServiceError> + Send>;

/// Mutates a profile and one conference together. Returning `Ok(false)`
/// means nothing changed and nothing is written.
pub type RegistrationTxn =
    Box<dyn FnOnce(&mut Profile, &mut Conference) -> Result<bool, ServiceError> + Send>;

#[async_trait]
pub trait Datastore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn name(&self) -> &'static str;

    async fn get_profile(&self, id: &ProfileId) -> Result<Option<Profile>, ServiceError>;

    /// Returns the stored profile, storing `seed` first if there is none.
    async fn get_or_insert_profile(&self, seed: Profile) -> Result<Profile, ServiceError>;

    /// Runs `txn` against the stored profile.
    ///
    /// # Errors
    ///
    /// `NotFound` if the profile does not exist, or whatever `txn` returns.
    async fn update_profile(&self, id: &ProfileId, txn: ProfileTxn) -> Result<Profile, ServiceError>;

    async fn get_conference(&self, key: &ConferenceKey) -> Result<Option<Conference>, ServiceError>;

    /// Batch get in the order of `keys`; keys that do not resolve are skipped.
    async fn get_conferences(&self, keys: &[ConferenceKey]) -> Result<Vec<Conference>, ServiceError>;

    async fn put_conference(&self, conference: Conference) -> Result<(), ServiceError>;

    async fn update_conference(
        &self,
        key: &ConferenceKey,
        txn: ConferenceTxn,
    ) -> Result<Conference, ServiceError>;

    /// Runs `plan` over all conferences, or only over those organized by
    /// `organizer`.
    async fn query_conferences(
        &self,
        organizer: Option<&ProfileId>,
        plan: &QueryPlan<ConferenceField>,
    ) -> Result<Vec<Conference>, ServiceError>;

    async fn count_conferences(&self) -> Result<usize, ServiceError>;

    async fn put_session(&self, session: Session) -> Result<(), ServiceError>;

    /// Runs `plan` over all sessions, or only over those of `conference`.
    async fn query_sessions(
        &self,
        conference: Option<&ConferenceKey>,
        plan: &QueryPlan<SessionField>,
    ) -> Result<Vec<Session>, ServiceError>;

    /// Applies `txn` to a profile and a conference as one unit.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown conference (checked before the profile),
    /// `NotFound` for an unknown profile, or whatever `txn` returns.
    async fn update_registration(
        &self,
        profile: &ProfileId,
        conference: &ConferenceKey,
        txn: RegistrationTxn,
    ) -> Result<bool, ServiceError>;
}
