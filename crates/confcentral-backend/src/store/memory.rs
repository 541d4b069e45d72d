use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use confcentral::errors::ServiceError;
use confcentral::id::{ConferenceKey, ProfileId, SessionKey};
use confcentral::query::{ConferenceField, QueryPlan, SessionField};

use super::{ConferenceTxn, Datastore, ProfileTxn, RegistrationTxn};
use crate::models::{Conference, Profile, Session};

/// An in-memory implementation of the [`Datastore`] trait.
///
/// Records live in `DashMap`s so reads never wait on writers. Transactions
/// additionally hold `write_lock`, which serializes them against each other
/// for the whole read-modify-write.
pub struct InMemoryDatastore {
    profiles: DashMap<ProfileId, Profile>,
    conferences: DashMap<ConferenceKey, Conference>,
    sessions: DashMap<SessionKey, Session>,
    write_lock: Mutex<()>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
            conferences: DashMap::new(),
            sessions: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    fn profile(&self, id: &ProfileId) -> Result<Profile, ServiceError> {
        self.profiles
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("No profile found for user: {id}")))
    }

    fn conference(&self, key: &ConferenceKey) -> Result<Conference, ServiceError> {
        self.conferences
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::conference_not_found(key))
    }
}

impl Default for InMemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn get_profile(&self, id: &ProfileId) -> Result<Option<Profile>, ServiceError> {
        Ok(self.profiles.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_or_insert_profile(&self, seed: Profile) -> Result<Profile, ServiceError> {
        Ok(self
            .profiles
            .entry(seed.id.clone())
            .or_insert(seed)
            .value()
            .clone())
    }

    async fn update_profile(&self, id: &ProfileId, txn: ProfileTxn) -> Result<Profile, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut profile = self.profile(id)?;
        txn(&mut profile)?;
        self.profiles.insert(id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get_conference(&self, key: &ConferenceKey) -> Result<Option<Conference>, ServiceError> {
        Ok(self.conferences.get(key).map(|entry| entry.value().clone()))
    }

    async fn get_conferences(&self, keys: &[ConferenceKey]) -> Result<Vec<Conference>, ServiceError> {
        Ok(keys
            .iter()
            .filter_map(|key| self.conferences.get(key).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn put_conference(&self, conference: Conference) -> Result<(), ServiceError> {
        self.conferences.insert(conference.key.clone(), conference);
        Ok(())
    }

    async fn update_conference(
        &self,
        key: &ConferenceKey,
        txn: ConferenceTxn,
    ) -> Result<Conference, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut conference = self.conference(key)?;
        txn(&mut conference)?;
        self.conferences.insert(key.clone(), conference.clone());
        Ok(conference)
    }

    async fn query_conferences(
        &self,
        organizer: Option<&ProfileId>,
        plan: &QueryPlan<ConferenceField>,
    ) -> Result<Vec<Conference>, ServiceError> {
        let candidates: Vec<Conference> = self
            .conferences
            .iter()
            .filter(|entry| organizer.is_none_or(|id| entry.is_organized_by(id)))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(plan.execute(candidates))
    }

    async fn count_conferences(&self) -> Result<usize, ServiceError> {
        Ok(self.conferences.len())
    }

    async fn put_session(&self, session: Session) -> Result<(), ServiceError> {
        self.sessions.insert(session.key.clone(), session);
        Ok(())
    }

    async fn query_sessions(
        &self,
        conference: Option<&ConferenceKey>,
        plan: &QueryPlan<SessionField>,
    ) -> Result<Vec<Session>, ServiceError> {
        let candidates: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| conference.is_none_or(|key| &entry.conference_key == key))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(plan.execute(candidates))
    }

    async fn update_registration(
        &self,
        profile: &ProfileId,
        conference: &ConferenceKey,
        txn: RegistrationTxn,
    ) -> Result<bool, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut conference_record = self.conference(conference)?;
        let mut profile_record = self.profile(profile)?;

        let changed = txn(&mut profile_record, &mut conference_record)?;
        if changed {
            self.conferences.insert(conference.clone(), conference_record);
            self.profiles.insert(profile.clone(), profile_record);
        }
        Ok(changed)
    }
}
