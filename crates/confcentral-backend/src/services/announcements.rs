use std::sync::Arc;

use confcentral::data::StringMessage;
use confcentral::errors::ServiceError;
use confcentral::id::ConferenceKey;
use confcentral::log;
use confcentral::query::{ConferenceField, Operator, QueryPlan, SessionField, Value};

use crate::cache::{Cache, RECENT_ANNOUNCEMENTS_KEY, SPEAKER_ANNOUNCEMENTS_KEY};
use crate::models::Conference;
use crate::store::Datastore;

/// Conferences with at most this many seats left count as nearly sold out.
pub const NEARLY_SOLD_OUT_SEATS: i64 = 5;

/// Recomputes the cached announcement strings.
#[derive(Clone)]
pub struct AnnouncementService {
    store: Arc<dyn Datastore>,
    cache: Arc<dyn Cache>,
}

impl AnnouncementService {
    pub fn new(store: Arc<dyn Datastore>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    /// Rebuilds the nearly-sold-out announcement, clearing it when no
    /// conference qualifies. Returns the stored text.
    pub async fn refresh_nearly_sold_out(&self) -> Result<Option<String>, ServiceError> {
        let plan = QueryPlan::by_name()
            .with_range(ConferenceField::SeatsAvailable, Operator::Gt, Value::Integer(0))
            .with_range(
                ConferenceField::SeatsAvailable,
                Operator::LtEq,
                Value::Integer(NEARLY_SOLD_OUT_SEATS),
            );
        let conferences = self.store.query_conferences(None, &plan).await?;

        if conferences.is_empty() {
            self.cache.delete(RECENT_ANNOUNCEMENTS_KEY).await?;
            log::debug!("No conferences nearly sold out, announcement cleared");
            return Ok(None);
        }

        let names: Vec<&str> = conferences.iter().map(|c| c.name.as_str()).collect();
        let announcement = format!(
            "Last chance to attend! The following conferences are nearly sold out: {}",
            names.join(", ")
        );
        self.cache
            .set(RECENT_ANNOUNCEMENTS_KEY, announcement.clone())
            .await?;
        log::debug!("Announcement set: {announcement}");
        Ok(Some(announcement))
    }

    /// Features `speaker` at a conference once they hold more than one
    /// session there. Safe to run more than once for the same pair.
    pub async fn refresh_featured_speaker(
        &self,
        speaker: &str,
        conference_key: &ConferenceKey,
    ) -> Result<Option<String>, ServiceError> {
        let conference = self
            .store
            .get_conference(conference_key)
            .await?
            .ok_or_else(|| ServiceError::conference_not_found(conference_key))?;

        let plan = QueryPlan::by_name().with_eq(SessionField::Speaker, Value::Text(speaker.to_string()));
        let sessions = self.store.query_sessions(Some(conference_key), &plan).await?;
        if sessions.len() <= 1 {
            return Ok(None);
        }

        let featured = speaker.to_string();
        self.store
            .update_conference(
                conference_key,
                Box::new(move |conference: &mut Conference| -> Result<(), ServiceError> {
                    if !conference.featured_speakers.contains(&featured) {
                        conference.featured_speakers.push(featured);
                    }
                    Ok(())
                }),
            )
            .await?;

        let names: Vec<&str> = sessions.iter().map(|s| s.name.as_str()).collect();
        let announcement = format!(
            "{speaker} is speaker for the following sessions: {} at {} conference",
            names.join(", "),
            conference.name
        );
        self.cache
            .set(SPEAKER_ANNOUNCEMENTS_KEY, announcement.clone())
            .await?;
        log::info!("Featured speaker announcement set: {announcement}");
        Ok(Some(announcement))
    }

    async fn cached(&self, key: &str) -> Result<StringMessage, ServiceError> {
        let value = self.cache.get(key).await?;
        Ok(StringMessage::new(
            value.map(|text| text.as_str().to_string()).unwrap_or_default(),
        ))
    }

    pub async fn featured_speaker_announcement(&self) -> Result<StringMessage, ServiceError> {
        self.cached(SPEAKER_ANNOUNCEMENTS_KEY).await
    }

    pub async fn nearly_sold_out_announcement(&self) -> Result<StringMessage, ServiceError> {
        self.cached(RECENT_ANNOUNCEMENTS_KEY).await
    }
}
