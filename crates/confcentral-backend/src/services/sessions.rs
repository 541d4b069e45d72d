use std::sync::Arc;

use confcentral::data::{SessionForm, SessionForms, SessionQueryForms, SpeakerAnnouncementParams, StringMessage};
use confcentral::errors::ServiceError;
use confcentral::id::{ConferenceKey, SessionKey};
use confcentral::log;
use confcentral::query::{QueryPlan, SessionField, Value, compile};

use crate::auth::Caller;
use crate::mapping::{new_session, session_to_form};
use crate::models::{Conference, Session};
use crate::store::Datastore;
use crate::tasks::{Task, TaskQueue};

pub const NO_FEATURED_SPEAKERS: &str = "No featured speakers for this conference.";

fn to_forms(sessions: &[Session]) -> SessionForms {
    SessionForms {
        items: sessions.iter().map(session_to_form).collect(),
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn Datastore>,
    queue: Arc<dyn TaskQueue>,
}

impl SessionService {
    pub fn new(store: Arc<dyn Datastore>, queue: Arc<dyn TaskQueue>) -> Self {
        Self { store, queue }
    }

    async fn conference(&self, key: &ConferenceKey) -> Result<Conference, ServiceError> {
        self.store
            .get_conference(key)
            .await?
            .ok_or_else(|| ServiceError::conference_not_found(key))
    }

    /// Adds a session to a conference the caller organizes. A session with a
    /// speaker queues a featured-speaker check.
    pub async fn create(
        &self,
        caller: &Caller,
        conference_key: &ConferenceKey,
        form: SessionForm,
    ) -> Result<SessionForm, ServiceError> {
        let identity = caller.require()?;
        let conference = self.conference(conference_key).await?;
        if !conference.is_organized_by(&identity.user_id) {
            return Err(ServiceError::Forbidden(
                "Only the owner can add a session to the conference.".to_string(),
            ));
        }

        let session = new_session(SessionKey::allocate(), conference.key.clone(), &form)?;
        self.store.put_session(session.clone()).await?;
        log::info!("Session {} added to conference {}", session.key, conference.key);

        if let Some(speaker) = &session.speaker {
            let task = Task::SetSpeakerAnnouncement(SpeakerAnnouncementParams {
                speaker: speaker.clone(),
                websafe_conference_key: conference.key.clone(),
            });
            match self.queue.enqueue(task).await {
                Ok(handle) => log::debug!("Queued speaker announcement for {} as job {}", session.key, handle.id()),
                Err(e) => log::warn!("Failed to queue speaker announcement for {}: {e}", session.key),
            }
        }

        Ok(session_to_form(&session))
    }

    /// Sessions of a conference by name, optionally of one type only.
    pub async fn by_conference(
        &self,
        conference_key: &ConferenceKey,
        type_of_session: Option<&str>,
    ) -> Result<SessionForms, ServiceError> {
        self.conference(conference_key).await?;

        let mut plan = QueryPlan::by_name();
        if let Some(kind) = type_of_session {
            plan = plan.with_eq(SessionField::TypeOfSession, Value::Text(kind.to_string()));
        }
        let sessions = self.store.query_sessions(Some(conference_key), &plan).await?;
        Ok(to_forms(&sessions))
    }

    pub async fn by_speaker(&self, speaker: &str) -> Result<SessionForms, ServiceError> {
        let plan = QueryPlan::by_name().with_eq(SessionField::Speaker, Value::Text(speaker.to_string()));
        let sessions = self.store.query_sessions(None, &plan).await?;
        Ok(to_forms(&sessions))
    }

    pub async fn query(
        &self,
        conference_key: &ConferenceKey,
        forms: SessionQueryForms,
    ) -> Result<SessionForms, ServiceError> {
        let plan = compile(&forms.filters)?;
        self.conference(conference_key).await?;

        let sessions = self.store.query_sessions(Some(conference_key), &plan).await?;
        Ok(to_forms(&sessions))
    }

    pub async fn featured_speakers(&self, conference_key: &ConferenceKey) -> Result<StringMessage, ServiceError> {
        let conference = self.conference(conference_key).await?;
        if conference.featured_speakers.is_empty() {
            return Ok(StringMessage::new(NO_FEATURED_SPEAKERS));
        }
        Ok(StringMessage::new(conference.featured_speakers.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Harness, caller};
    use confcentral::data::ConferenceForm;
    use confcentral::query::{FilterForm, Operator};

    async fn conference(harness: &Harness, name: &str) -> ConferenceKey {
        harness
            .conferences
            .create(
                &caller("org"),
                ConferenceForm {
                    name: Some(name.to_string()),
                    ..ConferenceForm::default()
                },
            )
            .await
            .unwrap()
            .websafe_key
            .unwrap()
    }

    fn session(name: &str, speaker: Option<&str>, kind: &str, duration: i64) -> SessionForm {
        SessionForm {
            session_name: Some(name.to_string()),
            speaker: speaker.map(str::to_string),
            type_of_session: Some(kind.to_string()),
            duration: Some(duration),
            date_time: Some("2025-06-14 10:00".to_string()),
            ..SessionForm::default()
        }
    }

    fn names(forms: &SessionForms) -> Vec<&str> {
        forms.items.iter().filter_map(|s| s.session_name.as_deref()).collect()
    }

    #[tokio::test]
    async fn create_checks_ownership_and_queues_speaker_tasks() {
        let harness = Harness::new();
        let key = conference(&harness, "RustConf").await;

        let err = harness
            .sessions
            .create(&caller("mallory"), &key, session("Intro", None, "talk", 30))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = harness
            .sessions
            .create(&caller("org"), &ConferenceKey::from("missing"), session("Intro", None, "talk", 30))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        harness
            .sessions
            .create(&caller("org"), &key, session("Intro", None, "talk", 30))
            .await
            .unwrap();
        let created = harness
            .sessions
            .create(&caller("org"), &key, session("Async", Some("Ferris"), "talk", 45))
            .await
            .unwrap();
        assert_eq!(created.websafe_conference_key.as_ref(), Some(&key));
        assert_eq!(created.date_time.as_deref(), Some("2025-06-14 10:00"));

        let speaker_tasks: Vec<Task> = harness
            .queue
            .tasks()
            .into_iter()
            .filter(|task| matches!(task, Task::SetSpeakerAnnouncement(_)))
            .collect();
        assert_eq!(
            speaker_tasks,
            vec![Task::SetSpeakerAnnouncement(SpeakerAnnouncementParams {
                speaker: "Ferris".to_string(),
                websafe_conference_key: key,
            })]
        );
    }

    #[tokio::test]
    async fn sessions_are_listed_by_conference_type_and_speaker() {
        let harness = Harness::new();
        let rustconf = conference(&harness, "RustConf").await;
        let euro = conference(&harness, "EuroRust").await;
        let org = caller("org");

        for (key, form) in [
            (&rustconf, session("Workshop B", Some("Ferris"), "workshop", 120)),
            (&rustconf, session("Keynote", Some("Corro"), "talk", 60)),
            (&rustconf, session("Workshop A", None, "workshop", 90)),
            (&euro, session("Closing", Some("Ferris"), "talk", 30)),
        ] {
            harness.sessions.create(&org, key, form).await.unwrap();
        }

        let all = harness.sessions.by_conference(&rustconf, None).await.unwrap();
        assert_eq!(names(&all), vec!["Keynote", "Workshop A", "Workshop B"]);

        let workshops = harness
            .sessions
            .by_conference(&rustconf, Some("workshop"))
            .await
            .unwrap();
        assert_eq!(names(&workshops), vec!["Workshop A", "Workshop B"]);

        let ferris = harness.sessions.by_speaker("Ferris").await.unwrap();
        assert_eq!(names(&ferris), vec!["Closing", "Workshop B"]);

        let err = harness
            .sessions
            .by_conference(&ConferenceKey::from("missing"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn query_is_scoped_to_the_conference() {
        let harness = Harness::new();
        let rustconf = conference(&harness, "RustConf").await;
        let euro = conference(&harness, "EuroRust").await;
        let org = caller("org");

        harness.sessions.create(&org, &rustconf, session("Long", None, "talk", 90)).await.unwrap();
        harness.sessions.create(&org, &rustconf, session("Short", None, "talk", 20)).await.unwrap();
        harness.sessions.create(&org, &euro, session("Other", None, "talk", 90)).await.unwrap();

        let result = harness
            .sessions
            .query(
                &rustconf,
                SessionQueryForms {
                    filters: vec![FilterForm::new(SessionField::Duration, Operator::GtEq, "60")],
                },
            )
            .await
            .unwrap();
        assert_eq!(names(&result), vec!["Long"]);
    }

    #[tokio::test]
    async fn featured_speakers_default_message() {
        let harness = Harness::new();
        let key = conference(&harness, "RustConf").await;
        let message = harness.sessions.featured_speakers(&key).await.unwrap();
        assert_eq!(message.data, NO_FEATURED_SPEAKERS);
    }
}
