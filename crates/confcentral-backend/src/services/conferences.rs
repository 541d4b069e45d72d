use std::collections::HashMap;
use std::sync::Arc;

use confcentral::data::{
    BooleanMessage, ConferenceForm, ConferenceForms, ConferenceQueryForms, ConfirmationEmailParams,
};
use confcentral::errors::ServiceError;
use confcentral::id::{ConferenceKey, ProfileId};
use confcentral::log;
use confcentral::query::{QueryPlan, compile};

use crate::auth::Caller;
use crate::mapping::{ConferencePatch, conference_summary, conference_to_form, new_conference};
use crate::models::{Conference, Profile};
use crate::services::ProfileService;
use crate::store::Datastore;
use crate::tasks::{Task, TaskQueue};

#[derive(Clone)]
pub struct ConferenceService {
    store: Arc<dyn Datastore>,
    profiles: ProfileService,
    queue: Arc<dyn TaskQueue>,
}

impl ConferenceService {
    pub fn new(store: Arc<dyn Datastore>, profiles: ProfileService, queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            store,
            profiles,
            queue,
        }
    }

    /// Creates a conference organized by the caller and queues the
    /// confirmation mail.
    pub async fn create(&self, caller: &Caller, form: ConferenceForm) -> Result<ConferenceForm, ServiceError> {
        let identity = caller.require()?;
        let profile = self.profiles.profile_for(identity).await?;

        let conference = new_conference(ConferenceKey::allocate(), profile.id.clone(), &form)?;
        self.store.put_conference(conference.clone()).await?;
        log::info!("Conference {} created by {}", conference.key, profile.id);

        if identity.email.is_empty() {
            log::info!("No email for {}, skipping confirmation mail", identity.user_id);
        } else {
            let task = Task::SendConfirmationEmail(ConfirmationEmailParams {
                email: identity.email.clone(),
                conference_info: conference_summary(&conference),
            });
            match self.queue.enqueue(task).await {
                Ok(handle) => log::debug!("Queued confirmation mail for {} as job {}", conference.key, handle.id()),
                Err(e) => log::warn!("Failed to queue confirmation mail for {}: {e}", conference.key),
            }
        }

        Ok(conference_to_form(&conference, Some(&profile.display_name)))
    }

    pub async fn update(
        &self,
        caller: &Caller,
        key: &ConferenceKey,
        form: ConferenceForm,
    ) -> Result<ConferenceForm, ServiceError> {
        let identity = caller.require()?;
        let user = identity.user_id.clone();

        let conference = self
            .store
            .update_conference(
                key,
                Box::new(move |conference: &mut Conference| -> Result<(), ServiceError> {
                    if !conference.is_organized_by(&user) {
                        return Err(ServiceError::Forbidden(
                            "Only the owner can update the conference.".to_string(),
                        ));
                    }
                    ConferencePatch::from_form(&form)?.apply(conference);
                    Ok(())
                }),
            )
            .await?;

        let profile = self.profiles.profile_for(identity).await?;
        Ok(conference_to_form(&conference, Some(&profile.display_name)))
    }

    pub async fn get(&self, key: &ConferenceKey) -> Result<ConferenceForm, ServiceError> {
        let conference = self
            .store
            .get_conference(key)
            .await?
            .ok_or_else(|| ServiceError::conference_not_found(key))?;
        let organizer = self.store.get_profile(&conference.organizer_user_id).await?;

        Ok(conference_to_form(
            &conference,
            organizer.as_ref().map(|profile| profile.display_name.as_str()),
        ))
    }

    pub async fn query(&self, forms: ConferenceQueryForms) -> Result<ConferenceForms, ServiceError> {
        let plan = compile(&forms.filters)?;
        let conferences = self.store.query_conferences(None, &plan).await?;
        self.with_organizer_names(conferences).await
    }

    pub async fn created_by(&self, caller: &Caller) -> Result<ConferenceForms, ServiceError> {
        let profile = self.profiles.profile_for(caller.require()?).await?;
        let conferences = self
            .store
            .query_conferences(Some(&profile.id), &QueryPlan::by_name())
            .await?;

        Ok(ConferenceForms {
            items: conferences
                .iter()
                .map(|conference| conference_to_form(conference, Some(&profile.display_name)))
                .collect(),
        })
    }

    pub async fn attending(&self, caller: &Caller) -> Result<ConferenceForms, ServiceError> {
        let profile = self.profiles.profile_for(caller.require()?).await?;
        let conferences = self
            .store
            .get_conferences(&profile.conference_keys_to_attend)
            .await?;
        self.with_organizer_names(conferences).await
    }

    pub async fn register(&self, caller: &Caller, key: &ConferenceKey) -> Result<BooleanMessage, ServiceError> {
        let identity = caller.require()?;
        self.profiles.profile_for(identity).await?;

        let registered = self
            .store
            .update_registration(
                &identity.user_id,
                key,
                Box::new(|profile: &mut Profile, conference: &mut Conference| -> Result<bool, ServiceError> {
                    if profile.is_attending(&conference.key) {
                        return Err(ServiceError::AlreadyRegistered);
                    }
                    conference.take_seat()?;
                    profile.conference_keys_to_attend.push(conference.key.clone());
                    Ok(true)
                }),
            )
            .await?;
        Ok(BooleanMessage { data: registered })
    }

    pub async fn unregister(&self, caller: &Caller, key: &ConferenceKey) -> Result<BooleanMessage, ServiceError> {
        let identity = caller.require()?;
        self.profiles.profile_for(identity).await?;

        let unregistered = self
            .store
            .update_registration(
                &identity.user_id,
                key,
                Box::new(|profile: &mut Profile, conference: &mut Conference| -> Result<bool, ServiceError> {
                    let Some(position) = profile
                        .conference_keys_to_attend
                        .iter()
                        .position(|attending| attending == &conference.key)
                    else {
                        return Ok(false);
                    };
                    profile.conference_keys_to_attend.remove(position);
                    conference.release_seat();
                    Ok(true)
                }),
            )
            .await?;
        Ok(BooleanMessage { data: unregistered })
    }

    async fn with_organizer_names(&self, conferences: Vec<Conference>) -> Result<ConferenceForms, ServiceError> {
        let mut names: HashMap<ProfileId, Option<String>> = HashMap::new();
        for conference in &conferences {
            if !names.contains_key(&conference.organizer_user_id) {
                let name = self
                    .store
                    .get_profile(&conference.organizer_user_id)
                    .await?
                    .map(|profile| profile.display_name);
                names.insert(conference.organizer_user_id.clone(), name);
            }
        }

        Ok(ConferenceForms {
            items: conferences
                .iter()
                .map(|conference| {
                    let name = names.get(&conference.organizer_user_id).and_then(Option::as_deref);
                    conference_to_form(conference, name)
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::services::testing::{Harness, caller};
    use crate::tasks::RecordingQueue;
    use confcentral::errors::FilterError;
    use confcentral::query::{ConferenceField, FilterForm, Operator};

    fn form(name: &str, city: &str, max_attendees: i64) -> ConferenceForm {
        ConferenceForm {
            name: Some(name.to_string()),
            city: Some(city.to_string()),
            max_attendees: Some(max_attendees),
            ..ConferenceForm::default()
        }
    }

    async fn create(harness: &Harness, organizer: &str, form: ConferenceForm) -> ConferenceKey {
        harness
            .conferences
            .create(&caller(organizer), form)
            .await
            .unwrap()
            .websafe_key
            .unwrap()
    }

    async fn seats(harness: &Harness, key: &ConferenceKey) -> i64 {
        harness.conferences.get(key).await.unwrap().seats_available.unwrap()
    }

    #[tokio::test]
    async fn create_queues_a_confirmation_mail() {
        let harness = Harness::new();
        let created = harness
            .conferences
            .create(&caller("org"), form("RustConf", "Portland", 100))
            .await
            .unwrap();
        assert_eq!(created.seats_available, Some(100));
        assert_eq!(created.organizer_display_name.as_deref(), Some("org"));
        assert_eq!(created.organizer_user_id.as_deref(), Some("org"));

        match harness.queue.tasks().as_slice() {
            [Task::SendConfirmationEmail(params)] => {
                assert_eq!(params.email, "org@example.com");
                assert!(params.conference_info.contains("RustConf"));
            }
            other => panic!("unexpected tasks: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_survives_a_closed_queue() {
        let harness = Harness::with_queue(RecordingQueue::closed());
        let created = harness
            .conferences
            .create(&caller("org"), form("RustConf", "Portland", 100))
            .await;
        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn create_requires_a_caller_and_a_name() {
        let harness = Harness::new();
        let err = harness
            .conferences
            .create(&Caller::default(), form("RustConf", "Portland", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));

        let err = harness
            .conferences
            .create(&caller("org"), ConferenceForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn only_the_organizer_may_update() {
        let harness = Harness::new();
        let key = create(&harness, "org", form("RustConf", "Portland", 10)).await;
        let patch = ConferenceForm {
            city: Some("Seattle".to_string()),
            ..ConferenceForm::default()
        };

        let err = harness
            .conferences
            .update(&caller("mallory"), &key, patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = harness
            .conferences
            .update(&caller("org"), &ConferenceKey::from("missing"), patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let updated = harness.conferences.update(&caller("org"), &key, patch).await.unwrap();
        assert_eq!(updated.city.as_deref(), Some("Seattle"));
        assert_eq!(updated.name.as_deref(), Some("RustConf"));
    }

    #[tokio::test]
    async fn update_checks_access_before_parsing_dates() {
        let harness = Harness::new();
        let key = create(&harness, "org", form("RustConf", "Portland", 10)).await;
        let bogus = ConferenceForm {
            start_date: Some("bogus".to_string()),
            ..ConferenceForm::default()
        };

        let err = harness
            .conferences
            .update(&caller("org"), &ConferenceKey::from("missing"), bogus.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = harness
            .conferences
            .update(&caller("mallory"), &key, bogus.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = harness
            .conferences
            .update(&caller("org"), &key, bogus)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
        assert_eq!(
            harness.conferences.get(&key).await.unwrap().start_date,
            None
        );
    }

    #[tokio::test]
    async fn create_skips_the_mail_without_an_email() {
        let harness = Harness::new();
        let anonymous_mail = Caller::from(Identity::new("org", "", "org"));
        let created = harness
            .conferences
            .create(&anonymous_mail, form("RustConf", "Portland", 100))
            .await
            .unwrap();
        assert_eq!(created.name.as_deref(), Some("RustConf"));
        assert!(harness.queue.tasks().is_empty());
    }

    #[tokio::test]
    async fn registration_moves_one_seat() {
        let harness = Harness::new();
        let key = create(&harness, "org", form("RustConf", "Portland", 2)).await;
        let attendee = caller("ferris");

        assert!(harness.conferences.register(&attendee, &key).await.unwrap().data);
        assert_eq!(seats(&harness, &key).await, 1);

        let err = harness.conferences.register(&attendee, &key).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyRegistered));
        assert_eq!(seats(&harness, &key).await, 1);

        let profile = harness.profiles.get_profile(&attendee).await.unwrap();
        assert_eq!(profile.conference_keys_to_attend, vec![key.clone()]);

        assert!(harness.conferences.unregister(&attendee, &key).await.unwrap().data);
        assert_eq!(seats(&harness, &key).await, 2);
        assert!(!harness.conferences.unregister(&attendee, &key).await.unwrap().data);
        assert_eq!(seats(&harness, &key).await, 2);
    }

    #[tokio::test]
    async fn registration_fails_without_seats() {
        let harness = Harness::new();
        let key = create(&harness, "org", form("Tiny", "Portland", 0)).await;

        let err = harness.conferences.register(&caller("ferris"), &key).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoSeatsAvailable));
        assert_eq!(seats(&harness, &key).await, 0);

        let err = harness
            .conferences
            .register(&caller("ferris"), &ConferenceKey::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_take_the_last_seat_once() {
        let harness = Harness::new();
        let key = create(&harness, "org", form("LastSeat", "Portland", 1)).await;

        let attempts: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|user| {
                let conferences = harness.conferences.clone();
                let key = key.clone();
                tokio::spawn(async move { conferences.register(&caller(user), &key).await })
            })
            .collect();

        let mut succeeded = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(message) if message.data => succeeded += 1,
                Ok(_) => panic!("registration reported no change"),
                Err(err) => assert!(matches!(err, ServiceError::NoSeatsAvailable)),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(seats(&harness, &key).await, 0);
    }

    #[tokio::test]
    async fn created_and_attending_lists() {
        let harness = Harness::new();
        let zeta = create(&harness, "org", form("Zeta", "Oslo", 5)).await;
        let alpha = create(&harness, "org", form("Alpha", "Oslo", 5)).await;
        create(&harness, "other", form("Beta", "Oslo", 5)).await;

        let created = harness.conferences.created_by(&caller("org")).await.unwrap();
        let names: Vec<_> = created.items.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        let attendee = caller("ferris");
        harness.conferences.register(&attendee, &zeta).await.unwrap();
        harness.conferences.register(&attendee, &alpha).await.unwrap();
        let attending = harness.conferences.attending(&attendee).await.unwrap();
        let names: Vec<_> = attending.items.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
        assert_eq!(attending.items[0].organizer_display_name.as_deref(), Some("org"));
    }

    #[tokio::test]
    async fn query_applies_filters_and_ordering() {
        let harness = Harness::new();
        create(&harness, "org", form("Gamma", "London", 50)).await;
        create(&harness, "org", form("Alpha", "London", 200)).await;
        create(&harness, "org", form("Beta", "London", 20)).await;
        create(&harness, "org", form("Delta", "Paris", 500)).await;

        let result = harness
            .conferences
            .query(ConferenceQueryForms {
                filters: vec![
                    FilterForm::new(ConferenceField::City, Operator::Eq, "London"),
                    FilterForm::new(ConferenceField::MaxAttendees, Operator::Gt, "10"),
                ],
            })
            .await
            .unwrap();
        let names: Vec<_> = result.items.iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["Beta", "Gamma", "Alpha"]);

        let err = harness
            .conferences
            .query(ConferenceQueryForms {
                filters: vec![
                    FilterForm::new(ConferenceField::Month, Operator::Gt, "3"),
                    FilterForm::new(ConferenceField::MaxAttendees, Operator::Lt, "100"),
                ],
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Filter(FilterError::MultipleInequalityFields { .. })
        ));
    }
}
