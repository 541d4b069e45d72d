//! Persisted entity records.

use chrono::{NaiveDate, NaiveDateTime};

use confcentral::data::TeeShirtSize;
use confcentral::errors::ServiceError;
use confcentral::id::{ConferenceKey, ProfileId, SessionKey};
use confcentral::query::{ConferenceField, FieldValue, Queryable, SessionField};

use crate::auth::Identity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub display_name: String,
    pub main_email: String,
    pub tee_shirt_size: TeeShirtSize,
    pub conference_keys_to_attend: Vec<ConferenceKey>,
    pub session_keys_wishlist: Vec<SessionKey>,
}

impl Profile {
    /// A fresh profile for a caller seen for the first time.
    pub fn new(identity: &Identity) -> Self {
        Self {
            id: identity.user_id.clone(),
            display_name: identity.nickname.clone(),
            main_email: identity.email.clone(),
            tee_shirt_size: TeeShirtSize::NotSpecified,
            conference_keys_to_attend: Vec::new(),
            session_keys_wishlist: Vec::new(),
        }
    }

    pub fn is_attending(&self, conference: &ConferenceKey) -> bool {
        self.conference_keys_to_attend.contains(conference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conference {
    pub key: ConferenceKey,
    /// Parent of the key; the organizer's profile id.
    pub organizer_user_id: ProfileId,
    pub name: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub city: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Month of `start_date`, 0 when there is none.
    pub month: u32,
    pub max_attendees: i64,
    pub seats_available: i64,
    pub featured_speakers: Vec<String>,
}

impl Conference {
    pub fn is_organized_by(&self, user: &ProfileId) -> bool {
        &self.organizer_user_id == user
    }

    pub fn take_seat(&mut self) -> Result<(), ServiceError> {
        if self.seats_available <= 0 {
            return Err(ServiceError::NoSeatsAvailable);
        }
        self.seats_available -= 1;
        Ok(())
    }

    pub fn release_seat(&mut self) {
        self.seats_available = (self.seats_available + 1).min(self.max_attendees);
    }
}

impl Queryable for Conference {
    type Field = ConferenceField;

    fn field_value(&self, field: ConferenceField) -> FieldValue<'_> {
        match field {
            ConferenceField::Name => FieldValue::Text(&self.name),
            ConferenceField::City => FieldValue::Text(&self.city),
            ConferenceField::Topics => FieldValue::List(&self.topics),
            ConferenceField::Month => FieldValue::Integer(i64::from(self.month)),
            ConferenceField::MaxAttendees => FieldValue::Integer(self.max_attendees),
            ConferenceField::SeatsAvailable => FieldValue::Integer(self.seats_available),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub key: SessionKey,
    /// Parent of the key.
    pub conference_key: ConferenceKey,
    pub name: String,
    pub highlights: Option<String>,
    pub speaker: Option<String>,
    pub duration: Option<i64>,
    pub type_of_session: Option<String>,
    pub date_time: Option<NaiveDateTime>,
}

fn optional_text(value: &Option<String>) -> FieldValue<'_> {
    value.as_deref().map_or(FieldValue::Missing, FieldValue::Text)
}

impl Queryable for Session {
    type Field = SessionField;

    fn field_value(&self, field: SessionField) -> FieldValue<'_> {
        match field {
            SessionField::Name => FieldValue::Text(&self.name),
            SessionField::Highlights => optional_text(&self.highlights),
            SessionField::Speaker => optional_text(&self.speaker),
            SessionField::Duration => self.duration.map_or(FieldValue::Missing, FieldValue::Integer),
            SessionField::TypeOfSession => optional_text(&self.type_of_session),
            SessionField::DateTime => self
                .date_time
                .map_or(FieldValue::Missing, FieldValue::DateTime),
        }
    }
}
