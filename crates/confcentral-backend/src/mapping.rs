//! Explicit field mapping between wire forms and stored records.
//!
//! Every form field is listed here by hand; adding a field to a form or a
//! record without mapping it is a compile error in the struct literals below.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use confcentral::data::{ConferenceForm, ProfileForm, ProfileMiniForm, SessionForm};
use confcentral::errors::ServiceError;
use confcentral::id::{ConferenceKey, ProfileId, SessionKey};
use confcentral::query::DATE_TIME_FORMAT;

use crate::models::{Conference, Profile, Session};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_CITY: &str = "Default City";
pub const DEFAULT_TOPICS: [&str; 2] = ["Default", "Topic"];

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn non_empty_list(value: &Option<Vec<String>>) -> Option<Vec<String>> {
    value.as_ref().filter(|items| !items.is_empty()).cloned()
}

/// Parses the `YYYY-MM-DD` prefix of a date string; blank input is no date.
pub fn parse_date_prefix(field: &str, raw: &str) -> Result<Option<NaiveDate>, ServiceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let prefix = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(prefix, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ServiceError::BadRequest(format!("Invalid {field} {raw:?}, expected YYYY-MM-DD")))
}

pub fn parse_date_time(raw: &str) -> Result<Option<NaiveDateTime>, ServiceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .map(Some)
        .map_err(|_| {
            ServiceError::BadRequest(format!("Invalid dateTime {raw:?}, expected YYYY-MM-DD HH:MM"))
        })
}

fn optional_date(field: &str, raw: &Option<String>) -> Result<Option<NaiveDate>, ServiceError> {
    match raw {
        Some(raw) => parse_date_prefix(field, raw),
        None => Ok(None),
    }
}

fn validate_max_attendees(max_attendees: i64) -> Result<i64, ServiceError> {
    if max_attendees < 0 {
        return Err(ServiceError::BadRequest(
            "'maxAttendees' must not be negative".to_string(),
        ));
    }
    Ok(max_attendees)
}

pub fn profile_to_form(profile: &Profile) -> ProfileForm {
    ProfileForm {
        display_name: profile.display_name.clone(),
        main_email: profile.main_email.clone(),
        tee_shirt_size: profile.tee_shirt_size,
        conference_keys_to_attend: profile.conference_keys_to_attend.clone(),
        session_keys_wishlist: profile.session_keys_wishlist.clone(),
    }
}

/// Applies the user-modifiable profile fields that carry a value.
pub fn apply_profile_form(profile: &mut Profile, form: &ProfileMiniForm) {
    if let Some(display_name) = non_empty(&form.display_name) {
        profile.display_name = display_name;
    }
    if let Some(size) = form.tee_shirt_size {
        profile.tee_shirt_size = size;
    }
}

/// Builds a new conference record, filling defaults for absent fields.
pub fn new_conference(
    key: ConferenceKey,
    organizer: ProfileId,
    form: &ConferenceForm,
) -> Result<Conference, ServiceError> {
    let name = non_empty(&form.name)
        .ok_or_else(|| ServiceError::BadRequest("Conference 'name' field required".to_string()))?;
    let start_date = optional_date("startDate", &form.start_date)?;
    let end_date = optional_date("endDate", &form.end_date)?;
    let max_attendees = validate_max_attendees(form.max_attendees.unwrap_or(0))?;

    Ok(Conference {
        key,
        organizer_user_id: organizer,
        name,
        description: non_empty(&form.description),
        topics: non_empty_list(&form.topics)
            .unwrap_or_else(|| DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()),
        city: non_empty(&form.city).unwrap_or_else(|| DEFAULT_CITY.to_string()),
        start_date,
        end_date,
        month: start_date.map_or(0, |date| date.month()),
        max_attendees,
        seats_available: max_attendees.max(0),
        featured_speakers: Vec::new(),
    })
}

/// The fields of a conference an organizer may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConferencePatch {
    name: Option<String>,
    description: Option<String>,
    topics: Option<Vec<String>>,
    city: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    max_attendees: Option<i64>,
}

impl ConferencePatch {
    pub fn from_form(form: &ConferenceForm) -> Result<Self, ServiceError> {
        Ok(Self {
            name: non_empty(&form.name),
            description: non_empty(&form.description),
            topics: non_empty_list(&form.topics),
            city: non_empty(&form.city),
            start_date: optional_date("startDate", &form.start_date)?,
            end_date: optional_date("endDate", &form.end_date)?,
            max_attendees: form.max_attendees.map(validate_max_attendees).transpose()?,
        })
    }

    pub fn apply(self, conference: &mut Conference) {
        if let Some(name) = self.name {
            conference.name = name;
        }
        if let Some(description) = self.description {
            conference.description = Some(description);
        }
        if let Some(topics) = self.topics {
            conference.topics = topics;
        }
        if let Some(city) = self.city {
            conference.city = city;
        }
        if let Some(start_date) = self.start_date {
            conference.start_date = Some(start_date);
            conference.month = start_date.month();
        }
        if let Some(end_date) = self.end_date {
            conference.end_date = Some(end_date);
        }
        if let Some(max_attendees) = self.max_attendees {
            // Seats already taken stay taken
            let delta = max_attendees - conference.max_attendees;
            conference.max_attendees = max_attendees;
            conference.seats_available = (conference.seats_available + delta).clamp(0, max_attendees);
        }
    }
}

pub fn conference_to_form(conference: &Conference, organizer_display_name: Option<&str>) -> ConferenceForm {
    ConferenceForm {
        name: Some(conference.name.clone()),
        description: conference.description.clone(),
        organizer_user_id: Some(conference.organizer_user_id.to_string()),
        topics: Some(conference.topics.clone()),
        city: Some(conference.city.clone()),
        start_date: conference.start_date.map(|date| date.format(DATE_FORMAT).to_string()),
        month: Some(conference.month),
        max_attendees: Some(conference.max_attendees),
        seats_available: Some(conference.seats_available),
        end_date: conference.end_date.map(|date| date.format(DATE_FORMAT).to_string()),
        websafe_key: Some(conference.key.clone()),
        organizer_display_name: organizer_display_name.map(str::to_string),
    }
}

/// Plain-text description of a conference for the confirmation mail.
pub fn conference_summary(conference: &Conference) -> String {
    let date = |date: Option<NaiveDate>| {
        date.map_or_else(|| "not set".to_string(), |d| d.format(DATE_FORMAT).to_string())
    };
    format!(
        "name: {}\ndescription: {}\ncity: {}\ntopics: {}\nstart date: {}\nend date: {}\nmax attendees: {}\nkey: {}",
        conference.name,
        conference.description.as_deref().unwrap_or(""),
        conference.city,
        conference.topics.join(", "),
        date(conference.start_date),
        date(conference.end_date),
        conference.max_attendees,
        conference.key,
    )
}

pub fn new_session(
    key: SessionKey,
    conference_key: ConferenceKey,
    form: &SessionForm,
) -> Result<Session, ServiceError> {
    let name = non_empty(&form.session_name)
        .ok_or_else(|| ServiceError::BadRequest("Session 'name' field required".to_string()))?;
    let date_time = match &form.date_time {
        Some(raw) => parse_date_time(raw)?,
        None => None,
    };

    Ok(Session {
        key,
        conference_key,
        name,
        highlights: non_empty(&form.highlights),
        speaker: non_empty(&form.speaker),
        duration: form.duration,
        type_of_session: non_empty(&form.type_of_session),
        date_time,
    })
}

pub fn session_to_form(session: &Session) -> SessionForm {
    SessionForm {
        session_name: Some(session.name.clone()),
        highlights: session.highlights.clone(),
        speaker: session.speaker.clone(),
        duration: session.duration,
        type_of_session: session.type_of_session.clone(),
        date_time: session
            .date_time
            .map(|date_time| date_time.format(DATE_TIME_FORMAT).to_string()),
        websafe_key: Some(session.key.clone()),
        websafe_conference_key: Some(session.conference_key.clone()),
    }
}
