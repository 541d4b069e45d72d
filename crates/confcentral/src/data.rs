//! Wire forms exchanged between Conference Central and its clients.
//!
//! Field names are camelCase on the wire. Request forms keep every field
//! optional so the same form serves creation and sparse updates.

use serde::{Deserialize, Serialize};

use crate::id::{ConferenceKey, SessionKey};
use crate::query::{ConferenceQueryForm, SessionQueryForm};

/// Shirt sizes a profile may record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeeShirtSize {
    #[default]
    NotSpecified,
    #[serde(rename = "XS_M")]
    XsM,
    #[serde(rename = "XS_W")]
    XsW,
    #[serde(rename = "S_M")]
    SM,
    #[serde(rename = "S_W")]
    SW,
    #[serde(rename = "M_M")]
    MM,
    #[serde(rename = "M_W")]
    MW,
    #[serde(rename = "L_M")]
    LM,
    #[serde(rename = "L_W")]
    LW,
    #[serde(rename = "XL_M")]
    XlM,
    #[serde(rename = "XL_W")]
    XlW,
    #[serde(rename = "XXL_M")]
    XxlM,
    #[serde(rename = "XXL_W")]
    XxlW,
    #[serde(rename = "XXXL_M")]
    XxxlM,
    #[serde(rename = "XXXL_W")]
    XxxlW,
}

/// Profile as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub display_name: String,
    pub main_email: String,
    pub tee_shirt_size: TeeShirtSize,
    pub conference_keys_to_attend: Vec<ConferenceKey>,
    pub session_keys_wishlist: Vec<SessionKey>,
}

/// The user-modifiable part of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMiniForm {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub tee_shirt_size: Option<TeeShirtSize>,
}

/// Conference request and response form.
///
/// Dates travel as `YYYY-MM-DD` strings; on input only the first ten
/// characters are read, so full timestamps are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub organizer_user_id: Option<String>,
    pub topics: Option<Vec<String>>,
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub month: Option<u32>,
    pub max_attendees: Option<i64>,
    pub seats_available: Option<i64>,
    pub end_date: Option<String>,
    pub websafe_key: Option<ConferenceKey>,
    pub organizer_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceForms {
    pub items: Vec<ConferenceForm>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceQueryForms {
    #[serde(default)]
    pub filters: Vec<ConferenceQueryForm>,
}

/// Session request and response form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionForm {
    pub session_name: Option<String>,
    pub highlights: Option<String>,
    pub speaker: Option<String>,
    /// Minutes.
    pub duration: Option<i64>,
    pub type_of_session: Option<String>,
    /// `YYYY-MM-DD HH:MM`.
    pub date_time: Option<String>,
    pub websafe_key: Option<SessionKey>,
    pub websafe_conference_key: Option<ConferenceKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionForms {
    pub items: Vec<SessionForm>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionQueryForms {
    #[serde(default)]
    pub filters: Vec<SessionQueryForm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanMessage {
    pub data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMessage {
    pub data: String,
}

impl StringMessage {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// Parameters of the confirmation-mail task endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationEmailParams {
    pub email: String,
    pub conference_info: String,
}

/// Parameters of the featured-speaker task endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerAnnouncementParams {
    pub speaker: String,
    pub websafe_conference_key: ConferenceKey,
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UptimeInfo {
    pub seconds: i64,
    pub human: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServiceInfo {
    pub datastore: String,
    pub conferences: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: String,
    pub started_at: String,
    pub uptime: UptimeInfo,
    pub services: ServiceInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_shirt_sizes_use_wire_codes() {
        assert_eq!(
            serde_json::to_string(&TeeShirtSize::NotSpecified).unwrap(),
            "\"NOT_SPECIFIED\""
        );
        assert_eq!(serde_json::to_string(&TeeShirtSize::XxlW).unwrap(), "\"XXL_W\"");
        let size: TeeShirtSize = serde_json::from_str("\"XS_M\"").unwrap();
        assert_eq!(size, TeeShirtSize::XsM);
    }

    #[test]
    fn conference_form_accepts_sparse_camel_case_input() {
        let form: ConferenceForm =
            serde_json::from_str(r#"{"name": "RustConf", "maxAttendees": 250}"#).unwrap();
        assert_eq!(form.name.as_deref(), Some("RustConf"));
        assert_eq!(form.max_attendees, Some(250));
        assert_eq!(form.city, None);
        assert_eq!(form.topics, None);
    }

    #[test]
    fn query_forms_default_to_no_filters() {
        let forms: ConferenceQueryForms = serde_json::from_str("{}").unwrap();
        assert!(forms.filters.is_empty());
    }
}
