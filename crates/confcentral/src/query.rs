//! Translation of client-supplied filter forms into ordered query plans.
//!
//! A client sends a list of `(field, operator, value)` triples. Fields and
//! operators are parsed into enums through a per-entity allow-list when the
//! form is deserialized, so [`compile`] only has to coerce values and enforce
//! the datastore rule that at most one field may carry an inequality.
//!
//! ```
//! use confcentral::query::{compile, ConferenceField, FilterForm, Operator};
//!
//! let filters = vec![
//!     FilterForm::new(ConferenceField::City, Operator::Eq, "London"),
//!     FilterForm::new(ConferenceField::MaxAttendees, Operator::Gt, "10"),
//! ];
//! let plan = compile(&filters).unwrap();
//! assert_eq!(plan.order(), &[ConferenceField::MaxAttendees, ConferenceField::Name]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::FilterError;

/// Wire format of session date-times, also accepted by `DATE_TIME` filters.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Comparison operators a filter may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Operator {
    Eq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Ne,
}

impl Operator {
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Gt => "GT",
            Operator::GtEq => "GTEQ",
            Operator::Lt => "LT",
            Operator::LtEq => "LTEQ",
            Operator::Ne => "NE",
        }
    }

    /// Every operator except equality is an inequality.
    pub fn is_inequality(self) -> bool {
        self != Operator::Eq
    }

    /// Whether `record <op> value` holds given `record.cmp(value)`.
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::GtEq => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::LtEq => ordering != Ordering::Greater,
            Operator::Ne => ordering != Ordering::Equal,
        }
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "EQ" => Ok(Operator::Eq),
            "GT" => Ok(Operator::Gt),
            "GTEQ" => Ok(Operator::GtEq),
            "LT" => Ok(Operator::Lt),
            "LTEQ" => Ok(Operator::LtEq),
            "NE" => Ok(Operator::Ne),
            other => Err(FilterError::InvalidOperator(other.to_string())),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = FilterError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<Operator> for &'static str {
    fn from(operator: Operator) -> Self {
        operator.token()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// How a filter value string is coerced before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    DateTime,
}

/// A coerced filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    DateTime(NaiveDateTime),
}

/// The value a stored record holds for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    DateTime(NaiveDateTime),
    /// Repeated property; a predicate matches when any element does.
    List(&'a [String]),
    Missing,
}

impl FieldValue<'_> {
    fn compare(&self, value: &Value) -> Option<Ordering> {
        match (self, value) {
            (FieldValue::Text(a), Value::Text(b)) => Some((*a).cmp(b.as_str())),
            (FieldValue::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Integer(_) => 0,
            FieldValue::DateTime(_) => 1,
            FieldValue::Text(_) | FieldValue::List(_) => 2,
            FieldValue::Missing => 3,
        }
    }

    fn sort_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            // Ascending sorts on a repeated property use its smallest element
            FieldValue::List(items) => items.iter().min().map(String::as_str),
            _ => None,
        }
    }

    fn sort_cmp(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            _ => match (self.sort_text(), other.sort_text()) {
                (Some(a), Some(b)) => a.cmp(b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

/// A queryable property of one entity type.
pub trait Field: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The canonical name field used as the final sort key.
    const NAME: Self;

    /// Property name as stored, used in error messages.
    fn property(self) -> &'static str;

    fn kind(self) -> ValueKind;
}

/// Records the query plans can run against.
pub trait Queryable {
    type Field: Field;

    fn field_value(&self, field: Self::Field) -> FieldValue<'_>;
}

/// Conference properties. Only some of them are on the client allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ConferenceField {
    Name,
    City,
    Topics,
    Month,
    MaxAttendees,
    SeatsAvailable,
}

impl ConferenceField {
    pub fn token(self) -> &'static str {
        match self {
            ConferenceField::Name => "NAME",
            ConferenceField::City => "CITY",
            ConferenceField::Topics => "TOPIC",
            ConferenceField::Month => "MONTH",
            ConferenceField::MaxAttendees => "MAX_ATTENDEES",
            ConferenceField::SeatsAvailable => "SEATS_AVAILABLE",
        }
    }
}

impl Field for ConferenceField {
    const NAME: Self = ConferenceField::Name;

    fn property(self) -> &'static str {
        match self {
            ConferenceField::Name => "name",
            ConferenceField::City => "city",
            ConferenceField::Topics => "topics",
            ConferenceField::Month => "month",
            ConferenceField::MaxAttendees => "maxAttendees",
            ConferenceField::SeatsAvailable => "seatsAvailable",
        }
    }

    fn kind(self) -> ValueKind {
        match self {
            ConferenceField::Name | ConferenceField::City | ConferenceField::Topics => {
                ValueKind::Text
            }
            ConferenceField::Month
            | ConferenceField::MaxAttendees
            | ConferenceField::SeatsAvailable => ValueKind::Integer,
        }
    }
}

impl FromStr for ConferenceField {
    type Err = FilterError;

    /// Parses a client token; only allow-listed fields are accepted.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "CITY" => Ok(ConferenceField::City),
            "TOPIC" => Ok(ConferenceField::Topics),
            "MONTH" => Ok(ConferenceField::Month),
            "MAX_ATTENDEES" => Ok(ConferenceField::MaxAttendees),
            other => Err(FilterError::InvalidField(other.to_string())),
        }
    }
}

impl TryFrom<String> for ConferenceField {
    type Error = FilterError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<ConferenceField> for &'static str {
    fn from(field: ConferenceField) -> Self {
        field.token()
    }
}

/// Session properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SessionField {
    Name,
    Highlights,
    Speaker,
    Duration,
    TypeOfSession,
    DateTime,
}

impl SessionField {
    pub fn token(self) -> &'static str {
        match self {
            SessionField::Name => "SESSION_NAME",
            SessionField::Highlights => "HIGHLIGHTS",
            SessionField::Speaker => "SPEAKER",
            SessionField::Duration => "DURATION",
            SessionField::TypeOfSession => "TYPE_OF_SESSION",
            SessionField::DateTime => "DATE_TIME",
        }
    }
}

impl Field for SessionField {
    const NAME: Self = SessionField::Name;

    fn property(self) -> &'static str {
        match self {
            SessionField::Name => "sessionName",
            SessionField::Highlights => "highlights",
            SessionField::Speaker => "speaker",
            SessionField::Duration => "duration",
            SessionField::TypeOfSession => "typeOfSession",
            SessionField::DateTime => "dateTime",
        }
    }

    fn kind(self) -> ValueKind {
        match self {
            SessionField::Duration => ValueKind::Integer,
            SessionField::DateTime => ValueKind::DateTime,
            _ => ValueKind::Text,
        }
    }
}

impl FromStr for SessionField {
    type Err = FilterError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "SESSION_NAME" => Ok(SessionField::Name),
            "HIGHLIGHTS" => Ok(SessionField::Highlights),
            "SPEAKER" => Ok(SessionField::Speaker),
            "DURATION" => Ok(SessionField::Duration),
            "TYPE_OF_SESSION" => Ok(SessionField::TypeOfSession),
            "DATE_TIME" => Ok(SessionField::DateTime),
            other => Err(FilterError::InvalidField(other.to_string())),
        }
    }
}

impl TryFrom<String> for SessionField {
    type Error = FilterError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<SessionField> for &'static str {
    fn from(field: SessionField) -> Self {
        field.token()
    }
}

/// One filter expression as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterForm<F> {
    pub field: F,
    pub operator: Operator,
    pub value: String,
}

impl<F> FilterForm<F> {
    pub fn new(field: F, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }
}

pub type ConferenceQueryForm = FilterForm<ConferenceField>;
pub type SessionQueryForm = FilterForm<SessionField>;

/// A single conjunctive predicate of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate<F> {
    pub field: F,
    pub operator: Operator,
    pub value: Value,
}

impl<F: Field> Predicate<F> {
    fn matches(&self, record_value: FieldValue<'_>) -> bool {
        match record_value {
            FieldValue::List(items) => items
                .iter()
                .any(|item| self.matches(FieldValue::Text(item.as_str()))),
            FieldValue::Missing => false,
            other => other
                .compare(&self.value)
                .is_some_and(|ordering| self.operator.holds(ordering)),
        }
    }
}

/// A compiled, ordered query against one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan<F> {
    predicates: Vec<Predicate<F>>,
    order: Vec<F>,
}

impl<F: Field> QueryPlan<F> {
    /// An unfiltered plan sorted by the canonical name field.
    pub fn by_name() -> Self {
        Self {
            predicates: Vec::new(),
            order: vec![F::NAME],
        }
    }

    /// Adds an equality predicate; used for server-side queries that never
    /// carry an inequality.
    pub fn with_eq(mut self, field: F, value: Value) -> Self {
        self.predicates.push(Predicate {
            field,
            operator: Operator::Eq,
            value,
        });
        self
    }

    /// Adds a range predicate on `field` and sorts on it ahead of the name.
    pub fn with_range(mut self, field: F, operator: Operator, value: Value) -> Self {
        self.predicates.push(Predicate {
            field,
            operator,
            value,
        });
        if !self.order.contains(&field) {
            self.order.insert(0, field);
        }
        self
    }

    pub fn predicates(&self) -> &[Predicate<F>] {
        &self.predicates
    }

    pub fn order(&self) -> &[F] {
        &self.order
    }

    /// Whether a record satisfies every predicate and has a value for every
    /// sort field.
    pub fn matches<R: Queryable<Field = F>>(&self, record: &R) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate.matches(record.field_value(predicate.field)))
            && self
                .order
                .iter()
                .all(|field| record.field_value(*field) != FieldValue::Missing)
    }

    pub fn compare<R: Queryable<Field = F>>(&self, a: &R, b: &R) -> Ordering {
        self.order
            .iter()
            .map(|field| a.field_value(*field).sort_cmp(&b.field_value(*field)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Filters and sorts `records` according to the plan.
    pub fn execute<R, I>(&self, records: I) -> Vec<R>
    where
        R: Queryable<Field = F>,
        I: IntoIterator<Item = R>,
    {
        let mut matching: Vec<R> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();
        matching.sort_by(|a, b| self.compare(a, b));
        matching
    }
}

fn coerce<F: Field>(field: F, raw: &str) -> Result<Value, FilterError> {
    let invalid = || FilterError::InvalidValue {
        field: field.property(),
        value: raw.to_string(),
    };

    match field.kind() {
        ValueKind::Text => Ok(Value::Text(raw.to_string())),
        ValueKind::Integer => raw.trim().parse().map(Value::Integer).map_err(|_| invalid()),
        ValueKind::DateTime => NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
            .map(Value::DateTime)
            .map_err(|_| invalid()),
    }
}

/// Compiles client filters into a plan.
///
/// Sorting is on the inequality field (if any) first, then on the name.
pub fn compile<F: Field>(filters: &[FilterForm<F>]) -> Result<QueryPlan<F>, FilterError> {
    let mut inequality_field: Option<F> = None;
    let mut predicates = Vec::with_capacity(filters.len());

    for filter in filters {
        if filter.operator.is_inequality() {
            match inequality_field {
                Some(previous) if previous != filter.field => {
                    return Err(FilterError::MultipleInequalityFields {
                        first: previous.property(),
                        second: filter.field.property(),
                    });
                }
                _ => inequality_field = Some(filter.field),
            }
        }

        predicates.push(Predicate {
            field: filter.field,
            operator: filter.operator,
            value: coerce(filter.field, &filter.value)?,
        });
    }

    let order = match inequality_field {
        Some(field) if field != F::NAME => vec![field, F::NAME],
        _ => vec![F::NAME],
    };

    Ok(QueryPlan { predicates, order })
}
