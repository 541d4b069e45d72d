//! Websafe key generation for Conference Central entities.
//!
//! Conferences and sessions are addressed by short, URL-safe codes produced by
//! `tiny_id`. Profiles reuse the stable user id handed out by the identity
//! provider, so they are only ever built with [`Id::from_string`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::sync::{Mutex, PoisonError};
use tiny_id::ShortCodeGenerator;

/// Type alias for a lazy-initialized short code generator with a mutex for thread safety.
type LazyShortCodeGenerator = LazyLock<Mutex<ShortCodeGenerator<char>>>;

// Alphanumeric without the characters people misread when copying a key by hand
const WEBSAFE_ALPHABET: &str = "123456789ABCDEFGHJKMNPQRSTUVWXYZabcdefghkmnpqrstuvwxyz";

static CONFERENCE_KEY_GENERATOR: LazyShortCodeGenerator = LazyLock::new(|| {
    let alphabet: Vec<char> = WEBSAFE_ALPHABET.chars().collect();
    Mutex::new(ShortCodeGenerator::with_alphabet(alphabet, 10))
});

static SESSION_KEY_GENERATOR: LazyShortCodeGenerator = LazyLock::new(|| {
    let alphabet: Vec<char> = WEBSAFE_ALPHABET.chars().collect();
    Mutex::new(ShortCodeGenerator::with_alphabet(alphabet, 11))
});

fn next_code(generator: &LazyShortCodeGenerator) -> String {
    // A panic while holding the lock cannot leave the generator half-updated
    generator
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .next_string()
}

/// A type-safe wrapper around string ids.
///
/// The marker type keeps a conference key from being passed where a session
/// key is expected, while still serializing as a bare string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _phantom: std::marker::PhantomData<T>,
}

// Custom serde implementation to serialize as just a string
impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_string(value))
    }
}

impl<T> Id<T> {
    /// Wraps an existing string, e.g. a key taken from a request path.
    ///
    /// # Example
    /// ```
    /// use confcentral::id::ConferenceKey;
    ///
    /// let key = ConferenceKey::from_string("abc123".to_string());
    /// assert_eq!(key.as_str(), "abc123");
    /// ```
    pub fn from_string(value: String) -> Self {
        Self {
            value,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Returns the string value of the id.
    pub fn as_str(&self) -> &str {
        &self.value
    }

}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::from_string(value.to_string())
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

// Type markers for different entity types
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileMarker;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConferenceMarker;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionMarker;

/// Stable user id from the identity provider; also the profile's key.
pub type ProfileId = Id<ProfileMarker>;

/// Websafe key of a conference.
pub type ConferenceKey = Id<ConferenceMarker>;

/// Websafe key of a session.
pub type SessionKey = Id<SessionMarker>;

impl ConferenceKey {
    /// Allocates a fresh conference key.
    ///
    /// # Example
    /// ```
    /// use confcentral::id::ConferenceKey;
    ///
    /// let key = ConferenceKey::allocate();
    /// assert_eq!(key.as_str().len(), 10);
    /// ```
    pub fn allocate() -> Self {
        Self::from_string(next_code(&CONFERENCE_KEY_GENERATOR))
    }
}

impl SessionKey {
    /// Allocates a fresh session key.
    pub fn allocate() -> Self {
        Self::from_string(next_code(&SESSION_KEY_GENERATOR))
    }
}
