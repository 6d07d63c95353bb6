use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Login name plus the optional remote session cookie, joined by `;`
///
/// The cookie is kept as a `name=value` pair so that it can be replayed as a
/// `Cookie` header on later calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId {
    pub user: String,
    pub cookie: Option<String>,
}

impl CompositeId {
    pub fn new(user: impl Into<String>, cookie: Option<String>) -> Self {
        Self {
            user: user.into(),
            cookie: cookie.filter(|c| !c.is_empty()),
        }
    }

    /// Split on the first `;`. Without a separator the whole value is the user.
    pub fn parse(value: &str) -> Self {
        match value.split_once(';') {
            Some((user, cookie)) => Self::new(user, Some(cookie.to_string())),
            None => Self::new(value, None),
        }
    }

    /// The value segment of the cookie: after the first `=`, before the next `;`
    pub fn session_value(&self) -> Option<&str> {
        let cookie = self.cookie.as_deref()?;
        let first = cookie.split(';').next().unwrap_or(cookie);
        let value = match first.split_once('=') {
            Some((_, value)) => value,
            None => first,
        };
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cookie {
            Some(cookie) => write!(f, "{};{}", self.user, cookie),
            None => write!(f, "{}", self.user),
        }
    }
}

impl From<&str> for CompositeId {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl Serialize for CompositeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// An authenticated end user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub login: String,
    pub realm: Option<String>,
    pub composite_id: CompositeId,
    /// Profile data merged in by the enricher
    pub attributes: Map<String, Value>,
}

impl Identity {
    pub fn new(composite_id: CompositeId) -> Self {
        let login = composite_id.user.clone();
        let realm = login
            .split_once('@')
            .map(|(_, realm)| realm.to_string())
            .filter(|realm| !realm.is_empty());
        Self {
            login,
            realm,
            composite_id,
            attributes: Map::new(),
        }
    }

    /// Add every key of `attributes`, replacing values of keys already present
    pub fn merge_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes.extend(attributes);
    }
}

impl From<CompositeId> for Identity {
    fn from(composite_id: CompositeId) -> Self {
        Self::new(composite_id)
    }
}
