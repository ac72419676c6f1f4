use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque identifier of the signed-in user, as issued by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// City identifiers are backend-defined: some backends hand out numbers,
/// others strings. The id is compared by value and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CityId::Number(n) => write!(f, "{n}"),
            CityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CityId {
    fn from(value: i64) -> Self {
        CityId::Number(value)
    }
}

impl From<&str> for CityId {
    fn from(value: &str) -> Self {
        CityId::Text(value.to_owned())
    }
}

impl From<String> for CityId {
    fn from(value: String) -> Self {
        CityId::Text(value)
    }
}

/// One city record. Only the identifier is interpreted locally; every other
/// field (name, coordinates, notes, visit date, ...) is backend-defined and
/// passed through unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl City {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A city record before the backend has assigned it an identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityDraft {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CityDraft {
    pub fn with_id(self, id: CityId) -> City {
        City {
            id,
            fields: self.fields,
        }
    }
}
