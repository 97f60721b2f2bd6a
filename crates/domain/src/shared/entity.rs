use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Display, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

/// Something stored and looked up by its [`ID`]
pub trait Entity {
    fn id(&self) -> &ID;
}

/// Opaque identifier of a stored row, serialized as its hyphenated uuid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ID(Uuid);

impl ID {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner_ref(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ID {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ID {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for ID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Malformed id: `{0}`")]
pub struct InvalidIDError(pub String);

impl FromStr for ID {
    type Err = InvalidIDError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| InvalidIDError(s.to_string()))
    }
}

impl TryFrom<String> for ID {
    type Error = InvalidIDError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ID> for String {
    fn from(id: ID) -> Self {
        id.to_string()
    }
}
