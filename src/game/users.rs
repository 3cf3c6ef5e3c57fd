// Registered users and their public keys

use crate::game::board::PlayerId;
use crate::game::keys;
use rsa::RsaPublicKey;
use std::collections::HashMap;
use thiserror::Error;

/// One registered user
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub name: String,
    pub public_key: RsaPublicKey,
}

impl UserRecord {
    pub fn new(name: impl Into<String>, public_key: RsaPublicKey) -> Self {
        Self {
            name: name.into(),
            public_key,
        }
    }

    pub fn fingerprint(&self) -> String {
        keys::fingerprint(&self.public_key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate user '{0}'")]
    Duplicate(String),
    #[error("user name must be non-empty and contain no whitespace: {0:?}")]
    BadName(String),
}

/// Immutable set of users, fixed at startup and shared read-only by every
/// connection worker. Registration order is preserved for the scoreboard.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: Vec<UserRecord>,
    by_name: HashMap<String, PlayerId>,
}

impl UserRegistry {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for record in records {
            if record.name.is_empty() || record.name.chars().any(char::is_whitespace) {
                return Err(RegistryError::BadName(record.name));
            }
            if registry.by_name.contains_key(&record.name) {
                return Err(RegistryError::Duplicate(record.name));
            }

            let id = PlayerId(registry.users.len());
            registry.by_name.insert(record.name.clone(), id);
            registry.users.push(record);
        }

        Ok(registry)
    }

    /// Exact-match lookup by user name
    pub fn lookup(&self, name: &str) -> Option<(PlayerId, &UserRecord)> {
        let id = *self.by_name.get(name)?;
        self.users.get(id.0).map(|rec| (id, rec))
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|u| u.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
