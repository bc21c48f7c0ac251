//! Account model and password hashing.
//!
//! # Invariants
//! - `password_hash` never leaves the core through serialization.
//! - Stored hashes use the `salt$sha256hex(salt || password)` layout.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub type UserId = i64;

/// Account role. Serialized as the integer code used by the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum UserType {
    /// Person with a disability who raises help requests.
    Requester,
    /// Volunteer who claims and completes requests.
    Volunteer,
}

impl UserType {
    pub fn code(self) -> i64 {
        match self {
            Self::Requester => 0,
            Self::Volunteer => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Requester),
            1 => Some(Self::Volunteer),
            _ => None,
        }
    }
}

impl From<UserType> for i64 {
    fn from(value: UserType) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for UserType {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| format!("unknown user type `{value}`"))
    }
}

impl Display for UserType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requester => write!(f, "requester"),
            Self::Volunteer => write!(f, "volunteer"),
        }
    }
}

/// Persisted account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub user_type: UserType,
    /// Reward balance. Never negative.
    pub score: i64,
    pub address: Option<String>,
    pub info: Option<String>,
    pub label: Option<String>,
    pub real_name: Option<String>,
    pub identity_number: Option<String>,
}

impl User {
    pub fn is_volunteer(&self) -> bool {
        self.user_type == UserType::Volunteer
    }

    pub fn is_requester(&self) -> bool {
        self.user_type == UserType::Requester
    }
}

/// Insert shape for a validated registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
    pub phone: String,
    pub user_type: UserType,
}

/// Optional profile fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub real_name: Option<String>,
    pub identity_number: Option<String>,
    pub address: Option<String>,
    pub info: Option<String>,
    pub label: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.real_name.is_none()
            && self.identity_number.is_none()
            && self.address.is_none()
            && self.info.is_none()
            && self.label.is_none()
    }
}

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = hex::encode(salted_digest(&salt, password));
    format!("{salt}${digest}")
}

/// Checks a candidate password against a stored `salt$digest` hash.
///
/// Digest bytes are compared in constant time.
pub fn verify_password(stored_hash: &str, candidate: &str) -> bool {
    let Some((salt, digest_hex)) = stored_hash.split_once('$') else {
        return false;
    };
    let Ok(stored) = hex::decode(digest_hex) else {
        return false;
    };
    salted_digest(salt, candidate)
        .as_slice()
        .ct_eq(stored.as_slice())
        .into()
}

fn salted_digest(salt: &str, password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password, UserType};

    #[test]
    fn password_hash_roundtrip_uses_random_salt() {
        let first = hash_password("secret");
        let second = hash_password("secret");
        assert_ne!(first, second);
        assert!(verify_password(&first, "secret"));
        assert!(!verify_password(&first, "Secret"));
        assert!(!verify_password("no-separator", "secret"));
    }

    #[test]
    fn corrupt_or_truncated_digests_never_verify() {
        let stored = hash_password("secret");
        let (salt, digest) = stored.split_once('$').unwrap();

        assert!(!verify_password(&format!("{salt}$not-hex"), "secret"));
        assert!(!verify_password(&format!("{salt}${}", &digest[..32]), "secret"));
        assert!(!verify_password(&format!("{salt}$"), "secret"));
    }

    #[test]
    fn user_type_serializes_as_integer_code() {
        assert_eq!(serde_json::to_string(&UserType::Volunteer).unwrap(), "1");
        let parsed: UserType = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, UserType::Requester);
        assert!(serde_json::from_str::<UserType>("7").is_err());
    }
}
