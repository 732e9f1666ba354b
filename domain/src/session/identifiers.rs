//! Session identifiers.
//!
//! Identifiers are restricted to `[A-Za-z0-9._-]` so they are safe to show,
//! to paste back into `--session`, and to use as storage key components.

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const MAX_IDENTIFIER_LEN: usize = 128;

/// `_{%Y%m%d_%H%M%S}_{8 hex chars}` appended by [`SessionId::generate`]
const GENERATED_SUFFIX_LEN: usize = 25;

/// Longest user id whose generated session ids still fit the key limit
pub const MAX_USER_ID_LEN: usize = MAX_IDENTIFIER_LEN - GENERATED_SUFFIX_LEN;

fn validate(kind: &'static str, raw: &str) -> Result<String, DomainError> {
    validate_len(kind, raw, MAX_IDENTIFIER_LEN)
}

fn validate_len(kind: &'static str, raw: &str, max_len: usize) -> Result<String, DomainError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::InvalidIdentifier {
            kind,
            reason: "cannot be empty".to_string(),
        });
    }
    if value.len() > max_len {
        return Err(DomainError::InvalidIdentifier {
            kind,
            reason: format!("longer than {} bytes", max_len),
        });
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(DomainError::InvalidIdentifier {
            kind,
            reason: format!("contains unsupported character {:?}", bad),
        });
    }
    Ok(value.to_string())
}

/// Identifier of the person chatting with the team (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        validate_len("user id", raw.as_ref(), MAX_USER_ID_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self("user".to_string())
    }
}

/// Identifier of one conversation belonging to a user (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        validate("session id", raw.as_ref()).map(Self)
    }

    /// Generate a fresh identifier: `{user}_{%Y%m%d_%H%M%S}_{8 hex chars}`.
    ///
    /// A pure function of its inputs; callers supply the clock reading and
    /// the randomness source.
    pub fn generate<R: Rng>(user: &UserId, now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: u32 = rng.r#gen();
        Self(format!(
            "{}_{}_{:08x}",
            user.as_str(),
            now.format("%Y%m%d_%H%M%S"),
            suffix
        ))
    }

    /// Resolve a session name given on the command line.
    ///
    /// `--session etl` for user `ana` becomes `ana_etl`; ids that already
    /// carry the user prefix (as printed by `list-sessions`) are kept.
    pub fn resolve(user: &UserId, requested: &str) -> Result<Self, DomainError> {
        let requested = validate("session id", requested)?;
        let prefix = format!("{}_", user.as_str());
        if requested.starts_with(&prefix) {
            Self::new(requested)
        } else {
            Self::new(format!("{}{}", prefix, requested))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_conversions {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

string_conversions!(UserId);
string_conversions!(SessionId);

/// Structured storage key of a session: `(user, session)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub user: UserId,
    pub session: SessionId,
}

impl SessionKey {
    pub fn new(user: UserId, session: SessionId) -> Self {
        Self { user, session }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user, self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_identifier_validation() {
        assert!(UserId::new("jonatan").is_ok());
        assert!(UserId::new("ana.perez-01").is_ok());
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
        assert!(UserId::new("x; DROP TABLE").is_err());
        assert!(SessionId::new("a".repeat(129)).is_err());
    }

    #[test]
    fn test_identifier_is_trimmed() {
        let user = UserId::new("  ana ").unwrap();
        assert_eq!(user.as_str(), "ana");
    }

    #[test]
    fn test_generate_format() {
        let user = UserId::new("ana").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 8, 17, 46, 27).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let id = SessionId::generate(&user, now, &mut rng);

        let s = id.as_str();
        assert!(s.starts_with("ana_20250908_174627_"));
        let suffix = s.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_id_of_longest_user_is_valid() {
        let user = UserId::new("u".repeat(MAX_USER_ID_LEN)).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 8, 17, 46, 27).unwrap();
        let id = SessionId::generate(&user, now, &mut StdRng::seed_from_u64(3));
        assert_eq!(id.as_str().len(), MAX_IDENTIFIER_LEN);
        assert_eq!(SessionId::new(id.as_str()).unwrap(), id);
        assert_eq!(SessionId::resolve(&user, id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_user_id_leaves_room_for_generated_suffix() {
        assert!(UserId::new("u".repeat(MAX_USER_ID_LEN + 1)).is_err());
        assert!(SessionId::new("s".repeat(MAX_USER_ID_LEN + 1)).is_ok());
    }

    #[test]
    fn test_generate_is_deterministic_for_same_inputs() {
        let user = UserId::new("ana").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 8, 0, 0, 0).unwrap();
        let a = SessionId::generate(&user, now, &mut StdRng::seed_from_u64(1));
        let b = SessionId::generate(&user, now, &mut StdRng::seed_from_u64(1));
        let c = SessionId::generate(&user, now, &mut StdRng::seed_from_u64(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_resolve_adds_user_prefix_once() {
        let user = UserId::new("ana").unwrap();
        assert_eq!(SessionId::resolve(&user, "etl").unwrap().as_str(), "ana_etl");
        assert_eq!(
            SessionId::resolve(&user, "ana_20250908_174627_bd6b2175")
                .unwrap()
                .as_str(),
            "ana_20250908_174627_bd6b2175"
        );
        assert!(SessionId::resolve(&user, "bad name").is_err());
    }

    #[test]
    fn test_serde_rejects_invalid_identifier() {
        let ok: Result<UserId, _> = serde_json::from_str("\"ana\"");
        assert!(ok.is_ok());
        let bad: Result<UserId, _> = serde_json::from_str("\"a b\"");
        assert!(bad.is_err());
    }
}
