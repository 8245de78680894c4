//! User aggregate: the identity root owning a profile and posts by reference.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Validation errors returned by the user value-type constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user name must not be empty")]
    EmptyName,
    #[error("email address is not well formed")]
    InvalidEmail,
    #[error("password hash must not be empty")]
    EmptyPasswordHash,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape check only; deliverability is the mail system's problem.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Unique, validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(value.into())
    }

    fn from_owned(value: String) -> Result<Self, UserValidationError> {
        if !email_regex().is_match(&value) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Opaque, already-derived password hash.
///
/// Hash derivation belongs to the authentication collaborator; the domain
/// stores the result verbatim. The backing string is zeroised when the value
/// is dropped, and `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasswordHash(Zeroizing<String>);

impl PasswordHash {
    /// Wrap a non-empty hash string.
    pub fn new(value: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(value.into())
    }

    fn from_owned(value: String) -> Result<Self, UserValidationError> {
        if value.is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        Ok(Self(Zeroizing::new(value)))
    }

    /// Borrow the hash for verification by the authentication collaborator.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}

impl From<PasswordHash> for String {
    fn from(value: PasswordHash) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for PasswordHash {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Fields supplied when registering a new user.
///
/// The avatar URL arrives pre-derived from the email (collaborator contract)
/// and the password hash pre-computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub avatar_url: Url,
}

/// Application user.
///
/// ## Invariants
/// - `email` is unique across the store (enforced by the repository).
/// - `id`, `name`, and `email` are immutable after creation; only the
///   password hash and avatar URL may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct User {
    id: UserId,
    name: String,
    email: EmailAddress,
    password_hash: PasswordHash,
    avatar_url: Url,
}

impl User {
    /// Build a new user with a fresh identifier.
    pub fn new(draft: NewUser) -> Result<Self, UserValidationError> {
        if draft.name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        Ok(Self {
            id: UserId::random(),
            name: draft.name,
            email: draft.email,
            password_hash: draft.password_hash,
            avatar_url: draft.avatar_url,
        })
    }

    /// Stable user identifier.
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Display name embedded as a snapshot in posts and comments.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Unique email address.
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Current password hash.
    pub const fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// Current avatar URL.
    pub const fn avatar_url(&self) -> &Url {
        &self.avatar_url
    }

    /// Copy with a replaced password hash.
    pub fn with_password_hash(mut self, hash: PasswordHash) -> Self {
        self.password_hash = hash;
        self
    }

    /// Copy with a replaced avatar URL.
    pub fn with_avatar_url(mut self, avatar_url: Url) -> Self {
        self.avatar_url = avatar_url;
        self
    }
}
