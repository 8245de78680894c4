//! Port for user aggregate persistence.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{EmailAddress, User, UserId, Version};

/// Errors surfaced by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserRepositoryError {
    /// Repository connection could not be established; transient.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// The email uniqueness invariant would be violated.
    #[error("a user with email {email} already exists")]
    DuplicateEmail { email: EmailAddress },
    /// The expected version no longer matches the stored aggregate.
    #[error("user version conflict")]
    VersionConflict,
    /// No user exists under the given identifier.
    #[error("user not found")]
    NotFound,
}

impl UserRepositoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for [`User`] aggregates.
///
/// `create` enforces email uniqueness; `replace` enforces the optimistic
/// concurrency check against the version fetched alongside the aggregate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, failing with
    /// [`UserRepositoryError::DuplicateEmail`] when the email is taken.
    async fn create(&self, user: &User) -> Result<Version, UserRepositoryError>;

    /// Fetch a user and its current version by identifier.
    async fn find_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, Version)>, UserRepositoryError>;

    /// Fetch a user and its current version by unique email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<(User, Version)>, UserRepositoryError>;

    /// Replace the stored aggregate if `expected` still matches, returning
    /// the new version.
    async fn replace(
        &self,
        user: &User,
        expected: Version,
    ) -> Result<Version, UserRepositoryError>;

    /// Delete the user, failing with [`UserRepositoryError::NotFound`] when
    /// absent.
    async fn delete(&self, id: UserId) -> Result<(), UserRepositoryError>;
}

/// Fixture implementation for tests that do not exercise user persistence.
///
/// Lookups return `None` and writes are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn create(&self, _user: &User) -> Result<Version, UserRepositoryError> {
        Ok(Version::initial())
    }

    async fn find_by_id(
        &self,
        _id: UserId,
    ) -> Result<Option<(User, Version)>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<(User, Version)>, UserRepositoryError> {
        Ok(None)
    }

    async fn replace(
        &self,
        _user: &User,
        expected: Version,
    ) -> Result<Version, UserRepositoryError> {
        Ok(expected.next())
    }

    async fn delete(&self, _id: UserId) -> Result<(), UserRepositoryError> {
        Ok(())
    }
}
