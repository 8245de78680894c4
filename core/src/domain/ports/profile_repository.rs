//! Port for profile aggregate persistence.
//!
//! Profiles are keyed by their owning user: the one-profile-per-user
//! invariant makes the foreign key the storage key.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Profile, UserId, Version};

/// Errors surfaced by profile repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileRepositoryError {
    /// Repository connection could not be established; transient.
    #[error("profile repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("profile repository query failed: {message}")]
    Query { message: String },
    /// A profile already exists for this user.
    #[error("user {user_id} already has a profile")]
    DuplicateProfile { user_id: UserId },
    /// The expected version no longer matches the stored aggregate.
    #[error("profile version conflict")]
    VersionConflict,
    /// No profile exists for the given user.
    #[error("profile not found")]
    NotFound,
}

impl ProfileRepositoryError {
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

/// Persistence port for [`Profile`] aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile owned by `user_id` together with its version.
    async fn find_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Profile, Version)>, ProfileRepositoryError>;

    /// Insert a new profile, failing with
    /// [`ProfileRepositoryError::DuplicateProfile`] when the user already
    /// has one.
    async fn create(&self, profile: &Profile) -> Result<Version, ProfileRepositoryError>;

    /// Replace the stored aggregate if `expected` still matches, returning
    /// the new version.
    async fn replace(
        &self,
        profile: &Profile,
        expected: Version,
    ) -> Result<Version, ProfileRepositoryError>;

    /// Delete the profile, failing with
    /// [`ProfileRepositoryError::NotFound`] when absent.
    async fn delete(&self, user_id: UserId) -> Result<(), ProfileRepositoryError>;
}

/// Fixture implementation for tests that do not exercise profile
/// persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileRepository;

#[async_trait]
impl ProfileRepository for FixtureProfileRepository {
    async fn find_by_user_id(
        &self,
        _user_id: UserId,
    ) -> Result<Option<(Profile, Version)>, ProfileRepositoryError> {
        Ok(None)
    }

    async fn create(&self, _profile: &Profile) -> Result<Version, ProfileRepositoryError> {
        Ok(Version::initial())
    }

    async fn replace(
        &self,
        _profile: &Profile,
        expected: Version,
    ) -> Result<Version, ProfileRepositoryError> {
        Ok(expected.next())
    }

    async fn delete(&self, _user_id: UserId) -> Result<(), ProfileRepositoryError> {
        Ok(())
    }
}
