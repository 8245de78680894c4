//! Port for post aggregate persistence.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Post, PostId, Version};

/// Errors surfaced by post repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostRepositoryError {
    /// Repository connection could not be established; transient.
    #[error("post repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("post repository query failed: {message}")]
    Query { message: String },
    /// A post with this id is already stored.
    #[error("post {id} already exists")]
    DuplicateId { id: PostId },
    /// The expected version no longer matches the stored aggregate.
    #[error("post version conflict")]
    VersionConflict,
    /// No post exists under the given identifier.
    #[error("post not found")]
    NotFound,
}

impl PostRepositoryError {
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

/// Persistence port for [`Post`] aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post.
    async fn create(&self, post: &Post) -> Result<Version, PostRepositoryError>;

    /// Fetch a post and its current version by identifier.
    async fn find_by_id(
        &self,
        id: PostId,
    ) -> Result<Option<(Post, Version)>, PostRepositoryError>;

    /// Replace the stored aggregate if `expected` still matches, returning
    /// the new version.
    async fn replace(
        &self,
        post: &Post,
        expected: Version,
    ) -> Result<Version, PostRepositoryError>;

    /// Delete the post, failing with [`PostRepositoryError::NotFound`] when
    /// absent.
    async fn delete(&self, id: PostId) -> Result<(), PostRepositoryError>;
}

/// Fixture implementation for tests that do not exercise post persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePostRepository;

#[async_trait]
impl PostRepository for FixturePostRepository {
    async fn create(&self, _post: &Post) -> Result<Version, PostRepositoryError> {
        Ok(Version::initial())
    }

    async fn find_by_id(
        &self,
        _id: PostId,
    ) -> Result<Option<(Post, Version)>, PostRepositoryError> {
        Ok(None)
    }

    async fn replace(
        &self,
        _post: &Post,
        expected: Version,
    ) -> Result<Version, PostRepositoryError> {
        Ok(expected.next())
    }

    async fn delete(&self, _id: PostId) -> Result<(), PostRepositoryError> {
        Ok(())
    }
}
