//! In-memory reference implementation of the repository ports.
//!
//! One mutex-guarded map per aggregate kind, each entry paired with its
//! [`Version`]. A replace succeeds only when the caller's expected version
//! matches the stored one, which gives the same lost-update protection a
//! durable adapter must provide with conditional writes. The store is the
//! reference used by the integration tests and by anything that needs a
//! process-local backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    PostRepository, PostRepositoryError, ProfileRepository, ProfileRepositoryError,
    UserRepository, UserRepositoryError,
};
use crate::domain::{EmailAddress, Post, PostId, Profile, User, UserId, Version};

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, (User, Version)>,
    emails: HashMap<EmailAddress, UserId>,
    profiles: HashMap<UserId, (Profile, Version)>,
    posts: HashMap<PostId, (Post, Version)>,
}

/// Process-local aggregate store with optimistic-concurrency semantics.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<E>(&self, poisoned: impl FnOnce() -> E) -> Result<MutexGuard<'_, StoreState>, E> {
        self.state.lock().map_err(|_| poisoned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User) -> Result<Version, UserRepositoryError> {
        let mut state = self.lock(|| UserRepositoryError::query("store mutex poisoned"))?;

        if state.emails.contains_key(user.email()) {
            return Err(UserRepositoryError::DuplicateEmail {
                email: user.email().clone(),
            });
        }

        let version = Version::initial();
        state.emails.insert(user.email().clone(), user.id());
        state.users.insert(user.id(), (user.clone(), version));
        Ok(version)
    }

    async fn find_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, Version)>, UserRepositoryError> {
        let state = self.lock(|| UserRepositoryError::query("store mutex poisoned"))?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<(User, Version)>, UserRepositoryError> {
        let state = self.lock(|| UserRepositoryError::query("store mutex poisoned"))?;
        Ok(state
            .emails
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn replace(
        &self,
        user: &User,
        expected: Version,
    ) -> Result<Version, UserRepositoryError> {
        let mut state = self.lock(|| UserRepositoryError::query("store mutex poisoned"))?;

        let entry = state
            .users
            .get_mut(&user.id())
            .ok_or(UserRepositoryError::NotFound)?;
        if entry.1 != expected {
            return Err(UserRepositoryError::VersionConflict);
        }

        let next = expected.next();
        *entry = (user.clone(), next);
        Ok(next)
    }

    async fn delete(&self, id: UserId) -> Result<(), UserRepositoryError> {
        let mut state = self.lock(|| UserRepositoryError::query("store mutex poisoned"))?;

        let (user, _) = state.users.remove(&id).ok_or(UserRepositoryError::NotFound)?;
        state.emails.remove(user.email());
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn find_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Profile, Version)>, ProfileRepositoryError> {
        let state = self.lock(|| ProfileRepositoryError::query("store mutex poisoned"))?;
        Ok(state.profiles.get(&user_id).cloned())
    }

    async fn create(&self, profile: &Profile) -> Result<Version, ProfileRepositoryError> {
        let mut state = self.lock(|| ProfileRepositoryError::query("store mutex poisoned"))?;

        if state.profiles.contains_key(&profile.user_id()) {
            return Err(ProfileRepositoryError::DuplicateProfile {
                user_id: profile.user_id(),
            });
        }

        let version = Version::initial();
        state
            .profiles
            .insert(profile.user_id(), (profile.clone(), version));
        Ok(version)
    }

    async fn replace(
        &self,
        profile: &Profile,
        expected: Version,
    ) -> Result<Version, ProfileRepositoryError> {
        let mut state = self.lock(|| ProfileRepositoryError::query("store mutex poisoned"))?;

        let entry = state
            .profiles
            .get_mut(&profile.user_id())
            .ok_or(ProfileRepositoryError::NotFound)?;
        if entry.1 != expected {
            return Err(ProfileRepositoryError::VersionConflict);
        }

        let next = expected.next();
        *entry = (profile.clone(), next);
        Ok(next)
    }

    async fn delete(&self, user_id: UserId) -> Result<(), ProfileRepositoryError> {
        let mut state = self.lock(|| ProfileRepositoryError::query("store mutex poisoned"))?;
        state
            .profiles
            .remove(&user_id)
            .map(|_| ())
            .ok_or(ProfileRepositoryError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: &Post) -> Result<Version, PostRepositoryError> {
        let mut state = self.lock(|| PostRepositoryError::query("store mutex poisoned"))?;

        if state.posts.contains_key(&post.id()) {
            return Err(PostRepositoryError::DuplicateId { id: post.id() });
        }

        let version = Version::initial();
        state.posts.insert(post.id(), (post.clone(), version));
        Ok(version)
    }

    async fn find_by_id(
        &self,
        id: PostId,
    ) -> Result<Option<(Post, Version)>, PostRepositoryError> {
        let state = self.lock(|| PostRepositoryError::query("store mutex poisoned"))?;
        Ok(state.posts.get(&id).cloned())
    }

    async fn replace(
        &self,
        post: &Post,
        expected: Version,
    ) -> Result<Version, PostRepositoryError> {
        let mut state = self.lock(|| PostRepositoryError::query("store mutex poisoned"))?;

        let entry = state
            .posts
            .get_mut(&post.id())
            .ok_or(PostRepositoryError::NotFound)?;
        if entry.1 != expected {
            return Err(PostRepositoryError::VersionConflict);
        }

        let next = expected.next();
        *entry = (post.clone(), next);
        Ok(next)
    }

    async fn delete(&self, id: PostId) -> Result<(), PostRepositoryError> {
        let mut state = self.lock(|| PostRepositoryError::query("store mutex poisoned"))?;
        state
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(PostRepositoryError::NotFound)
    }
}
