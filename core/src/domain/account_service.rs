//! Account service: registration and the delete-account cascade.
//!
//! The cascade removes the Profile (when present) and then the User. It is
//! deliberately not responsible for the user's posts, which stay behind as
//! orphans by reference, per the collaborator contract. The cascade is not
//! transactional; each step is idempotent so the whole operation is safe to
//! retry after a partial failure.

use std::sync::Arc;

use crate::domain::ports::{
    ProfileRepository, ProfileRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{Error, NewUser, User, UserId};

fn map_user_repo_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::DuplicateEmail { email } => {
            Error::duplicate_key(format!("a user with email {email} already exists"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

fn map_profile_repo_error(error: ProfileRepositoryError) -> Error {
    match error {
        ProfileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("profile repository unavailable: {message}"))
        }
        other => Error::internal(format!("profile repository error: {other}")),
    }
}

/// Service for account lifecycle operations.
#[derive(Clone)]
pub struct AccountService<U, P> {
    users: Arc<U>,
    profiles: Arc<P>,
}

impl<U, P> AccountService<U, P> {
    /// Create a new service over the given repositories.
    pub fn new(users: Arc<U>, profiles: Arc<P>) -> Self {
        Self { users, profiles }
    }
}

impl<U, P> AccountService<U, P>
where
    U: UserRepository,
    P: ProfileRepository,
{
    /// Register a new user.
    ///
    /// The password hash and avatar URL arrive pre-computed from the
    /// authentication and presentation collaborators. A taken email is a
    /// [`crate::domain::ErrorCode::DuplicateKey`] rejection.
    pub async fn register(&self, draft: NewUser) -> Result<User, Error> {
        let user = User::new(draft).map_err(|err| Error::invalid_request(err.to_string()))?;
        self.users
            .create(&user)
            .await
            .map_err(map_user_repo_error)?;

        tracing::debug!(user_id = %user.id(), "registered new user");
        Ok(user)
    }

    /// Delete the caller's account: profile first, then the user record.
    ///
    /// Either record being already absent counts as success, which keeps a
    /// retried cascade safe after a partial failure. Posts are intentionally
    /// left in place.
    pub async fn delete_account(&self, caller: UserId) -> Result<(), Error> {
        match self.profiles.delete(caller).await {
            Ok(()) => {}
            Err(ProfileRepositoryError::NotFound) => {
                tracing::debug!(user_id = %caller, "no profile to delete during cascade");
            }
            Err(err) => return Err(map_profile_repo_error(err)),
        }

        match self.users.delete(caller).await {
            Ok(()) => {}
            Err(UserRepositoryError::NotFound) => {
                tracing::debug!(user_id = %caller, "user already absent during cascade");
            }
            Err(err) => return Err(map_user_repo_error(err)),
        }

        tracing::debug!(user_id = %caller, "account cascade complete; posts retained");
        Ok(())
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
