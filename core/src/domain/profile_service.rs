//! Profile mutation service.
//!
//! Covers the profile upsert and the experience sub-collection operations.
//! The upsert is create-or-update: a racing create that loses to a
//! concurrent first submission falls back to the update path on retry.

use std::sync::Arc;

use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::{
    Error, ExperienceDraft, ExperienceId, Profile, ProfileFields, RetryPolicy, UserId,
};

fn map_profile_repo_error(error: ProfileRepositoryError) -> Error {
    match error {
        ProfileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("profile repository unavailable: {message}"))
        }
        ProfileRepositoryError::Query { message } => {
            Error::internal(format!("profile repository error: {message}"))
        }
        ProfileRepositoryError::DuplicateProfile { user_id } => {
            Error::duplicate_key(format!("user {user_id} already has a profile"))
        }
        ProfileRepositoryError::VersionConflict => {
            Error::internal("unexpected profile version conflict")
        }
        ProfileRepositoryError::NotFound => Error::not_found("profile not found"),
    }
}

/// Service for profile upserts and experience mutations.
#[derive(Clone)]
pub struct ProfileService<P> {
    profiles: Arc<P>,
    retry: RetryPolicy,
}

impl<P> ProfileService<P> {
    /// Create a new service over the given repository.
    pub fn new(profiles: Arc<P>, retry: RetryPolicy) -> Self {
        Self { profiles, retry }
    }
}

impl<P> ProfileService<P>
where
    P: ProfileRepository,
{
    /// Create the caller's profile or partially update an existing one.
    ///
    /// Fields absent from `fields` keep their stored values; the experience
    /// collection is never touched by an upsert.
    pub async fn upsert_profile(
        &self,
        caller: UserId,
        fields: ProfileFields,
    ) -> Result<Profile, Error> {
        let mut last_transient = Error::contention("profile upsert retry budget exhausted");

        for attempt in 1..=self.retry.max_attempts() {
            let fetched = match self.profiles.find_by_user_id(caller).await {
                Ok(found) => found,
                Err(ProfileRepositoryError::Connection { message }) => {
                    tracing::debug!(
                        user_id = %caller,
                        attempt,
                        %message,
                        "profile fetch hit transient failure; retrying"
                    );
                    last_transient = Error::service_unavailable(format!(
                        "profile repository unavailable: {message}"
                    ));
                    continue;
                }
                Err(err) => return Err(map_profile_repo_error(err)),
            };

            match fetched {
                None => {
                    let profile = Profile::new(caller, fields.clone());
                    match self.profiles.create(&profile).await {
                        Ok(_) => return Ok(profile),
                        // Lost the create race; the update path wins next
                        // time around.
                        Err(ProfileRepositoryError::DuplicateProfile { .. }) => {
                            tracing::debug!(
                                user_id = %caller,
                                attempt,
                                "profile appeared concurrently; retrying as update"
                            );
                            last_transient =
                                Error::contention("profile upsert retry budget exhausted");
                        }
                        Err(err) => return Err(map_profile_repo_error(err)),
                    }
                }
                Some((existing, version)) => {
                    let next = existing.with_fields_applied(fields.clone());
                    match self.profiles.replace(&next, version).await {
                        Ok(_) => return Ok(next),
                        Err(ProfileRepositoryError::VersionConflict) => {
                            tracing::debug!(
                                user_id = %caller,
                                attempt,
                                "profile replace conflicted; retrying"
                            );
                            last_transient =
                                Error::contention("profile upsert retry budget exhausted");
                        }
                        Err(ProfileRepositoryError::Connection { message }) => {
                            tracing::debug!(
                                user_id = %caller,
                                attempt,
                                %message,
                                "profile replace hit transient failure; retrying"
                            );
                            last_transient = Error::service_unavailable(format!(
                                "profile repository unavailable: {message}"
                            ));
                        }
                        Err(err) => return Err(map_profile_repo_error(err)),
                    }
                }
            }
        }

        tracing::warn!(
            user_id = %caller,
            attempts = self.retry.max_attempts(),
            "profile upsert retry budget exhausted"
        );
        Err(last_transient)
    }

    /// Prepend a new experience entry to the caller's profile.
    pub async fn add_experience(
        &self,
        caller: UserId,
        draft: ExperienceDraft,
    ) -> Result<Profile, Error> {
        if draft.title.trim().is_empty() {
            return Err(Error::invalid_request("experience title must not be empty"));
        }
        if draft.company.trim().is_empty() {
            return Err(Error::invalid_request(
                "experience company must not be empty",
            ));
        }

        self.mutate_profile(caller, move |profile| {
            Ok(profile.with_experience_added(draft.clone()))
        })
        .await
    }

    /// Remove the experience entry with the given id from the caller's
    /// profile. An absent id is a [`crate::domain::ErrorCode::NotFound`]
    /// rejection, never a silent no-op.
    pub async fn remove_experience(
        &self,
        caller: UserId,
        id: ExperienceId,
    ) -> Result<Profile, Error> {
        self.mutate_profile(caller, move |profile| {
            profile
                .with_experience_removed(id)
                .map_err(|rejection| Error::not_found(rejection.to_string()))
        })
        .await
    }

    /// One bounded fetch-mutate-replace cycle against the caller's profile.
    async fn mutate_profile<F>(&self, caller: UserId, mutate: F) -> Result<Profile, Error>
    where
        F: Fn(&Profile) -> Result<Profile, Error> + Send + Sync,
    {
        let mut last_transient = Error::contention("profile mutation retry budget exhausted");

        for attempt in 1..=self.retry.max_attempts() {
            let fetched = match self.profiles.find_by_user_id(caller).await {
                Ok(found) => found,
                Err(ProfileRepositoryError::Connection { message }) => {
                    tracing::debug!(
                        user_id = %caller,
                        attempt,
                        %message,
                        "profile fetch hit transient failure; retrying"
                    );
                    last_transient = Error::service_unavailable(format!(
                        "profile repository unavailable: {message}"
                    ));
                    continue;
                }
                Err(err) => return Err(map_profile_repo_error(err)),
            };

            let (profile, version) = fetched.ok_or_else(|| {
                Error::not_found(format!("no profile found for user {caller}"))
            })?;
            let next = mutate(&profile)?;

            match self.profiles.replace(&next, version).await {
                Ok(_) => return Ok(next),
                Err(ProfileRepositoryError::VersionConflict) => {
                    tracing::debug!(
                        user_id = %caller,
                        attempt,
                        "profile replace conflicted; retrying"
                    );
                    last_transient =
                        Error::contention("profile mutation retry budget exhausted");
                }
                Err(ProfileRepositoryError::Connection { message }) => {
                    tracing::debug!(
                        user_id = %caller,
                        attempt,
                        %message,
                        "profile replace hit transient failure; retrying"
                    );
                    last_transient = Error::service_unavailable(format!(
                        "profile repository unavailable: {message}"
                    ));
                }
                Err(err) => return Err(map_profile_repo_error(err)),
            }
        }

        tracing::warn!(
            user_id = %caller,
            attempts = self.retry.max_attempts(),
            "profile mutation retry budget exhausted"
        );
        Err(last_transient)
    }
}

#[cfg(test)]
#[path = "profile_service_tests.rs"]
mod tests;
