//! Post mutation service.
//!
//! Orchestrates fetch → pure mutation → conditional replace for every post
//! use case, retrying version conflicts and transient connection failures
//! within the configured [`RetryPolicy`]. The pure engine lives on
//! [`Post`]; this service never edits a sub-collection itself.

use std::sync::Arc;

use serde_json::json;

use crate::domain::ports::{
    PostRepository, PostRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    AuthorSnapshot, Error, ErrorCode, LikeRejection, NewPost, Post, PostId, RetryPolicy, UserId,
};

fn map_post_repo_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
        // Post ids are generated fresh at creation, so a collision is an
        // adapter defect rather than a caller mistake.
        PostRepositoryError::DuplicateId { id } => {
            Error::internal(format!("post {id} already stored"))
        }
        PostRepositoryError::VersionConflict => {
            Error::internal("unexpected post version conflict")
        }
        PostRepositoryError::NotFound => Error::not_found("post not found"),
    }
}

fn map_user_repo_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

fn like_rejection_to_error(rejection: LikeRejection) -> Error {
    match rejection {
        LikeRejection::AlreadyLiked { likers } => {
            Error::new(ErrorCode::AlreadyLiked, "post already liked")
                .with_details(json!({ "likers": likers }))
        }
        LikeRejection::NotLiked { likers } => {
            Error::new(ErrorCode::NotLiked, "post has not been liked yet")
                .with_details(json!({ "likers": likers }))
        }
    }
}

/// Service for post creation, deletion, and sub-collection mutations.
#[derive(Clone)]
pub struct PostService<P, U> {
    posts: Arc<P>,
    users: Arc<U>,
    retry: RetryPolicy,
}

impl<P, U> PostService<P, U> {
    /// Create a new service over the given repositories.
    pub fn new(posts: Arc<P>, users: Arc<U>, retry: RetryPolicy) -> Self {
        Self {
            posts,
            users,
            retry,
        }
    }
}

impl<P, U> PostService<P, U>
where
    P: PostRepository,
    U: UserRepository,
{
    /// Create a post authored by `author`, embedding the author's current
    /// name and avatar as immutable snapshots.
    pub async fn create_post(&self, author: UserId, draft: NewPost) -> Result<Post, Error> {
        if draft.title.trim().is_empty() {
            return Err(Error::invalid_request("post title must not be empty"));
        }
        if draft.text.trim().is_empty() {
            return Err(Error::invalid_request("post text must not be empty"));
        }

        let snapshot = self.author_snapshot(author).await?;
        let post = Post::new(author, snapshot, draft);
        self.posts
            .create(&post)
            .await
            .map_err(map_post_repo_error)?;
        Ok(post)
    }

    /// Delete a post. Only the author may delete it; a post that is already
    /// gone when the delete lands is treated as deleted.
    pub async fn delete_post(&self, caller: UserId, post_id: PostId) -> Result<(), Error> {
        let (post, _) = self
            .posts
            .find_by_id(post_id)
            .await
            .map_err(map_post_repo_error)?
            .ok_or_else(|| Error::not_found(format!("post {post_id} not found")))?;

        if post.author() != caller {
            return Err(Error::unauthorized("only the author may delete a post"));
        }

        match self.posts.delete(post_id).await {
            Ok(()) | Err(PostRepositoryError::NotFound) => Ok(()),
            Err(err) => Err(map_post_repo_error(err)),
        }
    }

    /// Add the caller's like. Rejects with [`ErrorCode::AlreadyLiked`]
    /// (carrying the current liker list) when the caller already likes the
    /// post.
    pub async fn like(&self, caller: UserId, post_id: PostId) -> Result<Post, Error> {
        self.mutate_post(post_id, |post| {
            post.with_like_added(caller).map_err(like_rejection_to_error)
        })
        .await
    }

    /// Remove the caller's like. Rejects with [`ErrorCode::NotLiked`] when
    /// no like by the caller exists.
    pub async fn unlike(&self, caller: UserId, post_id: PostId) -> Result<Post, Error> {
        self.mutate_post(post_id, |post| {
            post.with_like_removed(caller)
                .map_err(like_rejection_to_error)
        })
        .await
    }

    /// Add a comment by the caller, embedding the caller's current name and
    /// avatar snapshots.
    pub async fn comment(
        &self,
        caller: UserId,
        post_id: PostId,
        text: String,
    ) -> Result<Post, Error> {
        if text.trim().is_empty() {
            return Err(Error::invalid_request("comment text must not be empty"));
        }

        let snapshot = self.author_snapshot(caller).await?;
        self.mutate_post(post_id, move |post| {
            Ok(post.with_comment_added(caller, snapshot.clone(), text.clone()))
        })
        .await
    }

    /// Remove the caller's newest comment. Rejects with
    /// [`ErrorCode::NoCommentByUser`] when the caller has no comment on the
    /// post.
    pub async fn uncomment(&self, caller: UserId, post_id: PostId) -> Result<Post, Error> {
        self.mutate_post(post_id, |post| {
            post.with_comment_removed_by(caller).map_err(|_| {
                Error::new(ErrorCode::NoCommentByUser, "no comment by user on this post")
            })
        })
        .await
    }

    async fn author_snapshot(&self, user_id: UserId) -> Result<AuthorSnapshot, Error> {
        let (user, _) = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;

        Ok(AuthorSnapshot {
            name: user.name().to_owned(),
            avatar_url: user.avatar_url().clone(),
        })
    }

    /// One bounded fetch-mutate-replace cycle.
    ///
    /// Version conflicts and connection failures consume attempts from the
    /// shared budget; domain rejections and hard failures are terminal on
    /// the first occurrence.
    async fn mutate_post<F>(&self, id: PostId, mutate: F) -> Result<Post, Error>
    where
        F: Fn(&Post) -> Result<Post, Error> + Send + Sync,
    {
        let mut last_transient = Error::contention("post mutation retry budget exhausted");

        for attempt in 1..=self.retry.max_attempts() {
            let fetched = match self.posts.find_by_id(id).await {
                Ok(found) => found,
                Err(PostRepositoryError::Connection { message }) => {
                    tracing::debug!(
                        post_id = %id,
                        attempt,
                        %message,
                        "post fetch hit transient failure; retrying"
                    );
                    last_transient = Error::service_unavailable(format!(
                        "post repository unavailable: {message}"
                    ));
                    continue;
                }
                Err(err) => return Err(map_post_repo_error(err)),
            };

            let (post, version) =
                fetched.ok_or_else(|| Error::not_found(format!("post {id} not found")))?;
            let next = mutate(&post)?;

            match self.posts.replace(&next, version).await {
                Ok(_) => return Ok(next),
                Err(PostRepositoryError::VersionConflict) => {
                    tracing::debug!(post_id = %id, attempt, "post replace conflicted; retrying");
                    last_transient =
                        Error::contention("post mutation retry budget exhausted");
                }
                Err(PostRepositoryError::Connection { message }) => {
                    tracing::debug!(
                        post_id = %id,
                        attempt,
                        %message,
                        "post replace hit transient failure; retrying"
                    );
                    last_transient = Error::service_unavailable(format!(
                        "post repository unavailable: {message}"
                    ));
                }
                Err(err) => return Err(map_post_repo_error(err)),
            }
        }

        tracing::warn!(
            post_id = %id,
            attempts = self.retry.max_attempts(),
            "post mutation retry budget exhausted"
        );
        Err(last_transient)
    }
}

#[cfg(test)]
#[path = "post_service_tests.rs"]
mod tests;
