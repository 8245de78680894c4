//! Post aggregate: likes and comments live here as owned sub-collections.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::UserId;

/// Stable post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of one comment, unique within its owning post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One like. A user appears at most once in a post's like list, so the user
/// id is the entry's whole identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user: UserId,
}

/// Author identity embedded as an immutable snapshot at creation time.
///
/// Supplied by the presentation collaborator (or read from the user record);
/// later changes to the author's name or avatar do not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSnapshot {
    pub name: String,
    pub avatar_url: Url,
}

/// One comment nested in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Comment {
    id: CommentId,
    author: UserId,
    author_name: String,
    avatar_url: Url,
    text: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Identifier, unique within the owning post.
    pub const fn id(&self) -> CommentId {
        self.id
    }

    /// Weak reference to the authoring user.
    pub const fn author(&self) -> UserId {
        self.author
    }

    /// Comment body.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Creation timestamp.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Fields supplied when creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub text: String,
}

/// Rejections produced by the pure like mutations.
///
/// Both variants carry the current liker list so callers can surface it
/// alongside the rejection message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LikeRejection {
    /// The user already appears in the like list.
    #[error("post already liked")]
    AlreadyLiked { likers: Vec<UserId> },
    /// The user does not appear in the like list.
    #[error("post has not been liked yet")]
    NotLiked { likers: Vec<UserId> },
}

/// Rejections produced by the pure comment mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentRejection {
    /// The user has no comment on this post.
    #[error("no comment by user on this post")]
    NoCommentByUser,
}

/// A post authored by a user.
///
/// ## Invariants
/// - `likes` holds at most one entry per user id; insertion order is
///   preserved, newest first.
/// - Comment ids are unique within the post; no uniqueness constraint holds
///   across comment authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Post {
    id: PostId,
    author: UserId,
    title: String,
    text: String,
    author_name: String,
    avatar_url: Url,
    created_at: DateTime<Utc>,
    likes: Vec<Like>,
    comments: Vec<Comment>,
}

impl Post {
    /// Build a new post with a fresh identifier and empty sub-collections.
    pub fn new(author: UserId, snapshot: AuthorSnapshot, draft: NewPost) -> Self {
        Self {
            id: PostId::random(),
            author,
            title: draft.title,
            text: draft.text,
            author_name: snapshot.name,
            avatar_url: snapshot.avatar_url,
            created_at: Utc::now(),
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Stable post identifier.
    pub const fn id(&self) -> PostId {
        self.id
    }

    /// Weak reference to the authoring user.
    pub const fn author(&self) -> UserId {
        self.author
    }

    /// Post title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Post body.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Author name snapshot taken at creation time.
    pub fn author_name(&self) -> &str {
        self.author_name.as_str()
    }

    /// Author avatar snapshot taken at creation time.
    pub const fn avatar_url(&self) -> &Url {
        &self.avatar_url
    }

    /// Creation timestamp.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Likes, newest first.
    pub fn likes(&self) -> &[Like] {
        self.likes.as_slice()
    }

    /// Comments, newest first.
    pub fn comments(&self) -> &[Comment] {
        self.comments.as_slice()
    }

    fn likers(&self) -> Vec<UserId> {
        self.likes.iter().map(|like| like.user).collect()
    }

    /// Copy with a like by `user` prepended.
    ///
    /// Rejects [`LikeRejection::AlreadyLiked`] when the user already appears
    /// in the list, keeping the at-most-one-like-per-user invariant.
    pub fn with_like_added(&self, user: UserId) -> Result<Self, LikeRejection> {
        if self.likes.iter().any(|like| like.user == user) {
            return Err(LikeRejection::AlreadyLiked {
                likers: self.likers(),
            });
        }

        let mut next = self.clone();
        next.likes.insert(0, Like { user });
        Ok(next)
    }

    /// Copy with the like by `user` removed.
    ///
    /// Rejects [`LikeRejection::NotLiked`] when the user is absent. The
    /// uniqueness invariant guarantees exactly one matching entry.
    pub fn with_like_removed(&self, user: UserId) -> Result<Self, LikeRejection> {
        let position = self
            .likes
            .iter()
            .position(|like| like.user == user)
            .ok_or_else(|| LikeRejection::NotLiked {
                likers: self.likers(),
            })?;

        let mut next = self.clone();
        next.likes.remove(position);
        Ok(next)
    }

    /// Copy with a new comment prepended.
    ///
    /// Always succeeds. The comment receives a fresh id, collision-checked
    /// against every id currently in the post.
    pub fn with_comment_added(
        &self,
        author: UserId,
        snapshot: AuthorSnapshot,
        text: String,
    ) -> Self {
        let mut id = CommentId::random();
        while self.comments.iter().any(|comment| comment.id == id) {
            id = CommentId::random();
        }

        let mut next = self.clone();
        next.comments.insert(0, Comment {
            id,
            author,
            author_name: snapshot.name,
            avatar_url: snapshot.avatar_url,
            text,
            created_at: Utc::now(),
        });
        next
    }

    /// Copy with the first comment (in current order) authored by `user`
    /// removed.
    ///
    /// At most one comment is removed even when the user authored several.
    /// Comments are stored newest first, so the newest comment by the user
    /// goes. Rejects [`CommentRejection::NoCommentByUser`] when the user has
    /// no comment.
    pub fn with_comment_removed_by(&self, user: UserId) -> Result<Self, CommentRejection> {
        let position = self
            .comments
            .iter()
            .position(|comment| comment.author == user)
            .ok_or(CommentRejection::NoCommentByUser)?;

        let mut next = self.clone();
        next.comments.remove(position);
        Ok(next)
    }
}
