//! Domain aggregates, the pure mutation engine, and the mutation services.
//!
//! Aggregates (`User`, `Profile`, `Post`) are the units of storage and
//! versioning; their nested sub-collections (experience, likes, comments)
//! have no identity outside the owning aggregate and are edited only through
//! the pure methods on the aggregate types. Services orchestrate the
//! fetch-mutate-replace cycle against the repository [`ports`] under
//! optimistic concurrency.

pub mod error;
pub mod ports;
pub mod post;
pub mod profile;
pub mod retry;
pub mod user;
pub mod version;

mod account_service;
mod post_service;
mod profile_service;

pub use self::account_service::AccountService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::post::{
    AuthorSnapshot, Comment, CommentId, CommentRejection, Like, LikeRejection, NewPost, Post,
    PostId,
};
pub use self::post_service::PostService;
pub use self::profile::{
    Experience, ExperienceDraft, ExperienceId, ExperienceRejection, Profile, ProfileFields,
    SocialProvider,
};
pub use self::profile_service::ProfileService;
pub use self::retry::RetryPolicy;
pub use self::user::{EmailAddress, NewUser, PasswordHash, User, UserId, UserValidationError};
pub use self::version::Version;

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, Error>;
