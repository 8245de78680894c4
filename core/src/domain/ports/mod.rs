//! Repository ports for the aggregate store.
//!
//! Ports describe how the domain expects to interact with driven adapters.
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants instead of returning `anyhow::Result`. Every
//! fetch returns the aggregate together with its [`crate::domain::Version`]
//! token, and every replace is conditional on that token; the store
//! total-orders successful replaces per aggregate id.

mod post_repository;
mod profile_repository;
mod user_repository;

#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{FixturePostRepository, PostRepository, PostRepositoryError};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{
    FixtureProfileRepository, ProfileRepository, ProfileRepositoryError,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
