//! Aggregate mutation core for the devlink social network.
//!
//! The crate owns three aggregates ([`domain::User`], [`domain::Profile`],
//! and [`domain::Post`]) together with the pure mutation engine for their
//! nested sub-collections (experience entries, likes, comments) and the
//! services that orchestrate read-modify-write cycles against a versioned
//! store under optimistic concurrency.
//!
//! Authentication, HTTP transport, and avatar derivation live with external
//! collaborators; callers hand the services an already-authenticated
//! [`domain::UserId`] and receive either the updated aggregate or a
//! [`domain::Error`].

pub mod domain;
pub mod outbound;
