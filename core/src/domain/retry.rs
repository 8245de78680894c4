//! Retry budget for optimistic-concurrency cycles.

/// Bounded retry budget applied to each fetch-mutate-replace cycle.
///
/// Passed explicitly at service construction; there is no ambient
/// configuration. One budget covers both version conflicts and transient
/// connection failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Build a policy with the given attempt ceiling (minimum 1).
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// Number of fetch-mutate-replace attempts before surfacing contention.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}
