//! Opaque aggregate version tokens for optimistic concurrency.

/// Monotonically advancing version of one stored aggregate.
///
/// Versions are threaded internally between a repository fetch and the
/// conditional replace that follows; they are never serialised to external
/// callers. Equality is the only meaningful comparison: a replace succeeds
/// exactly when the expected token matches the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version(u64);

impl Version {
    /// Version assigned to a freshly created aggregate.
    pub const fn initial() -> Self {
        Self(1)
    }

    /// Token for the state after one more successful replace.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn successive_versions_never_compare_equal() {
        let v1 = Version::initial();
        let v2 = v1.next();
        assert_ne!(v1, v2);
        assert_ne!(v2, v2.next());
    }
}
