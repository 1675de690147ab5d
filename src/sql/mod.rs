//! SQL Guard Pipeline - extraction, policy validation, limit enforcement
//!
//! A completion is untrusted text. It moves through a one-way ladder of
//! newtypes, and each rung can only be minted by the stage that owns it:
//!
//! `extract` -> [`CandidateSql`] -> `validate` -> [`ValidatedSql`]
//! -> `bound` -> [`BoundedSql`]
//!
//! Only a [`BoundedSql`] is accepted by the executor, so a statement that
//! skipped validation or limiting cannot reach the database by construction.

pub mod extract;
pub mod limit;
pub mod policy;

pub use extract::extract_statement;
pub use limit::LimitEnforcer;
pub use policy::PolicyValidator;

/// A statement body recovered from a completion; may still be unsafe
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSql(pub(crate) String);

/// A candidate that passed every validator stage and reparsed cleanly
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedSql(pub(crate) String);

/// A validated statement with a row ceiling guaranteed present
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundedSql(pub(crate) String);

impl CandidateSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValidatedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl BoundedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CandidateSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ValidatedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for BoundedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
