//! Error types for relsid-core.
//!
//! All fallible operations in this crate return [`RelsidResult`]. The
//! relativization strategies and the uniquifying registry are total over
//! valid parsed identifiers; the only failure sources are identifier parsing
//! and template resolution.

use thiserror::Error;

/// Crate-wide result alias.
pub type RelsidResult<T> = Result<T, RelsidError>;

/// Errors produced by relsid-core.
#[derive(Debug, Error)]
pub enum RelsidError {
    /// The input string is not a well-formed LSID.
    #[error("invalid LSID: {0}")]
    InvalidLsid(String),

    /// A template contains a placeholder no substitution provider can
    /// resolve. Unrecoverable for that template; callers must propagate it.
    #[error("template not fully resolved: {0}")]
    UnresolvedTemplate(String),

    /// Substitution passes hit the iteration ceiling with placeholders still
    /// present, which indicates a replacement cycle.
    #[error("infinite replacement: {0}")]
    InfiniteReplacement(String),

    /// A caller-supplied value violates an argument contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RelsidError {
    pub fn invalid_lsid(msg: impl Into<String>) -> Self {
        RelsidError::InvalidLsid(msg.into())
    }

    pub fn unresolved_template(msg: impl Into<String>) -> Self {
        RelsidError::UnresolvedTemplate(msg.into())
    }

    pub fn infinite_replacement(msg: impl Into<String>) -> Self {
        RelsidError::InfiniteReplacement(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        RelsidError::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = RelsidError::invalid_lsid("missing urn:lsid prefix");
        assert!(err.to_string().contains("missing urn:lsid prefix"));

        let err = RelsidError::unresolved_template("no substitution for ${X}");
        assert!(err.to_string().starts_with("template not fully resolved"));
    }
}
