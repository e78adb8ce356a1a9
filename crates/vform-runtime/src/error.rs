use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormError>;

/// Errors raised while constructing a form session.
///
/// Running sessions never fail: every predicate is total, and validation
/// messages are data rather than errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl FormError {
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
