#![forbid(unsafe_code)]

//! Pure predicates over settled input values.
//!
//! All predicates are total: every string, including the empty one, has a
//! defined answer.

use std::sync::LazyLock;

use regex::RegexSet;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{FormError, Result};

/// Minimum username length, in user-perceived characters.
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length for the default policy, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// `true` if `username` has at least `min_len` grapheme clusters.
#[must_use]
pub fn username_valid(username: &str, min_len: usize) -> bool {
    username.graphemes(true).take(min_len).count() >= min_len
}

#[must_use]
pub fn password_empty(password: &str) -> bool {
    password.is_empty()
}

#[must_use]
pub fn passwords_equal(password: &str, password_again: &str) -> bool {
    password == password_again
}

static DEFAULT_STRENGTH: LazyLock<Result<StrengthCheck>> =
    LazyLock::new(|| PasswordPolicy::default().compile());

/// Strength check under the default [`PasswordPolicy`].
#[must_use]
pub fn password_strong(password: &str) -> bool {
    DEFAULT_STRENGTH
        .as_ref()
        .is_ok_and(|check| check.is_strong(password))
}

/// Character-class and length requirements for a strong password.
///
/// The default policy accepts exactly the strings fully matched by
/// `(?=.*[A-Z])(?=.*[0-9])(?=.*[a-z]).{6,}` where `.` excludes line
/// terminators: at least one ASCII uppercase letter, one ASCII digit and one
/// ASCII lowercase letter, six or more characters, and no line breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_len: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_len: MIN_PASSWORD_LEN,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    #[must_use]
    pub fn with_uppercase(mut self, required: bool) -> Self {
        self.require_uppercase = required;
        self
    }

    #[must_use]
    pub fn with_lowercase(mut self, required: bool) -> Self {
        self.require_lowercase = required;
        self
    }

    #[must_use]
    pub fn with_digit(mut self, required: bool) -> Self {
        self.require_digit = required;
        self
    }

    /// Compile the character classes this policy is checked against.
    pub fn compile(self) -> Result<StrengthCheck> {
        self.validate()?;
        let classes = RegexSet::new(CLASS_PATTERNS)
            .map_err(|err| FormError::invalid("password_policy", err.to_string()))?;
        Ok(StrengthCheck {
            policy: self,
            classes,
        })
    }

    /// Reject policies that would accept every password.
    pub fn validate(&self) -> Result<()> {
        let requires_class = self.require_uppercase || self.require_lowercase || self.require_digit;
        if self.min_len == 0 && !requires_class {
            return Err(FormError::invalid(
                "password_policy",
                "policy has no minimum length and no required character class",
            ));
        }
        Ok(())
    }
}

const UPPERCASE: usize = 0;
const LOWERCASE: usize = 1;
const DIGIT: usize = 2;
const LINE_TERMINATOR: usize = 3;

const CLASS_PATTERNS: [&str; 4] = [
    r"[A-Z]",
    r"[a-z]",
    r"[0-9]",
    // What `.` does not match in the strength pattern.
    r"[\n\x0B\x0C\r\x{85}\x{2028}\x{2029}]",
];

/// A [`PasswordPolicy`] with its character classes compiled.
#[derive(Debug, Clone)]
pub struct StrengthCheck {
    policy: PasswordPolicy,
    classes: RegexSet,
}

impl StrengthCheck {
    #[must_use]
    pub fn policy(&self) -> PasswordPolicy {
        self.policy
    }

    /// Whether `password` satisfies every requirement of the policy.
    #[must_use]
    pub fn is_strong(&self, password: &str) -> bool {
        let found = self.classes.matches(password);
        let policy = &self.policy;
        !found.matched(LINE_TERMINATOR)
            && password.chars().count() >= policy.min_len
            && (found.matched(UPPERCASE) || !policy.require_uppercase)
            && (found.matched(LOWERCASE) || !policy.require_lowercase)
            && (found.matched(DIGIT) || !policy.require_digit)
    }
}
