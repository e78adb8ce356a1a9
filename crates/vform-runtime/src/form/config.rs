#![forbid(unsafe_code)]

//! Session configuration.
//!
//! [`FormConfig::default()`] reproduces the stock sign-up form: 800 ms quiet
//! periods on username and password, 200 ms on the password pair, usernames
//! of at least three characters, and the default [`PasswordPolicy`].

use web_time::Duration;

use super::predicates::{MIN_USERNAME_LEN, PasswordPolicy};
use crate::error::{FormError, Result};

/// Longest quiet period accepted by [`FormConfig::validate`].
pub const MAX_QUIET_PERIOD: Duration = Duration::from_secs(10);

/// Which predicate drives the first slot of the status classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyCheck {
    /// The settled password being empty.
    #[default]
    PasswordEmpty,
    /// The equality of password and confirmation, as the legacy form wired
    /// it. "Password cannot be empty" is then reported whenever both fields
    /// match, including a matching non-empty pair, and the status can never
    /// reach [`Valid`](super::PasswordStatus::Valid).
    PasswordsEqual,
}

/// Tunables for a [`FormSession`](super::FormSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Quiet period before a username edit settles.
    pub username_quiet: Duration,
    /// Quiet period before a password edit settles.
    pub password_quiet: Duration,
    /// Quiet period for the (password, confirmation) pair.
    pub confirmation_quiet: Duration,
    /// Minimum username length in grapheme clusters.
    pub min_username_len: usize,
    pub password_policy: PasswordPolicy,
    pub empty_check: EmptyCheck,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            username_quiet: Duration::from_millis(800),
            password_quiet: Duration::from_millis(800),
            confirmation_quiet: Duration::from_millis(200),
            min_username_len: MIN_USERNAME_LEN,
            password_policy: PasswordPolicy::default(),
            empty_check: EmptyCheck::default(),
        }
    }
}

impl FormConfig {
    #[must_use]
    pub fn with_username_quiet(mut self, quiet: Duration) -> Self {
        self.username_quiet = quiet;
        self
    }

    #[must_use]
    pub fn with_password_quiet(mut self, quiet: Duration) -> Self {
        self.password_quiet = quiet;
        self
    }

    #[must_use]
    pub fn with_confirmation_quiet(mut self, quiet: Duration) -> Self {
        self.confirmation_quiet = quiet;
        self
    }

    #[must_use]
    pub fn with_min_username_len(mut self, len: usize) -> Self {
        self.min_username_len = len;
        self
    }

    #[must_use]
    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    #[must_use]
    pub fn with_empty_check(mut self, check: EmptyCheck) -> Self {
        self.empty_check = check;
        self
    }

    /// Time after the last keystroke by which every output has settled.
    #[must_use]
    pub fn settle_time(&self) -> Duration {
        self.username_quiet
            .max(self.password_quiet)
            .max(self.confirmation_quiet)
    }

    /// Check the configuration before a session is built from it.
    pub fn validate(&self) -> Result<()> {
        for (field, quiet) in [
            ("username_quiet", self.username_quiet),
            ("password_quiet", self.password_quiet),
            ("confirmation_quiet", self.confirmation_quiet),
        ] {
            if quiet > MAX_QUIET_PERIOD {
                return Err(FormError::invalid(
                    field,
                    format!(
                        "{} ms exceeds the {} ms maximum",
                        quiet.as_millis(),
                        MAX_QUIET_PERIOD.as_millis()
                    ),
                ));
            }
        }
        if self.min_username_len == 0 {
            return Err(FormError::invalid("min_username_len", "must be at least 1"));
        }
        self.password_policy.validate()
    }
}
