#![forbid(unsafe_code)]

//! Password status classification and the inline error table.

use std::fmt;

/// Outcome of the password checks, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordStatus {
    Empty,
    NotStrongEnough,
    RepeatPasswordWrong,
    Valid,
}

impl PasswordStatus {
    /// All variants in precedence order.
    pub const ALL: [Self; 4] = [
        Self::Empty,
        Self::NotStrongEnough,
        Self::RepeatPasswordWrong,
        Self::Valid,
    ];

    /// Fold the three password predicates into a status. First match wins:
    ///
    /// 1. `empty` → [`Empty`](Self::Empty)
    /// 2. `!strong` → [`NotStrongEnough`](Self::NotStrongEnough)
    /// 3. `!confirmed` → [`RepeatPasswordWrong`](Self::RepeatPasswordWrong)
    /// 4. otherwise [`Valid`](Self::Valid)
    #[must_use]
    pub const fn classify(empty: bool, strong: bool, confirmed: bool) -> Self {
        if empty {
            Self::Empty
        } else if !strong {
            Self::NotStrongEnough
        } else if !confirmed {
            Self::RepeatPasswordWrong
        } else {
            Self::Valid
        }
    }

    /// Inline message shown under the password fields.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Empty => "Password cannot be empty",
            Self::NotStrongEnough => "Password is too weak",
            Self::RepeatPasswordWrong => "Passwords do not match",
            Self::Valid => "",
        }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Stable snake_case name, used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NotStrongEnough => "not_strong_enough",
            Self::RepeatPasswordWrong => "repeat_password_wrong",
            Self::Valid => "valid",
        }
    }
}

impl fmt::Display for PasswordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
