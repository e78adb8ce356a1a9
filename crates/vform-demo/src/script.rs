//! Timed typing scripts.
//!
//! One step per line: `<ms> <field> [value]`. `<ms>` is the offset from the
//! start of the session, `<field>` one of `username`, `password` or `again`
//! (also `password_again`), and the value is the rest of the line with its
//! leading spaces removed; it may be empty to clear the field. Blank lines
//! and lines starting with `#` are ignored. Offsets must not decrease.
//!
//! ```text
//! # user types a name, then a password twice
//! 0    username ab
//! 150  username abc
//! 1200 password Abcdef1
//! 1500 again    Abcdef1
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use vform::FormSession;
use web_time::Duration;

use crate::error::{DemoError, Result};

/// Which raw input a step writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
    PasswordAgain,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
            Self::PasswordAgain => "again",
        }
    }

    /// Write `value` into the matching input of `session`.
    pub fn apply(self, session: &FormSession, value: &str) {
        match self {
            Self::Username => session.set_username(value),
            Self::Password => session.set_password(value),
            Self::PasswordAgain => session.set_password_again(value),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "username" | "user" => Ok(Self::Username),
            "password" | "pass" => Ok(Self::Password),
            "again" | "password_again" | "confirm" => Ok(Self::PasswordAgain),
            other => Err(format!("unknown field `{other}`")),
        }
    }
}

/// Split `"<field> [value]"` into its field and value.
pub fn split_field_value(rest: &str) -> std::result::Result<(Field, String), String> {
    let rest = rest.trim_start();
    let (name, value) = match rest.split_once(char::is_whitespace) {
        Some((name, value)) => (name, value.trim_start_matches(' ')),
        None => (rest, ""),
    };
    if name.is_empty() {
        return Err("missing field".to_string());
    }
    Ok((name.parse()?, value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub at: Duration,
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    /// Offset of the last step.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.steps.last().map_or(Duration::ZERO, |step| step.at)
    }
}

impl FromStr for Script {
    type Err = DemoError;

    fn from_str(text: &str) -> Result<Self> {
        let mut steps: Vec<Step> = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let line = line.trim_start();
            let (offset, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let ms: u64 = offset
                .parse()
                .map_err(|_| DemoError::script(line_no, format!("bad offset `{offset}`")))?;
            let at = Duration::from_millis(ms);
            if let Some(prev) = steps.last()
                && at < prev.at
            {
                return Err(DemoError::script(
                    line_no,
                    format!("offset {ms} ms is before the previous step"),
                ));
            }
            let (field, value) =
                split_field_value(rest).map_err(|message| DemoError::script(line_no, message))?;
            steps.push(Step { at, field, value });
        }
        Ok(Self { steps })
    }
}
