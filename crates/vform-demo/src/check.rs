//! One-shot validation of a single input triple.

use std::io::{self, Write};

use clap::Args;
use vform::{FormConfig, PasswordStatus};

use crate::config::ConfigArgs;
use crate::error::{DemoError, Result};
use crate::replay::{FinalState, replay};
use crate::script::{Field, Script, Step};

/// Exit code for a form that does not validate.
pub const EXIT_INVALID: i32 = 2;

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[arg(long, default_value = "")]
    pub username: String,

    #[arg(long, default_value = "")]
    pub password: String,

    /// Confirmation; defaults to the password.
    #[arg(long = "password-again")]
    pub password_again: Option<String>,

    /// Print the final state as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Open a form, let it settle untouched, type the three values at once and
/// report where it settles.
pub fn check(
    username: &str,
    password: &str,
    password_again: &str,
    config: FormConfig,
) -> Result<FinalState> {
    let at = config.settle_time();
    let steps = [
        (Field::Username, username),
        (Field::Password, password),
        (Field::PasswordAgain, password_again),
    ]
    .into_iter()
    .map(|(field, value)| Step {
        at,
        field,
        value: value.to_string(),
    })
    .collect();
    let report = replay(&Script { steps }, config)?;
    Ok(report.final_state)
}

/// Why `state` is not submittable, or `None` if it is.
///
/// A password problem is reported even when the inline error is still
/// hidden because the password fields were never touched.
#[must_use]
pub fn rejection(state: &FinalState) -> Option<String> {
    if state.is_valid {
        return None;
    }
    if !state.inline_error.is_empty() {
        return Some(state.inline_error.clone());
    }
    let failing_password = state
        .status
        .as_deref()
        .and_then(|name| PasswordStatus::ALL.into_iter().find(|s| s.as_str() == name))
        .filter(|status| !status.is_valid());
    if let Some(status) = failing_password {
        return Some(status.message().to_string());
    }
    if state.username_valid == Some(false) {
        return Some("Username is too short".to_string());
    }
    Some("Form is not valid".to_string())
}

pub fn run_check(args: CheckArgs) -> Result<()> {
    let config = args.config.resolve()?;
    let again = args.password_again.as_deref().unwrap_or(&args.password);
    let state = check(&args.username, &args.password, again, config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &state)?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "is_valid={} status={} error={:?}",
            state.is_valid,
            state.status.as_deref().unwrap_or("none"),
            state.inline_error
        )?;
    }
    match rejection(&state) {
        None => Ok(()),
        Some(reason) => Err(DemoError::exit(EXIT_INVALID, format!("invalid: {reason}"))),
    }
}
