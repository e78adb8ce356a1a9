//! Script replay on virtual time.

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use clap::Args;
use serde::Serialize;
use vform::{EventLoop, FormConfig, FormSession, LabClock};

use crate::config::ConfigArgs;
use crate::error::Result;
use crate::script::Script;

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Typing script, one `<ms> <field> [value]` step per line.
    pub script: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputValue {
    IsValid(bool),
    InlineError(String),
}

/// One change of a published output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputChange {
    pub at_ms: u64,
    #[serde(flatten)]
    pub value: OutputValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalState {
    pub is_valid: bool,
    pub inline_error: String,
    pub status: Option<String>,
    pub username_valid: Option<bool>,
}

impl FinalState {
    fn capture(session: &FormSession) -> Self {
        Self {
            is_valid: session.is_valid(),
            inline_error: session.inline_error_for_password(),
            status: session.password_status().map(|s| s.as_str().to_string()),
            username_valid: session.signals().username_valid.latest(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub session: u64,
    pub changes: Vec<OutputChange>,
    pub settled_at_ms: u64,
    #[serde(rename = "final")]
    pub final_state: FinalState,
}

fn millis(clock: &LabClock) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Run `script` against a fresh session on a lab clock and collect every
/// change of the published outputs until the graph is idle.
pub fn replay(script: &Script, config: FormConfig) -> Result<ReplayReport> {
    let clock = LabClock::new();
    let ev = Rc::new(EventLoop::lab(&clock));
    let start = clock.now();
    let mut session = FormSession::new(config, ev.clone())?;

    let changes = Rc::new(RefCell::new(Vec::new()));
    let _valid_sub = {
        let changes = Rc::clone(&changes);
        let clock = clock.clone();
        session.subscribe_is_valid(move |valid: &bool| {
            changes.borrow_mut().push(OutputChange {
                at_ms: millis(&clock),
                value: OutputValue::IsValid(*valid),
            });
        })
    };
    let _error_sub = {
        let changes = Rc::clone(&changes);
        let clock = clock.clone();
        session.subscribe_inline_error(move |error: &String| {
            changes.borrow_mut().push(OutputChange {
                at_ms: millis(&clock),
                value: OutputValue::InlineError(error.clone()),
            });
        })
    };

    for step in &script.steps {
        ev.advance_to(start + step.at);
        tracing::debug!(
            at_ms = millis(&clock),
            field = %step.field,
            "replay step"
        );
        step.field.apply(&session, &step.value);
    }
    ev.run_until_idle();

    let report = ReplayReport {
        session: session.id(),
        changes: changes.borrow().clone(),
        settled_at_ms: millis(&clock),
        final_state: FinalState::capture(&session),
    };
    session.teardown();
    Ok(report)
}

pub fn render_text(report: &ReplayReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "session {}", report.session)?;
    for change in &report.changes {
        match &change.value {
            OutputValue::IsValid(valid) => {
                writeln!(out, "{:>7} ms  is_valid      {valid}", change.at_ms)?;
            }
            OutputValue::InlineError(error) => {
                writeln!(out, "{:>7} ms  inline_error  {error:?}", change.at_ms)?;
            }
        }
    }
    let state = &report.final_state;
    writeln!(
        out,
        "settled at {} ms: is_valid={} status={} error={:?}",
        report.settled_at_ms,
        state.is_valid,
        state.status.as_deref().unwrap_or("none"),
        state.inline_error
    )
}

pub fn run_replay(args: ReplayArgs) -> Result<()> {
    let config = args.config.resolve()?;
    let script = Script::load(&args.script)?;
    tracing::debug!(steps = script.steps.len(), path = %args.script.display(), "loaded script");
    let report = replay(&script, config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        render_text(&report, &mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> ReplayReport {
        replay(&script.parse().unwrap(), FormConfig::default()).unwrap()
    }

    #[test]
    fn valid_signup_timeline() {
        let report = run("\
1000 username abc
1000 password Abcdef1
1000 again Abcdef1
");
        // The confirmation pair settles before the password does.
        assert_eq!(
            report.changes,
            vec![
                OutputChange {
                    at_ms: 1200,
                    value: OutputValue::InlineError("Password cannot be empty".to_string()),
                },
                OutputChange {
                    at_ms: 1800,
                    value: OutputValue::IsValid(true),
                },
                OutputChange {
                    at_ms: 1800,
                    value: OutputValue::InlineError(String::new()),
                },
            ]
        );
        assert_eq!(report.settled_at_ms, 1800);
        assert!(report.final_state.is_valid);
        assert_eq!(report.final_state.status.as_deref(), Some("valid"));
    }

    #[test]
    fn mismatch_reported_after_confirmation_settles() {
        let report = run("\
1000 username abc
1000 password Abcdef1
2000 again Abcdef2
");
        let errors: Vec<_> = report
            .changes
            .iter()
            .filter_map(|c| match &c.value {
                OutputValue::InlineError(e) => Some((c.at_ms, e.as_str())),
                OutputValue::IsValid(_) => None,
            })
            .collect();
        assert_eq!(
            errors,
            vec![
                (1200, "Password cannot be empty"),
                (1800, "Passwords do not match"),
            ]
        );
        assert!(!report.final_state.is_valid);
    }

    #[test]
    fn empty_script_settles_untouched_form() {
        let report = run("");
        assert!(report.changes.is_empty());
        assert_eq!(report.settled_at_ms, 800);
        assert_eq!(report.final_state.status.as_deref(), Some("empty"));
        assert_eq!(report.final_state.username_valid, Some(false));
    }

    #[test]
    fn json_shape() {
        let report = run("1000 username abc\n1000 password Abcdef1\n1000 again Abcdef1\n");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["changes"][0]["at_ms"], 1200);
        assert_eq!(value["changes"][0]["inline_error"], "Password cannot be empty");
        assert_eq!(value["changes"][1]["is_valid"], true);
        assert_eq!(value["final"]["status"], "valid");
    }

    #[test]
    fn text_rendering() {
        let report = run("1000 username abc\n1000 password abcdef1\n1000 again abcdef1\n");
        let mut out = Vec::new();
        render_text(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("inline_error  \"Password is too weak\""), "{text}");
        assert!(text.contains("status=not_strong_enough"), "{text}");
    }
}
