//! Interactive mode: stdin drives a session on the real clock.
//!
//! Stdin is read on a helper thread and handed to the event loop over a
//! channel; the loop waits for whichever comes first, the next line or the
//! next debounce deadline.

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use clap::Args;
use vform::{EventLoop, FormSession};
use web_time::Duration;

use crate::config::ConfigArgs;
use crate::error::Result;
use crate::script::{Field, split_field_value};

/// How long to block on stdin when no timer is pending.
const IDLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Args)]
pub struct InteractiveArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(Field, String),
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.trim() {
            "" | "show" => return Ok(Self::Show),
            "help" | "?" => return Ok(Self::Help),
            "quit" | "exit" => return Ok(Self::Quit),
            _ => {}
        }
        let (field, value) = split_field_value(line)?;
        Ok(Self::Set(field, value))
    }
}

const HELP: &str = "\
commands:
  username <value>   set the username
  password <value>   set the password
  again <value>      set the confirmation
  show               print the current outputs
  quit               leave";

fn show(session: &FormSession, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "is_valid={} status={} error={:?}",
        session.is_valid(),
        session
            .password_status()
            .map_or("pending", |status| status.as_str()),
        session.inline_error_for_password()
    )
}

pub fn run_interactive(args: InteractiveArgs) -> Result<()> {
    let config = args.config.resolve()?;
    let ev = Rc::new(EventLoop::real());
    let mut session = FormSession::new(config, ev.clone())?;

    let _valid_sub = session.subscribe_is_valid(|valid: &bool| println!("> is_valid = {valid}"));
    let _error_sub =
        session.subscribe_inline_error(|error: &String| println!("> inline_error = {error:?}"));

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("{HELP}");
    let stdout = io::stdout();
    loop {
        ev.run_due();
        let wait = ev.time_until_next().unwrap_or(IDLE_WAIT);
        match rx.recv_timeout(wait) {
            Ok(line) => match Command::parse(&line) {
                Ok(Command::Set(field, value)) => {
                    tracing::debug!(%field, "input");
                    field.apply(&session, &value);
                }
                Ok(Command::Show) => show(&session, &mut stdout.lock())?,
                Ok(Command::Help) => println!("{HELP}"),
                Ok(Command::Quit) => break,
                Err(message) => eprintln!("{message} (try `help`)"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                ev.run_until_idle();
                break;
            }
        }
    }

    show(&session, &mut stdout.lock())?;
    session.teardown();
    Ok(())
}
