#![forbid(unsafe_code)]

//! Command-line driver for vform sign-up sessions.

pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod replay;
pub mod script;

pub use cli::{run, run_from_env};
pub use error::{DemoError, Result};
