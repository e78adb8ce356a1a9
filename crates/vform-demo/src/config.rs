//! Layered session configuration for the demo commands.
//!
//! Built-in defaults, then an optional JSON file (`--config` /
//! `VFORM_CONFIG`), then individual flags or their `VFORM_*` environment
//! variables. The merged result is validated before a session is built.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Deserialize;
use vform::{EmptyCheck, FormConfig, PasswordPolicy};
use web_time::Duration;

use crate::error::{DemoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyCheckArg {
    /// Report "cannot be empty" for an empty password.
    PasswordEmpty,
    /// Report "cannot be empty" whenever password and confirmation match.
    PasswordsEqual,
}

impl From<EmptyCheckArg> for EmptyCheck {
    fn from(value: EmptyCheckArg) -> Self {
        match value {
            EmptyCheckArg::PasswordEmpty => Self::PasswordEmpty,
            EmptyCheckArg::PasswordsEqual => Self::PasswordsEqual,
        }
    }
}

/// Password policy section of a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    pub min_len: Option<usize>,
    pub require_uppercase: Option<bool>,
    pub require_lowercase: Option<bool>,
    pub require_digit: Option<bool>,
}

impl PolicyFile {
    fn apply(&self, mut policy: PasswordPolicy) -> PasswordPolicy {
        if let Some(min_len) = self.min_len {
            policy = policy.with_min_len(min_len);
        }
        if let Some(required) = self.require_uppercase {
            policy = policy.with_uppercase(required);
        }
        if let Some(required) = self.require_lowercase {
            policy = policy.with_lowercase(required);
        }
        if let Some(required) = self.require_digit {
            policy = policy.with_digit(required);
        }
        policy
    }
}

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub username_quiet_ms: Option<u64>,
    pub password_quiet_ms: Option<u64>,
    pub confirmation_quiet_ms: Option<u64>,
    pub min_username_len: Option<usize>,
    pub empty_check: Option<EmptyCheckArg>,
    #[serde(default)]
    pub password: PolicyFile,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| DemoError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&self, mut config: FormConfig) -> FormConfig {
        if let Some(ms) = self.username_quiet_ms {
            config = config.with_username_quiet(Duration::from_millis(ms));
        }
        if let Some(ms) = self.password_quiet_ms {
            config = config.with_password_quiet(Duration::from_millis(ms));
        }
        if let Some(ms) = self.confirmation_quiet_ms {
            config = config.with_confirmation_quiet(Duration::from_millis(ms));
        }
        if let Some(len) = self.min_username_len {
            config = config.with_min_username_len(len);
        }
        if let Some(check) = self.empty_check {
            config = config.with_empty_check(check.into());
        }
        let policy = self.password.apply(config.password_policy);
        config.with_password_policy(policy)
    }
}

/// Configuration flags shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// JSON config file.
    #[arg(long, env = "VFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Username quiet period in milliseconds.
    #[arg(long, env = "VFORM_USERNAME_QUIET_MS")]
    pub username_quiet_ms: Option<u64>,

    /// Password quiet period in milliseconds.
    #[arg(long, env = "VFORM_PASSWORD_QUIET_MS")]
    pub password_quiet_ms: Option<u64>,

    /// Quiet period for the password/confirmation pair in milliseconds.
    #[arg(long, env = "VFORM_CONFIRMATION_QUIET_MS")]
    pub confirmation_quiet_ms: Option<u64>,

    /// Minimum username length.
    #[arg(long, env = "VFORM_MIN_USERNAME_LEN")]
    pub min_username_len: Option<usize>,

    /// Minimum password length.
    #[arg(long, env = "VFORM_MIN_PASSWORD_LEN")]
    pub min_password_len: Option<usize>,

    /// What "Password cannot be empty" is reported for.
    #[arg(long, value_enum, env = "VFORM_EMPTY_CHECK")]
    pub empty_check: Option<EmptyCheckArg>,
}

impl ConfigArgs {
    /// Merge defaults, the config file and the flags, then validate.
    pub fn resolve(&self) -> Result<FormConfig> {
        let mut config = FormConfig::default();
        if let Some(path) = &self.config {
            config = ConfigFile::load(path)?.apply(config);
            tracing::debug!(path = %path.display(), "loaded config file");
        }
        let overrides = ConfigFile {
            username_quiet_ms: self.username_quiet_ms,
            password_quiet_ms: self.password_quiet_ms,
            confirmation_quiet_ms: self.confirmation_quiet_ms,
            min_username_len: self.min_username_len,
            empty_check: self.empty_check,
            password: PolicyFile {
                min_len: self.min_password_len,
                ..PolicyFile::default()
            },
        };
        config = overrides.apply(config);
        config.validate()?;
        Ok(config)
    }
}
