#![forbid(unsafe_code)]

//! The sign-up form session.
//!
//! A [`FormSession`] is built once per form. Construction wires the whole
//! graph into a [`Scope`]; [`FormSession::teardown`] (or dropping the session)
//! disposes it, cancelling pending debounce timers and making any posted but
//! unexecuted output assignment inert.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use vform_core::{EventLoop, LabClock};
//! use vform_runtime::{FormConfig, FormSession};
//! use web_time::Duration;
//!
//! let clock = LabClock::new();
//! let ev = Rc::new(EventLoop::lab(&clock));
//! let session = FormSession::new(FormConfig::default(), ev.clone()).unwrap();
//!
//! session.set_username("abc");
//! session.set_password("Abcdef1");
//! session.set_password_again("Abcdef1");
//! ev.advance(Duration::from_secs(1));
//!
//! assert!(session.is_valid());
//! assert_eq!(session.inline_error_for_password(), "");
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use vform_core::SharedScheduler;

use super::config::{EmptyCheck, FormConfig};
use super::predicates;
use super::status::PasswordStatus;
use crate::error::Result;
use crate::reactive::{Observable, Published, Scope, Signal, Subscription};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Handles to every intermediate node of a session's graph.
///
/// Useful for diagnostics and tests; external readers normally only need the
/// two published outputs.
#[derive(Debug, Clone)]
pub struct FormSignals {
    /// Username after its quiet period.
    pub username: Signal<String>,
    /// Password after its quiet period.
    pub password: Signal<String>,
    /// (password, confirmation) after the confirmation quiet period.
    pub password_pair: Signal<(String, String)>,
    pub username_valid: Signal<bool>,
    /// (empty, strong) for the settled password.
    pub password_checks: Signal<(bool, bool)>,
    /// Projection of `password_checks`; the status reads the pair directly.
    pub password_empty: Signal<bool>,
    /// Projection of `password_checks`.
    pub password_strong: Signal<bool>,
    pub passwords_equal: Signal<bool>,
    pub password_status: Signal<PasswordStatus>,
    /// Status and username combined; drives `is_valid`.
    pub form_valid: Signal<bool>,
}

/// One live sign-up form: three raw inputs, two published outputs and the
/// graph between them.
pub struct FormSession {
    id: u64,
    config: FormConfig,
    username: Observable<String>,
    password: Observable<String>,
    password_again: Observable<String>,
    is_valid: Observable<bool>,
    inline_error: Observable<String>,
    signals: FormSignals,
    scope: Scope,
}

impl std::fmt::Debug for FormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("id", &self.id)
            .field("is_valid", &self.is_valid.get())
            .field("inline_error", &self.inline_error.get())
            .field("status", &self.signals.password_status.latest())
            .field("active", &self.is_active())
            .finish()
    }
}

impl FormSession {
    /// Build a session and wire its graph onto `scheduler`.
    ///
    /// The empty initial inputs count as upstream values, so an untouched
    /// form settles once its quiet periods elapse.
    pub fn new(config: FormConfig, scheduler: SharedScheduler) -> Result<Self> {
        config.validate()?;
        let strength = config.password_policy.compile()?;

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let span = tracing::debug_span!("form.session", session = id);
        let _entered = span.enter();

        let mut scope = Scope::new(scheduler);
        let username = Observable::new(String::new());
        let password = Observable::new(String::new());
        let password_again = Observable::new(String::new());

        let raw_pair = scope.combine2(
            "password_pair.raw",
            &password,
            &password_again,
            |p: &String, q: &String| (p.clone(), q.clone()),
        );

        let settled_username = scope.debounce("username", &username, config.username_quiet);
        let settled_password = scope.debounce("password", &password, config.password_quiet);
        let settled_pair = scope.debounce("password_pair", &raw_pair, config.confirmation_quiet);

        let min_len = config.min_username_len;
        let username_valid = scope.map("username_valid", &settled_username, move |u: &String| {
            predicates::username_valid(u, min_len)
        });
        // Emptiness and strength come from one node so the status never sees
        // one of them updated without the other.
        let password_checks = scope.map("password_checks", &settled_password, move |p: &String| {
            (predicates::password_empty(p), strength.is_strong(p))
        });
        let password_empty =
            scope.map("password_empty", &password_checks, |checks: &(bool, bool)| checks.0);
        let password_strong =
            scope.map("password_strong", &password_checks, |checks: &(bool, bool)| checks.1);
        let passwords_equal = scope.map(
            "passwords_equal",
            &settled_pair,
            |(p, q): &(String, String)| predicates::passwords_equal(p, q),
        );

        let empty_check = config.empty_check;
        let password_status = scope.combine2(
            "password_status",
            &password_checks,
            &passwords_equal,
            move |&(empty, strong): &(bool, bool), confirmed: &bool| {
                let empty = match empty_check {
                    EmptyCheck::PasswordEmpty => empty,
                    EmptyCheck::PasswordsEqual => *confirmed,
                };
                PasswordStatus::classify(empty, strong, *confirmed)
            },
        );
        let form_valid = scope.combine2(
            "form_valid",
            &password_status,
            &username_valid,
            |status: &PasswordStatus, username_ok: &bool| status.is_valid() && *username_ok,
        );

        let is_valid = Observable::new(false);
        let inline_error = Observable::new(String::new());
        scope.assign("is_valid", &form_valid, &is_valid, 0, |valid: &bool| *valid);
        // The first classification arrives before the user has touched the
        // password fields and is not shown. Every later one is, even when it
        // repeats the first.
        scope.assign(
            "inline_error_for_password",
            &password_status,
            &inline_error,
            1,
            |status: &PasswordStatus| status.message().to_string(),
        );

        let status_log = password_status.subscribe(move |status: &PasswordStatus| {
            tracing::debug!(session = id, %status, "form.session.status");
        });
        scope.adopt([status_log]);

        tracing::debug!(
            session = id,
            empty_check = ?config.empty_check,
            guards = scope.len(),
            "form.session.new"
        );

        Ok(Self {
            id,
            config,
            username,
            password,
            password_again,
            is_valid,
            inline_error,
            signals: FormSignals {
                username: settled_username,
                password: settled_password,
                password_pair: settled_pair,
                username_valid,
                password_checks,
                password_empty,
                password_strong,
                passwords_equal,
                password_status,
                form_valid,
            },
            scope,
        })
    }

    /// Process-unique id, used in log fields.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn set_username(&self, value: impl Into<String>) {
        self.write("username", &self.username, value.into());
    }

    pub fn set_password(&self, value: impl Into<String>) {
        self.write("password", &self.password, value.into());
    }

    pub fn set_password_again(&self, value: impl Into<String>) {
        self.write("password_again", &self.password_again, value.into());
    }

    fn write(&self, field: &'static str, input: &Observable<String>, value: String) {
        if !self.is_active() {
            tracing::trace!(session = self.id, field, "input after teardown; not propagated");
        }
        input.set(value);
    }

    /// Current raw username.
    #[must_use]
    pub fn username(&self) -> String {
        self.username.get()
    }

    #[must_use]
    pub fn password(&self) -> String {
        self.password.get()
    }

    #[must_use]
    pub fn password_again(&self) -> String {
        self.password_again.get()
    }

    /// Whether the whole form may be submitted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid.get()
    }

    /// Message shown under the password fields; empty when there is nothing
    /// to report.
    #[must_use]
    pub fn inline_error_for_password(&self) -> String {
        self.inline_error.get()
    }

    #[must_use]
    pub fn is_valid_output(&self) -> Published<bool> {
        Published::new(&self.is_valid)
    }

    #[must_use]
    pub fn inline_error_output(&self) -> Published<String> {
        Published::new(&self.inline_error)
    }

    /// Call `callback` whenever `is_valid` changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_is_valid(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.is_valid.subscribe(callback)
    }

    /// Call `callback` whenever the inline error changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_inline_error(&self, callback: impl Fn(&String) + 'static) -> Subscription {
        self.inline_error.subscribe(callback)
    }

    /// Most recent password classification, if any has settled.
    #[must_use]
    pub fn password_status(&self) -> Option<PasswordStatus> {
        self.signals.password_status.latest()
    }

    #[must_use]
    pub fn signals(&self) -> &FormSignals {
        &self.signals
    }

    /// `false` once [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.scope.is_disposed()
    }

    /// Detach the graph. Outputs keep their last values and never change
    /// again. Returns `false` if the session was already torn down.
    pub fn teardown(&mut self) -> bool {
        let disposed = self.scope.dispose();
        if disposed {
            tracing::debug!(
                session = self.id,
                is_valid = self.is_valid.get(),
                "form.session.teardown"
            );
        }
        disposed
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
