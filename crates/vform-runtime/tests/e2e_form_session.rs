//! End-to-end sign-up form sessions on a virtual clock.
//!
//! Each test opens a session, lets the untouched form settle (the first
//! password classification is never shown), then types and advances time the
//! way a user would.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vform_core::{EventLoop, ImmediateScheduler, LabClock, Scheduler, Task, TimerHandle};
use vform_runtime::reactive::Subscription;
use vform_runtime::{EmptyCheck, FormConfig, FormSession, PasswordStatus};
use web_time::{Duration, Instant};

// ── Helpers ─────────────────────────────────────────────────────────────

const SETTLE: Duration = Duration::from_millis(1000);

struct Harness {
    ev: Rc<EventLoop>,
    session: FormSession,
}

impl Harness {
    fn new(config: FormConfig) -> Self {
        let clock = LabClock::new();
        let ev = Rc::new(EventLoop::lab(&clock));
        let session = FormSession::new(config, ev.clone()).expect("valid config");
        Self { ev, session }
    }

    /// A session whose untouched form has already settled.
    fn opened(config: FormConfig) -> Self {
        let harness = Self::new(config);
        harness.settle();
        harness
    }

    fn settle(&self) {
        self.ev.advance(SETTLE);
    }

    fn fill(&self, username: &str, password: &str, again: &str) {
        self.session.set_username(username);
        self.session.set_password(password);
        self.session.set_password_again(again);
        self.settle();
    }

    fn record_errors(&self) -> (Rc<RefCell<Vec<String>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let sub = self
            .session
            .subscribe_inline_error(move |e: &String| log_clone.borrow_mut().push(e.clone()));
        (log, sub)
    }
}

/// Runs tasks one at a time, in submission order, ignoring delays.
#[derive(Default)]
struct ManualScheduler {
    clock: LabClock,
    queue: RefCell<VecDeque<Task>>,
}

impl ManualScheduler {
    fn run_one(&self) -> bool {
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    fn run_all(&self) {
        while self.run_one() {}
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn schedule(&self, _delay: Duration, task: Task) -> TimerHandle {
        self.queue.borrow_mut().push_back(task);
        TimerHandle::inert()
    }
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn short_username_empty_password() {
    let h = Harness::new(FormConfig::default());
    h.session.set_username("ab");
    h.settle();

    assert_eq!(h.session.password_status(), Some(PasswordStatus::Empty));
    assert!(!h.session.is_valid());
    assert_eq!(h.session.inline_error_for_password(), "");

    // Touching only the confirmation reclassifies the still empty password,
    // and this time the message is shown.
    h.session.set_password_again("x");
    h.ev.advance(Duration::from_millis(199));
    assert_eq!(h.session.inline_error_for_password(), "");
    h.ev.advance(Duration::from_millis(1));
    assert_eq!(
        h.session.inline_error_for_password(),
        "Password cannot be empty"
    );
    assert_eq!(h.session.password_status(), Some(PasswordStatus::Empty));
    assert!(!h.session.is_valid());

    // A password typed and cleared again settles back to empty.
    h.ev.advance(Duration::from_secs(1));
    h.session.set_password("a");
    h.ev.advance(Duration::from_millis(300));
    h.session.set_password("");
    h.ev.advance(Duration::from_secs(1));
    assert_eq!(
        h.session.inline_error_for_password(),
        "Password cannot be empty"
    );
    assert!(!h.session.is_valid());
}

#[test]
fn password_typed_and_cleared_reports_empty() {
    let h = Harness::opened(FormConfig::default());
    let (errors, _sub) = h.record_errors();
    h.session.set_username("ab");

    h.session.set_password("a");
    h.ev.advance(Duration::from_millis(300));
    h.session.set_password("");
    h.settle();

    assert_eq!(h.session.password_status(), Some(PasswordStatus::Empty));
    assert_eq!(
        *errors.borrow(),
        vec!["Password cannot be empty".to_string()]
    );
    assert!(!h.session.is_valid());
}

#[test]
fn valid_form() {
    let h = Harness::opened(FormConfig::default());
    h.fill("abc", "Abcdef1", "Abcdef1");

    assert_eq!(h.session.password_status(), Some(PasswordStatus::Valid));
    assert!(h.session.is_valid());
    assert_eq!(h.session.inline_error_for_password(), "");
}

#[test]
fn weak_password() {
    let h = Harness::opened(FormConfig::default());
    h.fill("abc", "abcdef1", "abcdef1");

    assert!(!h.session.is_valid());
    assert_eq!(h.session.inline_error_for_password(), "Password is too weak");
}

#[test]
fn mismatched_confirmation() {
    let h = Harness::opened(FormConfig::default());
    h.fill("abc", "Abcdef1", "Abcdef2");

    assert!(!h.session.is_valid());
    assert_eq!(
        h.session.inline_error_for_password(),
        "Passwords do not match"
    );
}

#[test]
fn valid_password_short_username() {
    let h = Harness::opened(FormConfig::default());
    h.fill("ab", "Abcdef1", "Abcdef1");

    assert_eq!(h.session.password_status(), Some(PasswordStatus::Valid));
    assert!(!h.session.is_valid());
    assert_eq!(h.session.inline_error_for_password(), "");
}

#[test]
fn first_classification_is_never_shown() {
    // Typing before the form ever settled: the weak status is the first
    // classification, so no message appears yet.
    let h = Harness::new(FormConfig::default());
    h.fill("abc", "abcdef1", "abcdef1");

    assert_eq!(
        h.session.password_status(),
        Some(PasswordStatus::NotStrongEnough)
    );
    assert_eq!(h.session.inline_error_for_password(), "");

    h.session.set_password("Abcdef1");
    h.settle();
    assert_eq!(
        h.session.inline_error_for_password(),
        "Passwords do not match"
    );
}

// ── Timing ──────────────────────────────────────────────────────────────

#[test]
fn outputs_wait_for_quiet_period() {
    let h = Harness::opened(FormConfig::default());
    h.session.set_username("abc");
    h.session.set_password("Abcdef1");
    h.session.set_password_again("Abcdef1");

    h.ev.advance(Duration::from_millis(799));
    assert!(!h.session.is_valid());
    h.ev.advance(Duration::from_millis(1));
    assert!(h.session.is_valid());
}

#[test]
fn typing_burst_settles_once() {
    let h = Harness::opened(FormConfig::default());
    let (errors, _sub) = h.record_errors();

    for partial in ["A", "Ab", "Abc", "Abcd", "Abcde", "Abcdef", "Abcdef1"] {
        h.session.set_password(partial);
        h.ev.advance(Duration::from_millis(100));
    }
    h.settle();

    assert_eq!(
        h.session.signals().password.latest().as_deref(),
        Some("Abcdef1")
    );
    // Settled "" once when opened, then once for the whole burst.
    assert_eq!(h.session.signals().password.emissions(), 2);
    // The confirmation pair settles 200 ms after the last keystroke, while
    // the password is still settling.
    assert_eq!(
        *errors.borrow(),
        vec![
            "Password cannot be empty".to_string(),
            "Passwords do not match".to_string(),
        ]
    );
}

#[test]
fn confirmation_settles_before_password() {
    let h = Harness::opened(FormConfig::default());
    h.session.set_password_again("Abcdef1");
    h.ev.advance(Duration::from_millis(200));
    assert_eq!(h.session.signals().passwords_equal.latest(), Some(false));
    // password still empty and settled, so the emptiness check wins.
    assert_eq!(h.session.password_status(), Some(PasswordStatus::Empty));
}

#[test]
fn retyping_within_quiet_period_is_silent() {
    let h = Harness::opened(FormConfig::default());
    h.fill("abc", "Abcdef1", "Abcdef2");
    let (errors, _sub) = h.record_errors();
    let emissions = h.session.signals().password_status.emissions();

    // The pair settles back on its previous value and is dropped by the
    // debounce stage.
    h.session.set_password_again("Abcdef");
    h.ev.advance(Duration::from_millis(50));
    h.session.set_password_again("Abcdef2");
    h.settle();

    assert_eq!(h.session.signals().password_status.emissions(), emissions);
    assert!(errors.borrow().is_empty());
}

#[test]
fn status_repeats_for_each_settled_change() {
    let h = Harness::opened(FormConfig::default());
    h.fill("abc", "Abcdef1", "Abcdef2");
    let emissions = h.session.signals().password_status.emissions();

    h.session.set_password_again("Abcdef3");
    h.settle();

    assert_eq!(
        h.session.signals().password_status.emissions(),
        emissions + 1
    );
    assert_eq!(
        h.session.password_status(),
        Some(PasswordStatus::RepeatPasswordWrong)
    );
    assert_eq!(
        h.session.inline_error_for_password(),
        "Passwords do not match"
    );
}

// ── Lifecycle ───────────────────────────────────────────────────────────

#[test]
fn teardown_twice_is_harmless() {
    let mut h = Harness::opened(FormConfig::default());
    assert!(h.session.teardown());
    assert!(!h.session.teardown());
    assert!(!h.session.is_active());
}

#[test]
fn no_updates_after_teardown() {
    let mut h = Harness::opened(FormConfig::default());
    h.session.set_username("abc");
    h.session.set_password("Abcdef1");
    h.session.set_password_again("Abcdef1");
    h.session.teardown();
    assert_eq!(h.ev.pending(), 0);

    h.settle();
    h.session.set_password("x");
    h.settle();

    assert!(!h.session.is_valid());
    assert_eq!(h.session.inline_error_for_password(), "");
    assert_eq!(h.session.password_status(), Some(PasswordStatus::Empty));
}

#[test]
fn teardown_drops_posted_assignments() {
    let sched = Rc::new(ManualScheduler::default());
    let mut session = FormSession::new(FormConfig::default(), sched.clone()).unwrap();
    sched.run_all();

    session.set_username("abc");
    session.set_password("Abcdef1");
    session.set_password_again("Abcdef1");
    while session.signals().form_valid.latest() != Some(true) {
        assert!(sched.run_one(), "form never became valid");
    }
    // The assignment is posted but has not run.
    assert!(!session.is_valid());

    session.teardown();
    sched.run_all();
    assert!(!session.is_valid());
}

#[test]
fn dropping_session_cancels_timers() {
    let h = Harness::new(FormConfig::default());
    let ev = Rc::clone(&h.ev);
    h.session.set_username("abc");
    assert!(ev.pending() > 0);
    drop(h);
    assert_eq!(ev.pending(), 0);
}

// ── Configuration ───────────────────────────────────────────────────────

#[test]
fn legacy_empty_check_reports_matching_passwords_as_empty() {
    let h = Harness::opened(FormConfig::default().with_empty_check(EmptyCheck::PasswordsEqual));
    h.fill("abc", "Abcdef1", "Abcdef2");
    assert_eq!(
        h.session.inline_error_for_password(),
        "Passwords do not match"
    );

    h.session.set_password_again("Abcdef1");
    h.settle();
    assert_eq!(
        h.session.inline_error_for_password(),
        "Password cannot be empty"
    );
    assert!(!h.session.is_valid());
}

#[test]
fn legacy_empty_check_flags_cleared_fields_as_empty() {
    let h = Harness::opened(FormConfig::default().with_empty_check(EmptyCheck::PasswordsEqual));
    h.session.set_username("abc");
    h.session.set_password_again("x");
    h.settle();
    assert_eq!(h.session.inline_error_for_password(), "Password is too weak");

    h.session.set_password_again("");
    h.settle();
    assert_eq!(h.session.password(), "");
    assert_eq!(h.session.password_again(), "");
    assert_eq!(
        h.session.inline_error_for_password(),
        "Password cannot be empty"
    );
    assert!(!h.session.is_valid());
}

#[test]
fn custom_quiet_periods() {
    let config = FormConfig::default()
        .with_username_quiet(Duration::from_millis(50))
        .with_password_quiet(Duration::from_millis(50))
        .with_confirmation_quiet(Duration::from_millis(10));
    let h = Harness::opened(config);
    h.session.set_username("abc");
    h.session.set_password("Abcdef1");
    h.session.set_password_again("Abcdef1");
    h.ev.advance(Duration::from_millis(50));
    assert!(h.session.is_valid());
}

#[test]
fn immediate_scheduler_has_no_delay() {
    let session =
        FormSession::new(FormConfig::default(), Rc::new(ImmediateScheduler::new())).unwrap();
    session.set_username("abc");
    session.set_password("abcdef1");
    session.set_password_again("abcdef1");
    assert_eq!(session.inline_error_for_password(), "Password is too weak");
    session.set_password("Abcdef1");
    session.set_password_again("Abcdef1");
    assert!(session.is_valid());
    assert_eq!(session.inline_error_for_password(), "");
}
