#![forbid(unsafe_code)]

//! Sign-up form validation.
//!
//! A [`FormSession`] owns three raw text inputs and derives from them, through
//! the reactive graph:
//!
//! ```text
//! username ─debounce 800ms─► username_valid ─────────────────────┐
//!                                                                ▼
//! password ─debounce 800ms─► password_checks ──┐            form_valid ─► is_valid
//!                            (empty, strong)   ├─► password_status ─┘
//!                                              │        └─(skip 1)─► inline error
//! (password, again) ─debounce 200ms─► passwords_equal
//! ```
//!
//! `password_empty` and `password_strong` are projections of
//! `password_checks`, kept for diagnostics. The status reads both flags from
//! the one node, so a settled password changes the status at most once. With
//! [`EmptyCheck::PasswordsEqual`] the emptiness slot reads `passwords_equal`
//! instead of the empty flag.
//!
//! The published outputs are written on the session's scheduler; everything
//! else is pure derivation.

pub mod config;
pub mod predicates;
pub mod session;
pub mod status;

pub use config::{EmptyCheck, FormConfig};
pub use predicates::{PasswordPolicy, StrengthCheck};
pub use session::{FormSession, FormSignals};
pub use status::PasswordStatus;
