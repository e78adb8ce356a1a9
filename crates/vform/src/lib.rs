#![forbid(unsafe_code)]

//! vform public facade crate.
//!
//! This crate provides the stable surface area for users: the schedulers
//! from `vform-core` and, with the `runtime` feature, the form sessions from
//! `vform-runtime`.

pub use vform_core::{Clock, EventLoop, ImmediateScheduler, LabClock, Scheduler, SharedScheduler};

#[cfg(feature = "runtime")]
pub use vform_runtime::{
    EmptyCheck, FormConfig, FormError, FormSession, FormSignals, PasswordPolicy, PasswordStatus,
};

pub mod prelude {
    pub use vform_core as core;
    #[cfg(feature = "runtime")]
    pub use vform_runtime as runtime;
}
