#![forbid(unsafe_code)]

//! Core: time sources and the single-threaded scheduling context that every
//! vform session runs on.

pub mod clock;
pub mod logging;
pub mod scheduler;

pub use clock::{Clock, LabClock};
pub use scheduler::{EventLoop, ImmediateScheduler, Scheduler, SharedScheduler, Task, TimerHandle};
