#![forbid(unsafe_code)]

//! Runtime: the reactive signal graph and the sign-up form sessions built on
//! it.

pub mod error;
pub mod form;
pub mod reactive;

pub use error::{FormError, Result};
pub use form::{
    EmptyCheck, FormConfig, FormSession, FormSignals, PasswordPolicy, PasswordStatus, StrengthCheck,
};
