//! Shared Kernel - vocabulary every client crate agrees on
//!
//! This crate contains:
//! - The unified error type ([`error::app_error::AppError`]) and its kinds
//! - Typed identifiers for backend-owned rows ([`id::Id`])
//!
//! **Design Principle**: only things whose meaning is identical in the
//! account, marketplace and transport layers live here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;

pub use error::app_error::{AppError, AppResult};
pub use error::kind::ErrorKind;
