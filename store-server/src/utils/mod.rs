//! Utilities
//!
//! - [`error`] - Application error type and response envelope
//! - [`logger`] - Tracing setup

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult};
