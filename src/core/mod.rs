//! Core types shared by every layer: errors and their user-facing rendering.

pub mod error;

pub use error::{AppGraphError, ErrorContext, user_friendly_error};
