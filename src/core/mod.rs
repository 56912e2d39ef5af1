//! Core types shared by every part of the web UI manager.
//!
//! Currently this is the error taxonomy and its user-facing presentation;
//! see [`error`] for the categories.

pub mod error;

pub use error::{ErrorContext, WebUiError, user_friendly_error};

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, WebUiError>;
