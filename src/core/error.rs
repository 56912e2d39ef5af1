//! Error handling for the web UI manager
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** so the install pipeline can tell an
//!    unreachable release store apart from a broken local installation
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Resolution**: [`WebUiError::Resolution`] - no compatible bundle version;
//!   recovered by falling back to the build's bundled version
//! - **Network**: [`WebUiError::Network`], [`WebUiError::MalformedResponse`] -
//!   release store unreachable or answering garbage
//! - **Integrity**: [`WebUiError::IntegrityMismatch`] - local digest differs from
//!   the declared one; a reinstall trigger, never fatal
//! - **Extraction**: [`WebUiError::Extraction`] - archive unreadable or files
//!   could not be written
//! - **File system**: [`WebUiError::FileSystem`], [`WebUiError::Io`] - any
//!   read/write/delete failure on the installation root
//!
//! Use [`user_friendly_error`] to turn any [`anyhow::Error`] into an
//! [`ErrorContext`] for display.

use colored::Colorize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors produced by the resolution, verification and install pipeline.
#[derive(Error, Debug)]
pub enum WebUiError {
    /// No entry of the compatibility table accepts the running server.
    #[error("No compatible web UI version found for server {server_revision}")]
    Resolution {
        /// Revision tag of the running server.
        server_revision: String,
    },

    /// A remote endpoint could not be reached or answered with an error status.
    #[error("Network error: {operation}: {reason}")]
    Network {
        /// What was being attempted (e.g. "download archive").
        operation: String,
        /// Underlying cause as reported by the transport.
        reason: String,
    },

    /// A remote endpoint answered but the body could not be interpreted.
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse {
        url: String,
        reason: String,
    },

    /// Computed bundle digest differs from the declared one.
    #[error("Integrity mismatch for web UI {version}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        version: String,
        expected: String,
        actual: String,
    },

    /// The release archive could not be unpacked.
    #[error("Failed to extract {archive}: {reason}")]
    Extraction {
        archive: String,
        reason: String,
    },

    /// A file system operation on the installation failed.
    #[error("File system error: {operation} ({path})")]
    FileSystem {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A server revision tag is not of the form `r<integer>`.
    #[error("Invalid server revision '{tag}': expected r<number>")]
    InvalidServerVersion {
        tag: String,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    /// Another invocation holds the install lock for this root.
    #[error("Timed out after {waited_secs}s waiting for the install lock at {path}")]
    LockTimeout {
        path: String,
        waited_secs: u64,
    },

    /// Rollback was requested but no previous installation is retained.
    #[error("No previous web UI installation to roll back to at {path}")]
    NoPreviousInstall {
        path: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WebUiError {
    /// Wrap an IO error with the operation and path it happened on.
    pub fn fs(operation: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.display().to_string(),
            source,
        }
    }

    pub fn network(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` when the failure came from talking to the release store.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::MalformedResponse { .. })
    }
}

/// Error wrapper carrying a suggestion and details for the CLI.
#[derive(Debug)]
pub struct ErrorContext {
    /// Short description of what went wrong.
    pub message: String,
    /// What the user can do about it.
    pub suggestion: Option<String>,
    /// Background on why it happens.
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = error
        .chain()
        .map(std::string::ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");

    if let Some(webui_error) = error.downcast_ref::<WebUiError>() {
        return context_for(webui_error, message);
    }

    if let Some(cause) = error.chain().find_map(|e| e.downcast_ref::<WebUiError>()) {
        return context_for(cause, message);
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::new(message)
            .with_suggestion("Check the TOML syntax of your web UI configuration file");
    }

    ErrorContext::new(message)
}

fn context_for(error: &WebUiError, message: String) -> ErrorContext {
    match error {
        WebUiError::Network { .. } => ErrorContext::new(message)
            .with_suggestion("Check your internet connection and the [release] URLs in the configuration")
            .with_details("The previous web UI installation, if any, was left in place"),
        WebUiError::MalformedResponse { .. } => ErrorContext::new(message)
            .with_suggestion("Verify that the [release] URLs point at the web UI release store"),
        WebUiError::Resolution { .. } => ErrorContext::new(message)
            .with_suggestion("Switch to the 'bundled' channel or upgrade the server"),
        WebUiError::Extraction { .. } => ErrorContext::new(message)
            .with_suggestion("Run `webui install` again to download a fresh archive")
            .with_details("The installation root may be missing until the next successful install"),
        WebUiError::FileSystem { .. } | WebUiError::Io(_) => ErrorContext::new(message)
            .with_suggestion("Check permissions and free space for the web UI root directory"),
        WebUiError::InvalidServerVersion { .. } => ErrorContext::new(message)
            .with_suggestion("Pass a revision such as r1500 with --server-revision"),
        WebUiError::LockTimeout { .. } => ErrorContext::new(message)
            .with_suggestion("Wait for the other web UI update to finish, or remove a stale lock file"),
        WebUiError::NoPreviousInstall { .. } => ErrorContext::new(message)
            .with_details("Previous installations are only kept when keep_previous = true"),
        WebUiError::IntegrityMismatch { .. } => ErrorContext::new(message)
            .with_suggestion("Run `webui install` to replace the damaged files"),
        WebUiError::Config { .. } => ErrorContext::new(message)
            .with_suggestion("Check the web UI configuration file"),
    }
}
