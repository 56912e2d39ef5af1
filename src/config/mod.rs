//! Configuration for the web UI manager.
//!
//! Only the configuration *values* matter to the engine; they are passed to
//! it explicitly as a [`WebUiConfig`]. This module also knows where the
//! configuration file lives and how to read and write it.

mod global;

pub use global::{NetworkConfig, ReleaseEndpoints, WebUiConfig};
