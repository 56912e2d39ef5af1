//! Integration test suite for the web UI manager
//!
//! End-to-end tests drive the public API against an in-memory release store
//! (`test_utils::FakeTransport`); CLI tests run the `webui` binary with
//! `assert_cmd` and never reach the network.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **engine**: install state machine, corruption, failure handling, rollback
//! - **resolution**: compatibility table walk through the public API
//! - **cli**: `webui` subcommands that stay offline
//! - **config**: configuration file discovery

mod common;

mod cli;
mod config;
mod engine;
mod resolution;
