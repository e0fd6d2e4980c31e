//! Integration test suite for templar
//!
//! End-to-end tests over real template hierarchies written to temporary
//! directories.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **inheritance**: resolution order, field merge and cycle rejection through a session
//! - **expansion**: full generations through the host hooks with a recording pipeline
//! - **cli**: the `templar` binary

mod cli;
mod expansion;
mod inheritance;
