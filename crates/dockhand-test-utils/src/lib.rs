//! Shared test utilities for the dockhand workspace.
//!
//! This crate provides fixtures for building nested directory trees with
//! configuration files at several ancestor levels. It is a dev-dependency
//! only and never published.

pub mod tree;

pub use tree::TestTree;
