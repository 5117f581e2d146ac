//! Spforge - tooling for ucfb material and texture assets
//!
//! This library crate exposes the command implementations for integration testing.

pub mod config;
pub mod inspect;
pub mod update;
