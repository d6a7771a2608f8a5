//! Komodo Settings Library
//!
//! This module exports the settings resolver, the export projector and the
//! CLI building blocks for testing and integration.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
