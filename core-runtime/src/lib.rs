//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the broker:
//! - Static configuration (credentials, folder/template registry, server settings)
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! Every other crate in the workspace reads its settings from
//! [`config::BrokerConfig`] and logs through the subscriber installed by
//! [`logging::init_logging`].

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
