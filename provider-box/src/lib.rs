//! # Box Provider
//!
//! Typed access to the parts of the Box Content API the broker relies on.
//!
//! ## Overview
//!
//! This module provides:
//! - File lookup
//! - Folder listing with offset pagination
//! - Metadata instance reads, creation and JSON Patch updates

pub mod connector;
pub mod error;
pub mod types;

pub use connector::BoxConnector;
pub use error::{BoxError, Result};
pub use types::{BoxFile, FileMetadataSummary, FolderItem, MetadataPatchOp};
