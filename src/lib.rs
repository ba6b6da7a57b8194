//! Workspace placeholder crate.
//!
//! Re-exports the broker service so host binaries and integration harnesses can
//! depend on `box-broker-workspace` alone instead of wiring each crate
//! individually. The runnable server lives in `core-service` (`box-broker`).

pub use core_service::*;
