//! hostwatch-core: Shared domain types for the hostwatch inventory.
//!
//! This crate provides the foundational types used across all hostwatch
//! components:
//! - The persistent `Asset` record and its status/type enumerations
//! - Alert records for the append-only event log
//! - Cycle summary types returned by the reconciliation engine

pub mod types;

pub use types::{Alert, AlertCategory, Asset, AssetStatus, AssetType};
