//! hostwatch-store: SQLite client for the asset inventory.
//!
//! This crate is the single mutation point for the inventory database.
//! All reads and writes flow through this crate so that every
//! reconciliation cycle commits atomically and concurrent cycles are
//! serialized on one connection.

pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{CycleTxn, StoreClient, StoreError};
pub use mutations::{AssetPatch, NewAsset};
