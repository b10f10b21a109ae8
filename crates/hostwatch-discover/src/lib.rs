//! hostwatch-discover: Discovery and reconciliation engine for the
//! hostwatch asset inventory.
//!
//! Wraps nmap for a two-phase subnet scan (fast liveness sweep, slow
//! detail enrichment), classifies discovered devices, and merges the
//! results into the SQLite asset store with online/offline tracking.

pub mod classify;
pub mod config;
pub mod error;
pub mod nmap_xml;
pub mod persist;
pub mod probe;
pub mod reconcile;
pub mod scanner;
pub mod scheduler;
