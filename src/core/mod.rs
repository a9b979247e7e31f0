//! Core reconciliation logic - pure, synchronous and free of I/O.
//!
//! Callers read a consistent snapshot from the system of record (see [`crate::db`]) and
//! hand it to these modules. Nothing in here touches the database or the clock, so every
//! function can be called from any context without locking.

/// Aggregator - per-group summaries of derived statuses
pub mod aggregate;
/// Ledger entries and the supersede rule
pub mod ledger;
/// Filter and search projector
pub mod projector;
/// Reconciliation engine
pub mod reconcile;
/// Text formatting for reports and logs
pub mod report;
/// Roster entities
pub mod roster;
/// Period schedules and their builders
pub mod schedule;
/// View models built from snapshots
pub mod view;
