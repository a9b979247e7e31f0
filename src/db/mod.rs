//! System of record - async reads and writes of rosters, schedules and ledger entries.
//!
//! Functions here translate between `SeaORM` rows and the pure core types. Derived
//! statuses are never written; callers load a snapshot and reconcile it with
//! [`crate::core`].

/// Attendance terms and marks
pub mod attendance;
/// Fee schedules and payments
pub mod fees;
/// Students
pub mod roster;
/// Seeding from config.toml
pub mod seed;
