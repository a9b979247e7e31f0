//! Reconciliation engine - folds ledger entries against a schedule into a derived status.
//!
//! Derived statuses are never stored. They are recomputed from a schedule and the ledger
//! entries as of now whenever they're needed, so editing a schedule or recording an entry
//! needs no bookkeeping beyond recomputing. Every function here is pure: no I/O, no
//! clock reads (the caller passes `as_of`), and no hidden state.
//!
//! Entries are validated before anything is folded. An entry for another student or for
//! a key that isn't on the schedule rejects the whole call. Dropping it silently would
//! produce a wrong status.

use crate::core::ledger::{AttendanceMark, FeePayment, LedgerEntry, Mark, latest_by_key};
use crate::core::roster::Entity;
use crate::core::schedule::{AttendanceSchedule, ComponentKey, FeeSchedule};
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Attendance ratio below which a student is flagged as at risk, unless configured.
pub const DEFAULT_AT_RISK_BELOW: f64 = 0.75;

/// Balances under half a cent count as settled.
pub const SETTLED_BELOW: f64 = 0.005;

/// How late marks count toward the attendance ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatePolicy {
    /// Late days count as neither present nor absent but stay in the denominator
    #[default]
    Separate,
    /// Late days count as present
    Present,
    /// Late days are left out of both numerator and denominator
    Excluded,
}

/// Inputs to reconciliation that don't come from the schedule or the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOptions {
    /// Date the status is computed for; decides what is overdue
    pub as_of: NaiveDate,
    /// How late marks count toward attendance
    pub late_policy: LatePolicy,
    /// Attendance ratio below which a student is at risk
    pub at_risk_below: f64,
}

impl ReconcileOptions {
    /// Default options evaluated on `as_of`.
    #[must_use]
    pub const fn as_of(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            late_policy: LatePolicy::Separate,
            at_risk_below: DEFAULT_AT_RISK_BELOW,
        }
    }

    /// Overrides the late policy.
    #[must_use]
    pub const fn with_late_policy(mut self, late_policy: LatePolicy) -> Self {
        self.late_policy = late_policy;
        self
    }
}

/// A roster entry joined with its derived status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row<S> {
    /// The student
    pub entity: Entity,
    /// Status derived for the student
    pub status: S,
}

/// Anything that can fold one student's ledger entries into a status.
pub trait Reconcile {
    /// Ledger entry recorded against this kind of schedule
    type Entry: LedgerEntry;
    /// Derived status produced for one student
    type Status;

    /// Computes one student's status from their entries.
    ///
    /// # Errors
    /// * [`Error::EntityMismatch`] if an entry belongs to another student
    /// * [`Error::UnknownComponent`] if an entry references a key not on the schedule
    /// * [`Error::InvalidAmount`] if a fee entry's amount is negative or not finite
    fn reconcile(
        &self,
        entity_id: &str,
        entries: &[Self::Entry],
        options: &ReconcileOptions,
    ) -> Result<Self::Status>;
}

fn check_entries<E>(
    entity_id: &str,
    entries: &[E],
    on_schedule: impl Fn(&E::Key) -> bool,
) -> Result<()>
where
    E: LedgerEntry,
    E::Key: fmt::Display,
{
    for entry in entries {
        if entry.entity_id() != entity_id {
            return Err(Error::EntityMismatch {
                expected: entity_id.to_string(),
                found: entry.entity_id().to_string(),
            });
        }
        let key = entry.key();
        if !on_schedule(&key) {
            return Err(Error::UnknownComponent {
                entity_id: entity_id.to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

/// Payment state of a student or of a single fee component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBucket {
    /// Nothing left to pay
    Paid,
    /// Something paid, balance remaining, not yet past due
    Partial,
    /// Nothing paid, not yet past due
    Pending,
    /// Balance remaining after the due date
    Overdue,
}

impl FeeBucket {
    /// Every bucket, in report order.
    pub const ALL: [Self; 4] = [Self::Paid, Self::Partial, Self::Pending, Self::Overdue];

    /// Classifies a balance. Overdue takes precedence over partial.
    #[must_use]
    pub fn classify(paid: f64, raw_due: f64, due_date: NaiveDate, as_of: NaiveDate) -> Self {
        if raw_due < SETTLED_BELOW {
            Self::Paid
        } else if as_of > due_date {
            Self::Overdue
        } else if paid > 0.0 {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

/// Balance reported to staff: zero once settled, never negative.
fn reported_due(raw_due: f64) -> f64 {
    if raw_due < SETTLED_BELOW { 0.0 } else { raw_due }
}

impl fmt::Display for FeeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Paid => "Paid",
            Self::Partial => "Partial",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
        })
    }
}

/// Derived state of one fee component for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStatus {
    /// Component key
    pub key: ComponentKey,
    /// Amount the schedule asks for
    pub amount: f64,
    /// Amount from the authoritative payment, zero if none
    pub paid: f64,
    /// Remaining balance, never negative
    pub due: f64,
    /// The component's own due date
    pub due_date: NaiveDate,
    /// Bucket judged against the component's own due date
    pub bucket: FeeBucket,
}

/// Derived fee state of one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeStatus {
    /// Student id
    pub entity_id: String,
    /// Schedule total
    pub total: f64,
    /// Sum of authoritative payments
    pub paid: f64,
    /// `total - paid`, negative when over-paid; kept for audits
    pub raw_due: f64,
    /// Balance reported to staff, clamped at zero
    pub due: f64,
    /// Bucket judged against the schedule's final due date
    pub bucket: FeeBucket,
    /// Per-component breakdown in schedule order
    pub components: Vec<ComponentStatus>,
}

impl FeeStatus {
    /// Components past their own due date with a balance left.
    pub fn overdue_components(&self) -> impl Iterator<Item = &ComponentStatus> {
        self.components
            .iter()
            .filter(|c| c.bucket == FeeBucket::Overdue)
    }
}

impl Reconcile for FeeSchedule {
    type Entry = FeePayment;
    type Status = FeeStatus;

    fn reconcile(
        &self,
        entity_id: &str,
        entries: &[FeePayment],
        options: &ReconcileOptions,
    ) -> Result<FeeStatus> {
        check_entries(entity_id, entries, |key| self.contains(key))?;
        for entry in entries {
            entry.validate_amount()?;
        }

        let latest = latest_by_key(entries);
        let components: Vec<ComponentStatus> = self
            .components()
            .iter()
            .map(|component| {
                let paid = latest.get(&component.key).map_or(0.0, |p| p.amount);
                let raw_due = component.amount - paid;
                ComponentStatus {
                    key: component.key.clone(),
                    amount: component.amount,
                    paid,
                    due: reported_due(raw_due),
                    due_date: component.due_date,
                    bucket: FeeBucket::classify(paid, raw_due, component.due_date, options.as_of),
                }
            })
            .collect();

        let total = self.total();
        let paid: f64 = components.iter().map(|c| c.paid).sum();
        let raw_due = total - paid;

        Ok(FeeStatus {
            entity_id: entity_id.to_string(),
            total,
            paid,
            raw_due,
            due: reported_due(raw_due),
            bucket: FeeBucket::classify(paid, raw_due, self.final_due_date(), options.as_of),
            components,
        })
    }
}

/// Attendance standing of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceBand {
    /// Every counted day present
    Perfect,
    /// At or above the at-risk threshold
    Regular,
    /// Below the at-risk threshold
    AtRisk,
}

impl AttendanceBand {
    /// Every band, in report order.
    pub const ALL: [Self; 3] = [Self::Perfect, Self::Regular, Self::AtRisk];

    /// Classifies an attendance ratio.
    #[must_use]
    pub fn classify(ratio: f64, at_risk_below: f64) -> Self {
        if ratio >= 1.0 {
            Self::Perfect
        } else if ratio >= at_risk_below {
            Self::Regular
        } else {
            Self::AtRisk
        }
    }
}

impl fmt::Display for AttendanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Perfect => "Perfect",
            Self::Regular => "Regular",
            Self::AtRisk => "At risk",
        })
    }
}

/// Derived attendance state of one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStatus {
    /// Student id
    pub entity_id: String,
    /// Class days on the schedule
    pub total_days: usize,
    /// Days marked present, including unmarked days
    pub present: usize,
    /// Days marked absent
    pub absent: usize,
    /// Days marked late
    pub late: usize,
    /// Attendance ratio under the configured late policy
    pub ratio: f64,
    /// Standing derived from the ratio
    pub band: AttendanceBand,
    /// Days marked absent, in calendar order
    pub absent_dates: Vec<NaiveDate>,
}

#[allow(clippy::cast_precision_loss)]
fn attendance_ratio(present: usize, late: usize, total_days: usize, policy: LatePolicy) -> f64 {
    let (attended, counted) = match policy {
        LatePolicy::Separate => (present, total_days),
        LatePolicy::Present => (present + late, total_days),
        LatePolicy::Excluded => (present, total_days.saturating_sub(late)),
    };
    if counted == 0 {
        return 1.0;
    }
    attended as f64 / counted as f64
}

impl Reconcile for AttendanceSchedule {
    type Entry = AttendanceMark;
    type Status = AttendanceStatus;

    fn reconcile(
        &self,
        entity_id: &str,
        entries: &[AttendanceMark],
        options: &ReconcileOptions,
    ) -> Result<AttendanceStatus> {
        check_entries(entity_id, entries, |date| self.contains(*date))?;

        let latest = latest_by_key(entries);
        let (mut present, mut absent, mut late) = (0, 0, 0);
        let mut absent_dates = Vec::new();

        // A day with no mark counts as present
        for date in self.dates() {
            match latest.get(date).map_or(Mark::Present, |m| m.mark) {
                Mark::Present => present += 1,
                Mark::Absent => {
                    absent += 1;
                    absent_dates.push(*date);
                }
                Mark::Late => late += 1,
            }
        }

        let total_days = self.len();
        let ratio = attendance_ratio(present, late, total_days, options.late_policy);

        Ok(AttendanceStatus {
            entity_id: entity_id.to_string(),
            total_days,
            present,
            absent,
            late,
            ratio,
            band: AttendanceBand::classify(ratio, options.at_risk_below),
            absent_dates,
        })
    }
}

impl AttendanceSchedule {
    /// The register for one class day: every student with their mark for that day,
    /// defaulting to [`Mark::Present`] for students nobody has marked.
    pub fn day_sheet<'a>(
        &self,
        date: NaiveDate,
        roster: &'a [Entity],
        marks: &[AttendanceMark],
    ) -> Result<Vec<(&'a Entity, Mark)>> {
        if !self.contains(date) {
            return Err(Error::InvalidValue {
                field: "class day",
                input: date.to_string(),
            });
        }

        if let Some(stranger) = marks
            .iter()
            .find(|m| m.date == date && !roster.iter().any(|e| e.id == m.entity_id))
        {
            return Err(Error::UnknownEntity {
                entity_id: stranger.entity_id.clone(),
            });
        }

        Ok(roster
            .iter()
            .map(|entity| {
                let own = marks.iter().filter(|m| m.entity_id == entity.id);
                let mark = latest_by_key(own)
                    .get(&date)
                    .map_or(Mark::Present, |m| m.mark);
                (entity, mark)
            })
            .collect())
    }
}

/// Reconciles every student on a roster, in roster order.
///
/// Entries are grouped by student first. An entry for a student who isn't on the roster
/// is rejected with [`Error::UnknownEntity`]. Students with no entries still get a row.
pub fn reconcile_roster<S>(
    schedule: &S,
    roster: &[Entity],
    entries: &[S::Entry],
    options: &ReconcileOptions,
) -> Result<Vec<Row<S::Status>>>
where
    S: Reconcile,
    S::Entry: Clone,
{
    let mut by_entity: HashMap<&str, Vec<S::Entry>> = roster
        .iter()
        .map(|entity| (entity.id.as_str(), Vec::new()))
        .collect();

    for entry in entries {
        by_entity
            .get_mut(entry.entity_id())
            .ok_or_else(|| Error::UnknownEntity {
                entity_id: entry.entity_id().to_string(),
            })?
            .push(entry.clone());
    }

    roster
        .iter()
        .map(|entity| {
            let own = by_entity
                .get(entity.id.as_str())
                .map_or(&[][..], Vec::as_slice);
            let status = schedule.reconcile(&entity.id, own, options)?;
            Ok(Row {
                entity: entity.clone(),
                status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::schedule::FeeScheduleBuilder;
    use crate::test_utils::*;

    fn before_due() -> ReconcileOptions {
        ReconcileOptions::as_of(date(2024, 12, 1))
    }

    fn after_due() -> ReconcileOptions {
        ReconcileOptions::as_of(date(2025, 4, 1))
    }

    /// Admission at t1, then three monthly tuition payments at t2..t4.
    fn partial_payments() -> Vec<FeePayment> {
        vec![
            FeePayment::new("S-001", ComponentKey::once("admission"), 10000.0, at(2024, 4, 5)),
            FeePayment::new("S-001", tuition("2024-04"), 1000.0, at(2024, 4, 18)),
            FeePayment::new("S-001", tuition("2024-05"), 1000.0, at(2024, 5, 18)),
            FeePayment::new("S-001", tuition("2024-06"), 1000.0, at(2024, 6, 18)),
        ]
    }

    #[test]
    fn test_no_payments_is_pending() {
        let schedule = sample_fee_schedule();
        let status = schedule.reconcile("S-001", &[], &before_due()).unwrap();

        assert_eq!(status.bucket, FeeBucket::Pending);
        assert_eq!(status.paid, 0.0);
        assert_eq!(status.due, 24000.0);
        assert_eq!(status.total, 24000.0);
        assert_eq!(status.components.len(), 14);
    }

    #[test]
    fn test_partial_payments_before_final_due_date() {
        let schedule = sample_fee_schedule();
        let status = schedule
            .reconcile("S-001", &partial_payments(), &before_due())
            .unwrap();

        assert_eq!(status.paid, 13000.0);
        assert_eq!(status.due, 11000.0);
        assert_eq!(status.bucket, FeeBucket::Partial);
    }

    #[test]
    fn test_partial_payments_after_final_due_date_are_overdue() {
        let schedule = sample_fee_schedule();
        let status = schedule
            .reconcile("S-001", &partial_payments(), &after_due())
            .unwrap();

        assert_eq!(status.paid, 13000.0);
        assert_eq!(status.due, 11000.0);
        assert_eq!(status.bucket, FeeBucket::Overdue);
    }

    #[test]
    fn test_component_buckets_use_their_own_due_dates() {
        let schedule = sample_fee_schedule();
        let status = schedule
            .reconcile("S-001", &partial_payments(), &before_due())
            .unwrap();

        // July to November tuition fell due before 2024-12-01 and is unpaid
        let overdue: Vec<String> = status
            .overdue_components()
            .map(|c| c.key.to_string())
            .collect();
        assert_eq!(
            overdue,
            vec![
                "tuition@2024-07",
                "tuition@2024-08",
                "tuition@2024-09",
                "tuition@2024-10",
                "tuition@2024-11",
            ]
        );

        let admission = &status.components[0];
        assert_eq!(admission.bucket, FeeBucket::Paid);
        assert_eq!(admission.due, 0.0);
    }

    #[test]
    fn test_exact_payment_is_paid_with_zero_due() {
        let schedule = sample_fee_schedule();
        let payments = full_payments("S-001", &schedule);
        let status = schedule.reconcile("S-001", &payments, &after_due()).unwrap();

        assert_eq!(status.paid, 24000.0);
        assert_eq!(status.due, 0.0);
        assert_eq!(status.raw_due, 0.0);
        assert_eq!(status.bucket, FeeBucket::Paid);
    }

    #[test]
    fn test_over_payment_clamps_due_but_keeps_raw_value() {
        let schedule = sample_fee_schedule();
        let mut payments = full_payments("S-001", &schedule);
        payments.push(FeePayment::new(
            "S-001",
            ComponentKey::once("exam"),
            2500.0,
            at(2025, 3, 25),
        ));
        let status = schedule.reconcile("S-001", &payments, &after_due()).unwrap();

        assert_eq!(status.paid, 24500.0);
        assert_eq!(status.raw_due, -500.0);
        assert_eq!(status.due, 0.0);
        assert_eq!(status.bucket, FeeBucket::Paid);
    }

    #[test]
    fn test_fractional_amounts_settle() {
        let schedule = FeeScheduleBuilder::new(sample_scope())
            .component(ComponentKey::once("library"), 0.1, date(2024, 4, 10))
            .component(ComponentKey::once("locker"), 0.2, date(2024, 4, 10))
            .build()
            .unwrap();
        let payments = vec![FeePayment::new(
            "S-001",
            ComponentKey::once("library"),
            0.3,
            at(2024, 4, 1),
        )];
        let status = schedule.reconcile("S-001", &payments, &after_due()).unwrap();

        assert!(status.raw_due > 0.0);
        assert_eq!(status.due, 0.0);
        assert_eq!(status.bucket, FeeBucket::Paid);
        assert_eq!(status.overdue_components().count(), 1);
    }

    #[test]
    fn test_later_payment_supersedes_instead_of_summing() {
        let schedule = sample_fee_schedule();
        let payments = vec![
            FeePayment::new("S-001", ComponentKey::once("admission"), 10000.0, at(2024, 4, 9)),
            FeePayment::new("S-001", ComponentKey::once("admission"), 8000.0, at(2024, 4, 1)),
            FeePayment::new("S-001", ComponentKey::once("admission"), 9000.0, at(2024, 4, 5)),
        ];
        let status = schedule.reconcile("S-001", &payments, &before_due()).unwrap();

        assert_eq!(status.paid, 10000.0);
        assert_eq!(status.due, 14000.0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let schedule = sample_fee_schedule();
        let payments = partial_payments();
        let first = schedule.reconcile("S-001", &payments, &before_due()).unwrap();
        let second = schedule.reconcile("S-001", &payments, &before_due()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_component_is_rejected() {
        let schedule = sample_fee_schedule();
        let mut payments = partial_payments();
        payments.push(FeePayment::new(
            "S-001",
            ComponentKey::once("transport"),
            500.0,
            at(2024, 6, 1),
        ));

        let result = schedule.reconcile("S-001", &payments, &before_due());
        match result {
            Err(Error::UnknownComponent { entity_id, key }) => {
                assert_eq!(entity_id, "S-001");
                assert_eq!(key, "transport");
            }
            other => panic!("expected UnknownComponent, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_for_other_student_is_rejected() {
        let schedule = sample_fee_schedule();
        let payments = vec![FeePayment::new(
            "S-002",
            ComponentKey::once("admission"),
            10000.0,
            at(2024, 4, 5),
        )];
        let result = schedule.reconcile("S-001", &payments, &before_due());
        assert!(matches!(result, Err(Error::EntityMismatch { .. })));
    }

    #[test]
    fn test_negative_payment_is_rejected() {
        let schedule = sample_fee_schedule();
        let payments = vec![FeePayment::new(
            "S-001",
            ComponentKey::once("exam"),
            -10.0,
            at(2024, 9, 1),
        )];
        let result = schedule.reconcile("S-001", &payments, &before_due());
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_no_marks_defaults_every_day_to_present() {
        let schedule = sample_attendance_schedule();
        let status = schedule.reconcile("S-001", &[], &before_due()).unwrap();

        assert_eq!(status.total_days, 20);
        assert_eq!(status.present, 20);
        assert_eq!(status.ratio, 1.0);
        assert_eq!(status.band, AttendanceBand::Perfect);
    }

    #[test]
    fn test_late_is_separate_by_default() {
        let schedule = sample_attendance_schedule();
        let marks = two_absent_one_late("S-001");
        let status = schedule.reconcile("S-001", &marks, &before_due()).unwrap();

        assert_eq!(status.present, 17);
        assert_eq!(status.absent, 2);
        assert_eq!(status.late, 1);
        assert_eq!(status.ratio, 0.85);
        assert_eq!(status.band, AttendanceBand::Regular);
        assert_eq!(status.absent_dates, vec![date(2024, 7, 2), date(2024, 7, 9)]);
    }

    #[test]
    fn test_late_policy_variants() {
        let schedule = sample_attendance_schedule();
        let marks = two_absent_one_late("S-001");

        let options = before_due().with_late_policy(LatePolicy::Present);
        let status = schedule.reconcile("S-001", &marks, &options).unwrap();
        assert_eq!(status.ratio, 0.9);

        let options = before_due().with_late_policy(LatePolicy::Excluded);
        let status = schedule.reconcile("S-001", &marks, &options).unwrap();
        assert_eq!(status.ratio, 17.0 / 19.0);
    }

    #[test]
    fn test_every_day_late() {
        let schedule = sample_attendance_schedule();
        let marks: Vec<AttendanceMark> = schedule
            .dates()
            .iter()
            .map(|d| AttendanceMark::new("S-001", *d, Mark::Late, at(2024, 7, 1)))
            .collect();

        // Nothing left to count
        let options = before_due().with_late_policy(LatePolicy::Excluded);
        let status = schedule.reconcile("S-001", &marks, &options).unwrap();
        assert_eq!(status.late, 20);
        assert_eq!(status.ratio, 1.0);
        assert_eq!(status.band, AttendanceBand::Perfect);

        let options = before_due().with_late_policy(LatePolicy::Present);
        let status = schedule.reconcile("S-001", &marks, &options).unwrap();
        assert_eq!(status.ratio, 1.0);
        assert_eq!(status.band, AttendanceBand::Perfect);

        let status = schedule.reconcile("S-001", &marks, &before_due()).unwrap();
        assert_eq!(status.ratio, 0.0);
        assert_eq!(status.band, AttendanceBand::AtRisk);
    }

    #[test]
    fn test_overwritten_mark_uses_last_written() {
        let schedule = sample_attendance_schedule();
        let marks = vec![
            AttendanceMark::new("S-001", date(2024, 7, 1), Mark::Absent, at(2024, 7, 1)),
            AttendanceMark::new("S-001", date(2024, 7, 1), Mark::Present, at(2024, 7, 2)),
        ];
        let status = schedule.reconcile("S-001", &marks, &before_due()).unwrap();
        assert_eq!(status.absent, 0);
        assert_eq!(status.ratio, 1.0);
    }

    #[test]
    fn test_mark_off_schedule_is_rejected() {
        let schedule = sample_attendance_schedule();
        // Saturday
        let marks = vec![AttendanceMark::new(
            "S-001",
            date(2024, 7, 6),
            Mark::Absent,
            at(2024, 7, 6),
        )];
        let result = schedule.reconcile("S-001", &marks, &before_due());
        assert!(matches!(result, Err(Error::UnknownComponent { .. })));
    }

    #[test]
    fn test_at_risk_band() {
        let schedule = sample_attendance_schedule();
        let marks: Vec<AttendanceMark> = schedule
            .dates()
            .iter()
            .take(6)
            .map(|d| AttendanceMark::new("S-001", *d, Mark::Absent, at(2024, 8, 1)))
            .collect();
        let status = schedule.reconcile("S-001", &marks, &before_due()).unwrap();
        assert_eq!(status.ratio, 0.7);
        assert_eq!(status.band, AttendanceBand::AtRisk);
    }

    #[test]
    fn test_day_sheet_defaults_to_present() {
        let schedule = sample_attendance_schedule();
        let roster = sample_roster();
        let marks = vec![
            AttendanceMark::new("S-002", date(2024, 7, 1), Mark::Absent, at(2024, 7, 1)),
            AttendanceMark::new("S-003", date(2024, 7, 2), Mark::Absent, at(2024, 7, 2)),
        ];

        let sheet = schedule.day_sheet(date(2024, 7, 1), &roster, &marks).unwrap();
        let marks_by_id: Vec<(&str, Mark)> =
            sheet.iter().map(|(e, m)| (e.id.as_str(), *m)).collect();
        assert_eq!(
            marks_by_id,
            vec![
                ("S-001", Mark::Present),
                ("S-002", Mark::Absent),
                ("S-003", Mark::Present),
                ("S-004", Mark::Present),
            ]
        );

        let result = schedule.day_sheet(date(2024, 7, 6), &roster, &marks);
        assert!(matches!(result, Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn test_reconcile_roster_keeps_roster_order_and_empty_students() {
        let schedule = sample_fee_schedule();
        let roster = sample_roster();
        let mut payments = partial_payments();
        payments.extend(full_payments("S-003", &schedule));

        let rows = reconcile_roster(&schedule, &roster, &payments, &before_due()).unwrap();
        let buckets: Vec<(&str, FeeBucket)> = rows
            .iter()
            .map(|r| (r.entity.id.as_str(), r.status.bucket))
            .collect();
        assert_eq!(
            buckets,
            vec![
                ("S-001", FeeBucket::Partial),
                ("S-002", FeeBucket::Pending),
                ("S-003", FeeBucket::Paid),
                ("S-004", FeeBucket::Pending),
            ]
        );
    }

    #[test]
    fn test_reconcile_roster_rejects_unknown_student() {
        let schedule = sample_fee_schedule();
        let roster = sample_roster();
        let payments = vec![FeePayment::new(
            "S-999",
            ComponentKey::once("admission"),
            10000.0,
            at(2024, 4, 5),
        )];
        let result = reconcile_roster(&schedule, &roster, &payments, &before_due());
        assert!(matches!(result, Err(Error::UnknownEntity { .. })));
    }

    #[test]
    fn test_reconcile_roster_empty_roster() {
        let schedule = sample_attendance_schedule();
        let rows = reconcile_roster(&schedule, &[], &[], &before_due()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_mock_ledger_reconciles_cleanly() {
        let schedule = sample_fee_schedule();
        let roster = sample_roster();
        let payments = mock_fee_ledger(&schedule, &roster, 7);

        let rows = reconcile_roster(&schedule, &roster, &payments, &after_due()).unwrap();
        assert_eq!(rows.len(), roster.len());
        for row in rows {
            assert!(row.status.paid <= row.status.total);
            assert_eq!(row.status.paid + row.status.due, row.status.total);
        }
    }
}
