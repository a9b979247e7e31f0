//! View models - everything a page needs to render a class ledger, derived in one pass.
//!
//! A [`Snapshot`] is the consistent set of inputs read from the system of record. Views
//! are built from scratch from a snapshot every time; nothing is patched in place. A fee
//! schedule edit therefore recomputes every student on the schedule.

use crate::core::aggregate::{Summaries, Totals, aggregate, collection_by_period};
use crate::core::ledger::{AttendanceMark, FeePayment, Mark};
use crate::core::projector::{Filters, project};
use crate::core::reconcile::{
    AttendanceBand, AttendanceStatus, FeeBucket, FeeStatus, Reconcile, ReconcileOptions, Row,
    reconcile_roster,
};
use crate::core::roster::Entity;
use crate::core::schedule::{AttendanceSchedule, ComponentKey, FeeSchedule, ScheduleScope};
use crate::errors::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Schedule, roster and entries read together under one request boundary.
#[derive(Debug, Clone)]
pub struct Snapshot<S: Reconcile> {
    /// The class's schedule
    pub schedule: S,
    /// Students in the class
    pub roster: Vec<Entity>,
    /// Ledger entries for those students
    pub entries: Vec<S::Entry>,
}

/// Fee schedule with its roster and payments.
pub type FeeSnapshot = Snapshot<FeeSchedule>;

/// Attendance schedule with its roster and marks.
pub type AttendanceSnapshot = Snapshot<AttendanceSchedule>;

impl<S> Snapshot<S>
where
    S: Reconcile,
    S::Entry: Clone,
{
    /// Reconciles every student in the snapshot.
    pub fn reconcile(&self, options: &ReconcileOptions) -> Result<Vec<Row<S::Status>>> {
        reconcile_roster(&self.schedule, &self.roster, &self.entries, options)
    }
}

impl Snapshot<FeeSchedule> {
    /// Builds the fee ledger view.
    pub fn view(&self, options: &ReconcileOptions) -> Result<FeeLedgerView> {
        let rows = self.reconcile(options)?;
        Ok(FeeLedgerView::from_rows(
            self.schedule.scope().clone(),
            options.as_of,
            self.schedule.total(),
            rows,
        ))
    }

    /// Replaces a component amount and rebuilds the whole view from the edited schedule.
    pub fn set_component_amount(
        &mut self,
        key: &ComponentKey,
        amount: f64,
        options: &ReconcileOptions,
    ) -> Result<FeeLedgerView> {
        self.schedule.set_component_amount(key, amount)?;
        self.view(options)
    }

    /// Appends a payment after checking it reconciles, and returns the rebuilt view.
    ///
    /// The snapshot is left unchanged when the payment is rejected.
    pub fn record_payment(
        &mut self,
        payment: FeePayment,
        options: &ReconcileOptions,
    ) -> Result<FeeLedgerView> {
        self.entries.push(payment);
        let view = self.view(options);
        if view.is_err() {
            self.entries.pop();
        }
        view
    }
}

impl Snapshot<AttendanceSchedule> {
    /// Builds the attendance view.
    pub fn view(&self, options: &ReconcileOptions) -> Result<AttendanceView> {
        let rows = self.reconcile(options)?;
        Ok(AttendanceView::from_rows(
            self.schedule.scope().clone(),
            self.schedule.len(),
            rows,
        ))
    }

    /// The register for one class day, unmarked students defaulting to present.
    pub fn day_sheet(&self, date: NaiveDate) -> Result<Vec<(&Entity, Mark)>> {
        self.schedule.day_sheet(date, &self.roster, &self.entries)
    }

    /// Records or overwrites a mark after checking it reconciles, and returns the rebuilt view.
    ///
    /// The snapshot is left unchanged when the mark is rejected.
    pub fn set_mark(
        &mut self,
        mark: AttendanceMark,
        options: &ReconcileOptions,
    ) -> Result<AttendanceView> {
        self.entries.push(mark);
        let view = self.view(options);
        if view.is_err() {
            self.entries.pop();
        }
        view
    }
}

/// Fee ledger for one class and term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeLedgerView {
    /// Class and term
    pub scope: ScheduleScope,
    /// Date statuses were computed for
    pub as_of: NaiveDate,
    /// What each student owes in total
    pub total_per_student: f64,
    /// One row per student, roster order
    pub rows: Vec<Row<FeeStatus>>,
    /// Roll-up per class
    pub by_group: Summaries<String, FeeBucket>,
    /// Roll-up per fee period
    pub by_period: Summaries<String, FeeBucket>,
    /// Whole-ledger totals
    pub overall: Totals,
}

impl FeeLedgerView {
    fn from_rows(
        scope: ScheduleScope,
        as_of: NaiveDate,
        total_per_student: f64,
        rows: Vec<Row<FeeStatus>>,
    ) -> Self {
        let by_group = aggregate(&rows, |row| row.entity.group_id.clone());
        let by_period = collection_by_period(&rows);
        let overall = overall_totals(&by_group);
        Self {
            scope,
            as_of,
            total_per_student,
            rows,
            by_group,
            by_period,
            overall,
        }
    }

    /// Rows passing the filters.
    #[must_use]
    pub fn visible(&self, filters: &Filters<FeeBucket>) -> Vec<&Row<FeeStatus>> {
        project(&self.rows, filters)
    }
}

/// Attendance register for one class and term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceView {
    /// Class and term
    pub scope: ScheduleScope,
    /// Class days in the term
    pub class_days: usize,
    /// One row per student, roster order
    pub rows: Vec<Row<AttendanceStatus>>,
    /// Roll-up per class
    pub by_group: Summaries<String, AttendanceBand>,
    /// Whole-register totals
    pub overall: Totals,
}

impl AttendanceView {
    fn from_rows(
        scope: ScheduleScope,
        class_days: usize,
        rows: Vec<Row<AttendanceStatus>>,
    ) -> Self {
        let by_group = aggregate(&rows, |row| row.entity.group_id.clone());
        let overall = overall_totals(&by_group);
        Self {
            scope,
            class_days,
            rows,
            by_group,
            overall,
        }
    }

    /// Rows passing the filters.
    #[must_use]
    pub fn visible(&self, filters: &Filters<AttendanceBand>) -> Vec<&Row<AttendanceStatus>> {
        project(&self.rows, filters)
    }
}

fn overall_totals<B: Ord>(summaries: &Summaries<String, B>) -> Totals {
    let mut overall = Totals::default();
    for summary in summaries.values() {
        overall += summary.totals;
    }
    overall
}
