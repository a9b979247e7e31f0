//! Shared test utilities for `SchoolLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and building fixture schedules, rosters and ledgers with known totals.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        ledger::{AttendanceMark, FeePayment, Mark},
        roster::{Contact, Entity},
        schedule::{
            AttendanceSchedule, ComponentKey, FeeSchedule, FeeScheduleBuilder, ScheduleScope,
        },
    },
    db::{attendance, fees, roster},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all store tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date. Panics on an invalid date, which is a broken test.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Midnight UTC on the given date.
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Class 7-A, academic year 2024-25.
pub fn sample_scope() -> ScheduleScope {
    ScheduleScope::new("7-A", "2024-25")
}

/// Monthly tuition key for a `YYYY-MM` period.
pub fn tuition(period: &str) -> ComponentKey {
    ComponentKey::periodic("tuition", period)
}

/// The 2024-25 fee schedule for 7-A.
///
/// # Components
/// * `admission`: 10000, due 2024-04-10
/// * `tuition@2024-04` .. `tuition@2025-03`: 1000 each, due the 20th
/// * `exam`: 2000, due 2025-02-15
///
/// Total 24000 across 14 components, final due date 2025-03-20.
pub fn sample_fee_schedule() -> FeeSchedule {
    FeeScheduleBuilder::new(sample_scope())
        .component(ComponentKey::once("admission"), 10000.0, date(2024, 4, 10))
        .monthly("tuition", 1000.0, date(2024, 4, 20), 12)
        .component(ComponentKey::once("exam"), 2000.0, date(2025, 2, 15))
        .build()
        .unwrap()
}

/// Weekdays from Monday 2024-07-01 to Friday 2024-07-26: 20 class days.
pub fn sample_attendance_schedule() -> AttendanceSchedule {
    AttendanceSchedule::class_days(sample_scope(), date(2024, 7, 1), date(2024, 7, 26), &[])
        .unwrap()
}

/// Four students in 7-A, already in display-name order.
pub fn sample_roster() -> Vec<Entity> {
    let mut roster = vec![
        Entity::new("S-001", "Asha Rao", "7-A")
            .with_admission_no("ADM-2024-001")
            .with_roll_no("R-01"),
        Entity::new("S-002", "Bilal Khan", "7-A")
            .with_admission_no("ADM-2024-002")
            .with_roll_no("R-02"),
        Entity::new("S-003", "Chitra Nair", "7-A")
            .with_admission_no("ADM-2024-003")
            .with_roll_no("R-03"),
        Entity::new("S-004", "Dev Menon", "7-A")
            .with_admission_no("ADM-2024-004")
            .with_roll_no("R-04"),
    ];
    roster[0].contact = Contact {
        guardian: Some("Meena Rao".to_string()),
        phone: Some("+91 98450 00001".to_string()),
        email: None,
    };
    roster
}

/// One payment per component for its full amount, recorded on its due date.
pub fn full_payments(entity_id: &str, schedule: &FeeSchedule) -> Vec<FeePayment> {
    schedule
        .components()
        .iter()
        .map(|component| {
            let due = component.due_date;
            FeePayment::new(
                entity_id,
                component.key.clone(),
                component.amount,
                midnight(due),
            )
        })
        .collect()
}

/// A payment against a key written as text (`"admission"`, `"tuition@2024-04"`).
pub fn fee_payment(entity_id: &str, key: &str, amount: f64) -> FeePayment {
    FeePayment::new(entity_id, key.parse().unwrap(), amount, at(2024, 6, 1))
}

/// Absent on 2024-07-02 and 2024-07-09, late on 2024-07-16, each written that day.
pub fn two_absent_one_late(entity_id: &str) -> Vec<AttendanceMark> {
    vec![
        AttendanceMark::new(entity_id, date(2024, 7, 2), Mark::Absent, at(2024, 7, 2)),
        AttendanceMark::new(entity_id, date(2024, 7, 9), Mark::Absent, at(2024, 7, 9)),
        AttendanceMark::new(entity_id, date(2024, 7, 16), Mark::Late, at(2024, 7, 16)),
    ]
}

/// Deterministic mock ledger: for every student and component, maybe a payment of a whole
/// amount no larger than the component. The same seed always yields the same ledger.
pub fn mock_fee_ledger(schedule: &FeeSchedule, roster: &[Entity], seed: u64) -> Vec<FeePayment> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        state >> 33
    };

    let mut payments = Vec::new();
    for entity in roster {
        for component in schedule.components() {
            // Roughly a third of components stay unpaid
            if next() % 3 == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let share = (next() % 5 + 1) as f64 / 5.0;
            let amount = (component.amount * share).floor();
            payments.push(FeePayment::new(
                entity.id.clone(),
                component.key.clone(),
                amount,
                midnight(component.due_date),
            ));
        }
    }
    payments
}

/// Stores the sample roster, fee schedule and attendance term.
pub async fn seed_sample_class(db: &DatabaseConnection) -> Result<()> {
    for entity in sample_roster() {
        roster::create_student(db, &entity).await?;
    }
    fees::save_fee_schedule(db, &sample_fee_schedule()).await?;
    attendance::save_attendance_schedule(db, &sample_attendance_schedule()).await?;
    Ok(())
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}
