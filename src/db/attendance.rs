//! Attendance term and mark storage.
//!
//! A term is stored as its list of class days. Marks are kept one per student per day:
//! marking a student again on the same day overwrites the earlier mark.

use crate::{
    core::{
        ledger::AttendanceMark,
        schedule::{AttendanceSchedule, AttendanceScheduleBuilder, ScheduleScope},
        view::{AttendanceSnapshot, Snapshot},
    },
    db::roster,
    entities::{attendance_day, attendance_mark},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Stores the class days of a term. A class and term can only be stored once.
#[instrument(skip_all, fields(scope = %schedule.scope()))]
pub async fn save_attendance_schedule(
    db: &DatabaseConnection,
    schedule: &AttendanceSchedule,
) -> Result<()> {
    let scope = schedule.scope();
    let txn = db.begin().await?;

    let existing = attendance_day::Entity::find()
        .filter(attendance_day::Column::GroupId.eq(scope.group_id.as_str()))
        .filter(attendance_day::Column::TermId.eq(scope.term_id.as_str()))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::InvalidSchedule {
            reason: format!("an attendance term for {scope} already exists"),
        });
    }

    let days = schedule.dates().iter().map(|date| attendance_day::ActiveModel {
        group_id: Set(scope.group_id.clone()),
        term_id: Set(scope.term_id.clone()),
        date: Set(*date),
        ..Default::default()
    });
    attendance_day::Entity::insert_many(days).exec(&txn).await?;

    txn.commit().await?;
    info!(class_days = schedule.len(), "saved attendance term");
    Ok(())
}

/// Loads the class days of a term.
pub async fn load_attendance_schedule<C>(
    db: &C,
    scope: &ScheduleScope,
) -> Result<AttendanceSchedule>
where
    C: ConnectionTrait,
{
    let days = attendance_day::Entity::find()
        .filter(attendance_day::Column::GroupId.eq(scope.group_id.as_str()))
        .filter(attendance_day::Column::TermId.eq(scope.term_id.as_str()))
        .order_by_asc(attendance_day::Column::Date)
        .all(db)
        .await?;

    if days.is_empty() {
        return Err(Error::ScheduleNotFound {
            group_id: scope.group_id.clone(),
            term_id: scope.term_id.clone(),
        });
    }

    AttendanceScheduleBuilder::new(scope.clone())
        .dates(days.into_iter().map(|day| day.date))
        .build()
}

/// Every class and term with stored class days.
pub async fn get_attendance_scopes<C>(db: &C) -> Result<Vec<ScheduleScope>>
where
    C: ConnectionTrait,
{
    let scopes: Vec<(String, String)> = attendance_day::Entity::find()
        .select_only()
        .column(attendance_day::Column::GroupId)
        .column(attendance_day::Column::TermId)
        .distinct()
        .order_by_asc(attendance_day::Column::GroupId)
        .order_by_asc(attendance_day::Column::TermId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(scopes
        .into_iter()
        .map(|(group_id, term_id)| ScheduleScope::new(group_id, term_id))
        .collect())
}

/// Records a mark, overwriting any earlier mark for the same student and day.
///
/// The date must be a class day of the term and the student must be enrolled in the class.
#[instrument(skip_all, fields(scope = %scope, student_id = %mark.entity_id, date = %mark.date))]
pub async fn set_mark(
    db: &DatabaseConnection,
    scope: &ScheduleScope,
    mark: &AttendanceMark,
) -> Result<attendance_mark::Model> {
    let txn = db.begin().await?;
    let schedule = load_attendance_schedule(&txn, scope).await?;

    if !schedule.contains(mark.date) {
        return Err(Error::UnknownComponent {
            entity_id: mark.entity_id.clone(),
            key: mark.date.to_string(),
        });
    }

    let student = roster::get_student(&txn, &mark.entity_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            id: mark.entity_id.clone(),
        })?;
    if student.group_id != scope.group_id {
        return Err(Error::UnknownEntity {
            entity_id: mark.entity_id.clone(),
        });
    }

    let existing = attendance_mark::Entity::find()
        .filter(attendance_mark::Column::GroupId.eq(scope.group_id.as_str()))
        .filter(attendance_mark::Column::TermId.eq(scope.term_id.as_str()))
        .filter(attendance_mark::Column::StudentId.eq(mark.entity_id.as_str()))
        .filter(attendance_mark::Column::Date.eq(mark.date))
        .one(&txn)
        .await?;

    let result = if let Some(row) = existing {
        debug!(previous = %row.mark, "overwriting mark");
        let mut active: attendance_mark::ActiveModel = row.into();
        active.mark = Set(mark.mark.to_string());
        active.recorded_at = Set(mark.recorded_at);
        active.remarks = Set(mark.remarks.clone());
        active.update(&txn).await?
    } else {
        attendance_mark::ActiveModel {
            group_id: Set(scope.group_id.clone()),
            term_id: Set(scope.term_id.clone()),
            student_id: Set(mark.entity_id.clone()),
            date: Set(mark.date),
            mark: Set(mark.mark.to_string()),
            recorded_at: Set(mark.recorded_at),
            remarks: Set(mark.remarks.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?
    };

    txn.commit().await?;
    info!(mark = %mark.mark, "recorded attendance");
    Ok(result)
}

impl TryFrom<attendance_mark::Model> for AttendanceMark {
    type Error = Error;

    fn try_from(model: attendance_mark::Model) -> Result<Self> {
        Ok(Self {
            entity_id: model.student_id,
            date: model.date,
            mark: model.mark.parse()?,
            recorded_at: model.recorded_at,
            remarks: model.remarks,
        })
    }
}

/// Every stored mark for a class and term, by date then student.
pub async fn get_marks_for_group<C>(db: &C, scope: &ScheduleScope) -> Result<Vec<AttendanceMark>>
where
    C: ConnectionTrait,
{
    attendance_mark::Entity::find()
        .filter(attendance_mark::Column::GroupId.eq(scope.group_id.as_str()))
        .filter(attendance_mark::Column::TermId.eq(scope.term_id.as_str()))
        .order_by_asc(attendance_mark::Column::Date)
        .order_by_asc(attendance_mark::Column::StudentId)
        .all(db)
        .await?
        .into_iter()
        .map(AttendanceMark::try_from)
        .collect()
}

/// Reads the term, the enrolled roster and their marks in one transaction.
#[instrument(skip_all, fields(scope = %scope))]
pub async fn load_attendance_snapshot(
    db: &DatabaseConnection,
    scope: &ScheduleScope,
) -> Result<AttendanceSnapshot> {
    let txn = db.begin().await?;
    let schedule = load_attendance_schedule(&txn, scope).await?;
    let roster = roster::get_students_for_group(&txn, &scope.group_id).await?;
    let marks = get_marks_for_group(&txn, scope).await?;
    txn.commit().await?;

    let enrolled: HashSet<&str> = roster.iter().map(|e| e.id.as_str()).collect();
    let entries: Vec<AttendanceMark> = marks
        .into_iter()
        .filter(|m| enrolled.contains(m.entity_id.as_str()))
        .collect();
    debug!(
        students = roster.len(),
        marks = entries.len(),
        "loaded attendance snapshot"
    );

    Ok(Snapshot {
        schedule,
        roster,
        entries,
    })
}
