//! Fee schedule and payment storage.
//!
//! Payments are append-only: a correction is a new row for the same component, and the
//! reconciliation engine lets the latest one win. Schedules are rebuilt through
//! [`FeeScheduleBuilder`] on every load so a stored schedule is validated like a new one.

use crate::{
    core::{
        ledger::FeePayment,
        schedule::{ComponentKey, FeeSchedule, FeeScheduleBuilder, ScheduleScope},
        view::{FeeSnapshot, Snapshot},
    },
    db::roster,
    entities::{Student, fee_component, fee_payment, fee_schedule},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Finds the stored schedule row for a class and term.
async fn find_schedule_row<C>(db: &C, scope: &ScheduleScope) -> Result<Option<fee_schedule::Model>>
where
    C: ConnectionTrait,
{
    fee_schedule::Entity::find()
        .filter(fee_schedule::Column::GroupId.eq(scope.group_id.as_str()))
        .filter(fee_schedule::Column::TermId.eq(scope.term_id.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn load_with_row<C>(
    db: &C,
    scope: &ScheduleScope,
) -> Result<(fee_schedule::Model, FeeSchedule)>
where
    C: ConnectionTrait,
{
    let row = find_schedule_row(db, scope)
        .await?
        .ok_or_else(|| Error::ScheduleNotFound {
            group_id: scope.group_id.clone(),
            term_id: scope.term_id.clone(),
        })?;

    let components = fee_component::Entity::find()
        .filter(fee_component::Column::ScheduleId.eq(row.id))
        .order_by_asc(fee_component::Column::Position)
        .all(db)
        .await?;

    let schedule = components
        .into_iter()
        .fold(FeeScheduleBuilder::new(scope.clone()), |builder, c| {
            let key = ComponentKey {
                name: c.name,
                period: c.period,
            };
            builder.component(key, c.amount, c.due_date)
        })
        .build()?;

    Ok((row, schedule))
}

/// Stores a validated fee schedule. A class and term can only have one schedule.
#[instrument(skip_all, fields(scope = %schedule.scope()))]
pub async fn save_fee_schedule(
    db: &DatabaseConnection,
    schedule: &FeeSchedule,
) -> Result<fee_schedule::Model> {
    let scope = schedule.scope();
    let txn = db.begin().await?;

    if find_schedule_row(&txn, scope).await?.is_some() {
        return Err(Error::InvalidSchedule {
            reason: format!("a fee schedule for {scope} already exists"),
        });
    }

    let now = Utc::now().naive_utc();
    let row = fee_schedule::ActiveModel {
        group_id: Set(scope.group_id.clone()),
        term_id: Set(scope.term_id.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (position, component) in schedule.components().iter().enumerate() {
        fee_component::ActiveModel {
            schedule_id: Set(row.id),
            name: Set(component.key.name.clone()),
            period: Set(component.key.period.clone()),
            amount: Set(component.amount),
            due_date: Set(component.due_date),
            position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        components = schedule.components().len(),
        total = schedule.total(),
        "saved fee schedule"
    );
    Ok(row)
}

/// Loads the fee schedule for a class and term.
pub async fn load_fee_schedule<C>(db: &C, scope: &ScheduleScope) -> Result<FeeSchedule>
where
    C: ConnectionTrait,
{
    load_with_row(db, scope).await.map(|(_, schedule)| schedule)
}

/// Every class and term with a stored fee schedule.
pub async fn get_fee_schedule_scopes<C>(db: &C) -> Result<Vec<ScheduleScope>>
where
    C: ConnectionTrait,
{
    Ok(fee_schedule::Entity::find()
        .order_by_asc(fee_schedule::Column::GroupId)
        .order_by_asc(fee_schedule::Column::TermId)
        .all(db)
        .await?
        .into_iter()
        .map(|row| ScheduleScope::new(row.group_id, row.term_id))
        .collect())
}

/// Changes one component's amount and returns the edited schedule.
///
/// Statuses aren't stored, so nothing else needs updating: the next snapshot reconciles
/// every student against the new amount.
#[instrument(skip_all, fields(scope = %scope, key = %key))]
pub async fn set_component_amount(
    db: &DatabaseConnection,
    scope: &ScheduleScope,
    key: &ComponentKey,
    amount: f64,
) -> Result<FeeSchedule> {
    let txn = db.begin().await?;
    let (row, mut schedule) = load_with_row(&txn, scope).await?;
    schedule.set_component_amount(key, amount)?;

    let update = fee_component::Entity::update_many()
        .col_expr(fee_component::Column::Amount, Expr::value(amount))
        .filter(fee_component::Column::ScheduleId.eq(row.id))
        .filter(fee_component::Column::Name.eq(key.name.as_str()));
    let update = match &key.period {
        Some(period) => update.filter(fee_component::Column::Period.eq(period.as_str())),
        None => update.filter(fee_component::Column::Period.is_null()),
    };
    update.exec(&txn).await?;

    let mut active: fee_schedule::ActiveModel = row.into();
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&txn).await?;

    txn.commit().await?;
    info!(amount, total = schedule.total(), "updated fee component");
    Ok(schedule)
}

/// Appends a payment to the ledger.
///
/// The amount must be valid, the component must be on the class's schedule, and the
/// student must be enrolled in the class. Earlier payments for the component are kept.
#[instrument(skip_all, fields(scope = %scope, student_id = %payment.entity_id))]
pub async fn record_payment(
    db: &DatabaseConnection,
    scope: &ScheduleScope,
    payment: &FeePayment,
) -> Result<fee_payment::Model> {
    payment.validate_amount()?;

    let txn = db.begin().await?;
    let (row, schedule) = load_with_row(&txn, scope).await?;

    if !schedule.contains(&payment.component) {
        return Err(Error::UnknownComponent {
            entity_id: payment.entity_id.clone(),
            key: payment.component.to_string(),
        });
    }

    let student = roster::get_student(&txn, &payment.entity_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            id: payment.entity_id.clone(),
        })?;
    if student.group_id != scope.group_id {
        return Err(Error::UnknownEntity {
            entity_id: payment.entity_id.clone(),
        });
    }

    let result = fee_payment::ActiveModel {
        schedule_id: Set(row.id),
        student_id: Set(payment.entity_id.clone()),
        component_name: Set(payment.component.name.clone()),
        component_period: Set(payment.component.period.clone()),
        amount: Set(payment.amount),
        recorded_at: Set(payment.recorded_at),
        method: Set(payment.method.map(|m| m.to_string())),
        remarks: Set(payment.remarks.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(
        component = %payment.component,
        amount = payment.amount,
        "recorded payment"
    );
    Ok(result)
}

impl TryFrom<fee_payment::Model> for FeePayment {
    type Error = Error;

    fn try_from(model: fee_payment::Model) -> Result<Self> {
        let method = model.method.as_deref().map(str::parse).transpose()?;
        Ok(Self {
            entity_id: model.student_id,
            component: ComponentKey {
                name: model.component_name,
                period: model.component_period,
            },
            amount: model.amount,
            recorded_at: model.recorded_at,
            method,
            remarks: model.remarks,
        })
    }
}

/// Every payment recorded against a class's schedule, oldest first.
pub async fn get_payments_for_group<C>(db: &C, scope: &ScheduleScope) -> Result<Vec<FeePayment>>
where
    C: ConnectionTrait,
{
    let Some(row) = find_schedule_row(db, scope).await? else {
        return Err(Error::ScheduleNotFound {
            group_id: scope.group_id.clone(),
            term_id: scope.term_id.clone(),
        });
    };

    fee_payment::Entity::find()
        .filter(fee_payment::Column::ScheduleId.eq(row.id))
        .order_by_asc(fee_payment::Column::RecordedAt)
        .order_by_asc(fee_payment::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(FeePayment::try_from)
        .collect()
}

/// Payments recorded by one student against a class's schedule, oldest first.
pub async fn get_payments_for_student<C>(
    db: &C,
    scope: &ScheduleScope,
    student_id: &str,
) -> Result<Vec<FeePayment>>
where
    C: ConnectionTrait,
{
    Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            id: student_id.to_string(),
        })?;

    Ok(get_payments_for_group(db, scope)
        .await?
        .into_iter()
        .filter(|p| p.entity_id == student_id)
        .collect())
}

/// Reads the schedule, the enrolled roster and their payments in one transaction.
///
/// Payments by students who have since withdrawn are left out along with the students.
#[instrument(skip_all, fields(scope = %scope))]
pub async fn load_fee_snapshot(
    db: &DatabaseConnection,
    scope: &ScheduleScope,
) -> Result<FeeSnapshot> {
    let txn = db.begin().await?;
    let schedule = load_fee_schedule(&txn, scope).await?;
    let roster = roster::get_students_for_group(&txn, &scope.group_id).await?;
    let payments = get_payments_for_group(&txn, scope).await?;
    txn.commit().await?;

    let enrolled: HashSet<&str> = roster.iter().map(|e| e.id.as_str()).collect();
    let entries: Vec<FeePayment> = payments
        .into_iter()
        .filter(|p| enrolled.contains(p.entity_id.as_str()))
        .collect();
    debug!(
        students = roster.len(),
        payments = entries.len(),
        "loaded fee snapshot"
    );

    Ok(Snapshot {
        schedule,
        roster,
        entries,
    })
}
