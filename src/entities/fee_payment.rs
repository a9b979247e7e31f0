//! Fee payment entity - Append-only ledger of payments.
//!
//! Rows are never updated or deleted. A correction is a new row for the same
//! component, which supersedes the earlier one when statuses are derived.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fee payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Schedule the payment was recorded against
    pub schedule_id: i64,
    /// Student who paid
    pub student_id: String,
    /// Name of the component paid
    pub component_name: String,
    /// Period of the component paid, `None` for one-off components
    pub component_period: Option<String>,
    /// Amount paid toward the component
    pub amount: f64,
    /// When the payment was recorded
    pub recorded_at: DateTimeUtc,
    /// Payment method: `"cash"`, `"card"`, `"bank_transfer"`, ...
    pub method: Option<String>,
    /// Free-form remarks
    pub remarks: Option<String>,
}

/// Defines relationships between `FeePayment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one schedule
    #[sea_orm(
        belongs_to = "super::fee_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::fee_schedule::Column::Id"
    )]
    Schedule,
    /// Each payment belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::fee_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
