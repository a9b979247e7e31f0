//! Student entity - One row per student on a class roster.
//!
//! The `id` is the school's stable student identifier and is what every ledger entry
//! references. Withdrawn students are soft-deleted so their ledger history stays intact.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Stable student identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Name shown in registers and reports
    pub display_name: String,
    /// Class or section, e.g. `"7-A"`
    pub group_id: String,
    /// School-issued admission number
    pub admission_no: Option<String>,
    /// Roll number within the class
    pub roll_no: Option<String>,
    /// Parent or guardian name
    pub guardian: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Contact email address
    pub email: Option<String>,
    /// Soft delete flag - if true, the student has left and is hidden from rosters
    pub is_withdrawn: bool,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many fee payments
    #[sea_orm(has_many = "super::fee_payment::Entity")]
    FeePayments,
    /// One student has many attendance marks
    #[sea_orm(has_many = "super::attendance_mark::Entity")]
    AttendanceMarks,
}

impl Related<super::fee_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeePayments.def()
    }
}

impl Related<super::attendance_mark::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceMarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
