//! Attendance mark entity - At most one row per student and class day.
//!
//! Marking the same student on the same day again overwrites the row in place.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance mark database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_marks")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class or section
    pub group_id: String,
    /// Academic term
    pub term_id: String,
    /// Student the mark is for
    pub student_id: String,
    /// Class day
    pub date: Date,
    /// `"present"`, `"absent"` or `"late"`
    pub mark: String,
    /// When the mark was last written
    pub recorded_at: DateTimeUtc,
    /// Free-form remarks
    pub remarks: Option<String>,
}

/// Defines relationships between `AttendanceMark` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each mark belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
