//! Attendance day entity - The class days of a term, one row per day.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance day database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_days")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class or section
    pub group_id: String,
    /// Academic term
    pub term_id: String,
    /// The class day
    pub date: Date,
}

/// `AttendanceDay` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
