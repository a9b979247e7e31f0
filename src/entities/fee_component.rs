//! Fee component entity - One line of a fee schedule.
//!
//! A component is identified within its schedule by `name` plus an optional `period`
//! (e.g. `"tuition"` for `"2024-04"`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fee component database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_components")]
pub struct Model {
    /// Unique identifier for the component row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Schedule this component belongs to
    pub schedule_id: i64,
    /// Component name, e.g. `"admission"`
    pub name: String,
    /// Period covered, `None` for one-off components
    pub period: Option<String>,
    /// Amount owed
    pub amount: f64,
    /// Date the component falls due
    pub due_date: Date,
    /// Position within the schedule
    pub position: i32,
}

/// Defines relationships between `FeeComponent` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each component belongs to one schedule
    #[sea_orm(
        belongs_to = "super::fee_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::fee_schedule::Column::Id"
    )]
    Schedule,
}

impl Related<super::fee_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
