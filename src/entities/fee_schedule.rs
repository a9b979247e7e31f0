//! Fee schedule entity - One row per class and term that has a fee structure.
//!
//! The components live in `fee_components`; the schedule total is never stored and is
//! always recomputed from them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fee schedule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_schedules")]
pub struct Model {
    /// Unique identifier for the schedule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class or section the schedule applies to
    pub group_id: String,
    /// Academic term or year
    pub term_id: String,
    /// When the schedule was created
    pub created_at: DateTime,
    /// When a component was last edited
    pub updated_at: DateTime,
}

/// Defines relationships between `FeeSchedule` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One schedule has many components
    #[sea_orm(has_many = "super::fee_component::Entity")]
    Components,
    /// One schedule has many payments
    #[sea_orm(has_many = "super::fee_payment::Entity")]
    Payments,
}

impl Related<super::fee_component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Components.def()
    }
}

impl Related<super::fee_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
