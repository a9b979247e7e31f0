//! Student roster storage.
//!
//! Students are created once from the school's roster and never hard-deleted: withdrawing
//! a student hides them from class rosters while their ledger rows stay on record.

use crate::{
    core::roster::{Contact, Entity},
    entities::{Student, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

impl From<student::Model> for Entity {
    fn from(model: student::Model) -> Self {
        Self {
            id: model.id,
            display_name: model.display_name,
            group_id: model.group_id,
            admission_no: model.admission_no,
            roll_no: model.roll_no,
            contact: Contact {
                guardian: model.guardian,
                phone: model.phone,
                email: model.email,
            },
        }
    }
}

/// Adds a student to the roster.
///
/// The id, name and class are trimmed and must not be empty, and the id must not already
/// be taken (withdrawn students keep their id).
#[instrument(skip(db, entity), fields(student_id = %entity.id))]
pub async fn create_student<C>(db: &C, entity: &Entity) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    let id = entity.id.trim();
    if id.is_empty() {
        return Err(Error::InvalidValue {
            field: "student id",
            input: entity.id.clone(),
        });
    }
    if entity.display_name.trim().is_empty() {
        return Err(Error::InvalidValue {
            field: "student name",
            input: entity.display_name.clone(),
        });
    }
    if entity.group_id.trim().is_empty() {
        return Err(Error::InvalidValue {
            field: "class",
            input: entity.group_id.clone(),
        });
    }
    if Student::find_by_id(id).one(db).await?.is_some() {
        return Err(Error::InvalidValue {
            field: "student id (already taken)",
            input: id.to_string(),
        });
    }

    let student = student::ActiveModel {
        id: Set(id.to_string()),
        display_name: Set(entity.display_name.trim().to_string()),
        group_id: Set(entity.group_id.trim().to_string()),
        admission_no: Set(entity.admission_no.clone()),
        roll_no: Set(entity.roll_no.clone()),
        guardian: Set(entity.contact.guardian.clone()),
        phone: Set(entity.contact.phone.clone()),
        email: Set(entity.contact.email.clone()),
        is_withdrawn: Set(false),
    };

    let result = student.insert(db).await?;
    info!(group_id = %result.group_id, "created student");
    Ok(result)
}

/// Finds an enrolled student by id, returning None if unknown or withdrawn.
pub async fn get_student<C>(db: &C, id: &str) -> Result<Option<Entity>>
where
    C: ConnectionTrait,
{
    Ok(Student::find_by_id(id)
        .filter(student::Column::IsWithdrawn.eq(false))
        .one(db)
        .await?
        .map(Entity::from))
}

/// Enrolled students of one class, ordered by display name (then id for equal names).
pub async fn get_students_for_group<C>(db: &C, group_id: &str) -> Result<Vec<Entity>>
where
    C: ConnectionTrait,
{
    Ok(Student::find()
        .filter(student::Column::GroupId.eq(group_id))
        .filter(student::Column::IsWithdrawn.eq(false))
        .order_by_asc(student::Column::DisplayName)
        .order_by_asc(student::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Entity::from)
        .collect())
}

/// Marks a student as withdrawn so they drop off class rosters.
#[instrument(skip(db))]
pub async fn withdraw_student<C>(db: &C, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let student = Student::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StudentNotFound { id: id.to_string() })?;

    let mut active: student::ActiveModel = student.into();
    active.is_withdrawn = Set(true);
    active.update(db).await?;
    info!("withdrew student");
    Ok(())
}
