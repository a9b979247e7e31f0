//! Seeding from config.toml.
//!
//! Seeding only ever adds: students, fee schedules and attendance terms already in the
//! database are skipped, never overwritten, so stored edits survive a restart.

use crate::{
    config::settings::{AppConfig, StudentConfig},
    db::{attendance, fees, roster},
    entities::Student,
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::{debug, info, instrument, warn};

/// What a seeding run added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Students added to the roster
    pub students: usize,
    /// Fee schedules stored
    pub fee_schedules: usize,
    /// Attendance terms stored
    pub attendance_terms: usize,
}

/// Stores every configured student, fee schedule and attendance term that isn't stored yet.
///
/// Every configured schedule is validated before anything is written.
#[instrument(skip_all)]
pub async fn seed_from_config(db: &DatabaseConnection, config: &AppConfig) -> Result<SeedSummary> {
    let fee_schedules = config.fee_schedules()?;
    let attendance_terms = config.attendance_schedules()?;
    info!(
        students = config.students.len(),
        fee_schedules = fee_schedules.len(),
        attendance_terms = attendance_terms.len(),
        "seeding from config"
    );

    let mut summary = SeedSummary::default();

    for student in config.students.iter().map(StudentConfig::to_entity) {
        if Student::find_by_id(student.id.as_str()).one(db).await?.is_some() {
            debug!(student_id = %student.id, "student already stored, skipping");
            continue;
        }
        roster::create_student(db, &student).await?;
        summary.students += 1;
    }

    let stored = fees::get_fee_schedule_scopes(db).await?;
    for schedule in &fee_schedules {
        if stored.contains(schedule.scope()) {
            warn!(scope = %schedule.scope(), "fee schedule already exists, skipping");
            continue;
        }
        fees::save_fee_schedule(db, schedule).await?;
        summary.fee_schedules += 1;
    }

    let stored = attendance::get_attendance_scopes(db).await?;
    for term in &attendance_terms {
        if stored.contains(term.scope()) {
            warn!(scope = %term.scope(), "attendance term already exists, skipping");
            continue;
        }
        attendance::save_attendance_schedule(db, term).await?;
        summary.attendance_terms += 1;
    }

    info!(?summary, "seeding finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::settings::parse_config;
    use crate::core::schedule::ComponentKey;
    use crate::test_utils::*;

    const CONFIG: &str = r#"
        [[students]]
        id = "S-001"
        name = "Asha Rao"
        group_id = "7-A"

        [[students]]
        id = "S-002"
        name = "Bilal Khan"
        group_id = "7-A"

        [[fee_schedules]]
        group_id = "7-A"
        term_id = "2024-25"

        [[fee_schedules.components]]
        name = "admission"
        amount = 10000.0
        due = "2024-04-10"

        [[attendance_terms]]
        group_id = "7-A"
        term_id = "2024-25"
        start = "2024-07-01"
        end = "2024-07-26"
    "#;

    #[tokio::test]
    async fn test_seed_adds_everything_once() -> Result<()> {
        let db = setup_test_db().await?;
        let config = parse_config(CONFIG)?;

        let first = seed_from_config(&db, &config).await?;
        assert_eq!(
            first,
            SeedSummary {
                students: 2,
                fee_schedules: 1,
                attendance_terms: 1,
            }
        );

        let second = seed_from_config(&db, &config).await?;
        assert_eq!(second, SeedSummary::default());

        assert_eq!(roster::get_students_for_group(&db, "7-A").await?.len(), 2);
        assert_eq!(attendance::load_attendance_schedule(&db, &sample_scope()).await?.len(), 20);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_keeps_stored_edits() -> Result<()> {
        let db = setup_test_db().await?;
        let config = parse_config(CONFIG)?;
        seed_from_config(&db, &config).await?;

        let admission = ComponentKey::once("admission");
        fees::set_component_amount(&db, &sample_scope(), &admission, 12000.0).await?;
        seed_from_config(&db, &config).await?;

        let schedule = fees::load_fee_schedule(&db, &sample_scope()).await?;
        assert_eq!(schedule.total(), 12000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_padded_student_id_seeds_once() -> Result<()> {
        let db = setup_test_db().await?;
        let config = parse_config(&CONFIG.replace("\"S-001\"", "\" S-001 \""))?;

        let first = seed_from_config(&db, &config).await?;
        assert_eq!(first.students, 2);
        let second = seed_from_config(&db, &config).await?;
        assert_eq!(second.students, 0);

        let stored = roster::get_student(&db, "S-001").await?.unwrap();
        assert_eq!(stored.id, "S-001");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_config_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let config = parse_config(&CONFIG.replace("10000.0", "-10000.0"))?;

        assert!(seed_from_config(&db, &config).await.is_err());
        assert!(roster::get_students_for_group(&db, "7-A").await?.is_empty());
        Ok(())
    }
}
