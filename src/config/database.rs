//! Database configuration module for `SchoolLedger`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the database schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    AttendanceDay, AttendanceMark, FeeComponent, FeePayment, FeeSchedule, Student,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/school_ledger.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file (created if missing) when the variable is unset.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!(url = %database_url, "connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables that don't exist yet, from the entity definitions.
///
/// Safe to call on every start: existing tables and their rows are left alone.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Student).await?;
    create_table(db, &schema, FeeSchedule).await?;
    create_table(db, &schema, FeeComponent).await?;
    create_table(db, &schema, FeePayment).await?;
    create_table(db, &schema, AttendanceDay).await?;
    create_table(db, &schema, AttendanceMark).await?;

    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(db.get_database_backend().build(&table)).await?;
    debug!(table = entity.table_name(), "ensured table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        AttendanceDayModel, AttendanceMarkModel, FeeComponentModel, FeePaymentModel,
        FeeScheduleModel, StudentModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<StudentModel> = Student::find().limit(1).all(&db).await?;
        let _: Vec<FeeScheduleModel> = FeeSchedule::find().limit(1).all(&db).await?;
        let _: Vec<FeeComponentModel> = FeeComponent::find().limit(1).all(&db).await?;
        let _: Vec<FeePaymentModel> = FeePayment::find().limit(1).all(&db).await?;
        let _: Vec<AttendanceDayModel> = AttendanceDay::find().limit(1).all(&db).await?;
        let _: Vec<AttendanceMarkModel> = AttendanceMark::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_twice() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
