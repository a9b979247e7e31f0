use chrono::Utc;
use dotenvy::dotenv;
use school_ledger::{
    config::{database, settings},
    core::{
        reconcile::ReconcileOptions,
        report::{
            format_attendance_row, format_attendance_summary, format_fee_row, format_summary,
        },
    },
    db::{attendance, fees, seed},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load config.toml
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let options = app_config.reconcile.options(Utc::now().date_naive())?;

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed configured students and schedules that aren't stored yet
    seed::seed_from_config(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed from config: {}", e))?;

    // 6. Report every class
    report_fees(&db, &options).await?;
    report_attendance(&db, &options).await?;

    Ok(())
}

async fn report_fees(db: &DatabaseConnection, options: &ReconcileOptions) -> Result<()> {
    for scope in fees::get_fee_schedule_scopes(db).await? {
        let view = fees::load_fee_snapshot(db, &scope).await?.view(options)?;
        info!(as_of = %view.as_of, "Fees for {}", scope);
        for summary in view.by_group.values() {
            info!("{}", format_summary(summary));
        }
        for summary in view.by_period.values() {
            debug!("{}", format_summary(summary));
        }
        for row in &view.rows {
            debug!("{}", format_fee_row(row));
        }
    }
    Ok(())
}

async fn report_attendance(db: &DatabaseConnection, options: &ReconcileOptions) -> Result<()> {
    for scope in attendance::get_attendance_scopes(db).await? {
        let view = attendance::load_attendance_snapshot(db, &scope)
            .await?
            .view(options)?;
        info!(class_days = view.class_days, "Attendance for {}", scope);
        for summary in view.by_group.values() {
            info!("{}", format_attendance_summary(summary));
        }
        for row in &view.rows {
            debug!("{}", format_attendance_row(row));
        }
    }
    Ok(())
}
