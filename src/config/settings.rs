//! Application settings loaded from config.toml
//!
//! The file holds the reconciliation settings plus the fee schedules and attendance terms
//! used to seed the database on first run. Schedules are validated through the same
//! builders as any other schedule, so a bad config fails at startup instead of producing
//! wrong statuses later.

use crate::core::reconcile::{DEFAULT_AT_RISK_BELOW, LatePolicy, ReconcileOptions};
use crate::core::roster::{Contact, Entity};
use crate::core::schedule::{
    AttendanceSchedule, ComponentKey, FeeSchedule, FeeScheduleBuilder, ScheduleScope,
};
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Config file used when `SCHOOL_LEDGER_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// How statuses are derived
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    /// Fee schedules to seed
    #[serde(default)]
    pub fee_schedules: Vec<FeeScheduleConfig>,
    /// Attendance terms to seed
    #[serde(default)]
    pub attendance_terms: Vec<AttendanceTermConfig>,
    /// Students to seed
    #[serde(default)]
    pub students: Vec<StudentConfig>,
}

/// The `[reconcile]` section
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// How late marks count toward attendance
    #[serde(default)]
    pub late_policy: LatePolicy,
    /// Attendance ratio below which a student is at risk
    #[serde(default = "default_at_risk_below")]
    pub at_risk_below: f64,
}

const fn default_at_risk_below() -> f64 {
    DEFAULT_AT_RISK_BELOW
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            late_policy: LatePolicy::default(),
            at_risk_below: DEFAULT_AT_RISK_BELOW,
        }
    }
}

impl ReconcileConfig {
    /// Reconciliation options for statuses as of `as_of`.
    pub fn options(&self, as_of: NaiveDate) -> Result<ReconcileOptions> {
        if !(0.0..=1.0).contains(&self.at_risk_below) {
            return Err(Error::Config {
                message: format!(
                    "at_risk_below must be between 0 and 1, got {}",
                    self.at_risk_below
                ),
            });
        }

        Ok(ReconcileOptions {
            as_of,
            late_policy: self.late_policy,
            at_risk_below: self.at_risk_below,
        })
    }
}

/// One `[[fee_schedules]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct FeeScheduleConfig {
    /// Class or section
    pub group_id: String,
    /// Academic term or year
    pub term_id: String,
    /// Individually listed components
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
    /// Recurring monthly components
    #[serde(default)]
    pub monthly: Vec<MonthlyConfig>,
}

/// A single fee component
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentConfig {
    /// Component name
    pub name: String,
    /// Period covered, omitted for one-off components
    pub period: Option<String>,
    /// Amount owed
    pub amount: f64,
    /// Due date (`YYYY-MM-DD`)
    pub due: NaiveDate,
}

/// A component that recurs every month, one key per month
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyConfig {
    /// Component name
    pub name: String,
    /// Amount owed each month
    pub amount: f64,
    /// Due date of the first month (`YYYY-MM-DD`)
    pub first_due: NaiveDate,
    /// Number of months
    pub months: u32,
}

impl FeeScheduleConfig {
    /// Builds and validates the schedule.
    pub fn to_schedule(&self) -> Result<FeeSchedule> {
        let scope = ScheduleScope::new(&self.group_id, &self.term_id);
        let builder = self
            .components
            .iter()
            .fold(FeeScheduleBuilder::new(scope), |builder, c| {
                let key = match &c.period {
                    Some(period) => ComponentKey::periodic(&c.name, period),
                    None => ComponentKey::once(&c.name),
                };
                builder.component(key, c.amount, c.due)
            });
        self.monthly
            .iter()
            .fold(builder, |builder, m| {
                builder.monthly(&m.name, m.amount, m.first_due, m.months)
            })
            .build()
    }
}

/// One `[[attendance_terms]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceTermConfig {
    /// Class or section
    pub group_id: String,
    /// Academic term
    pub term_id: String,
    /// First day of term
    pub start: NaiveDate,
    /// Last day of term
    pub end: NaiveDate,
    /// Weekdays with no classes
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl AttendanceTermConfig {
    /// Builds the term's class days: weekdays from start to end, minus holidays.
    pub fn to_schedule(&self) -> Result<AttendanceSchedule> {
        AttendanceSchedule::class_days(
            ScheduleScope::new(&self.group_id, &self.term_id),
            self.start,
            self.end,
            &self.holidays,
        )
    }
}

/// One `[[students]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct StudentConfig {
    /// Stable student identifier
    pub id: String,
    /// Name shown in registers and reports
    pub name: String,
    /// Class or section
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
}

impl StudentConfig {
    /// The roster entry for this student.
    #[must_use]
    pub fn to_entity(&self) -> Entity {
        Entity {
            id: self.id.trim().to_string(),
            display_name: self.name.trim().to_string(),
            group_id: self.group_id.trim().to_string(),
            admission_no: self.admission_no.clone(),
            roll_no: self.roll_no.clone(),
            contact: Contact {
                guardian: self.guardian.clone(),
                phone: self.phone.clone(),
                email: self.email.clone(),
            },
        }
    }
}

impl AppConfig {
    /// Every configured fee schedule, validated. A class and term may appear only once.
    pub fn fee_schedules(&self) -> Result<Vec<FeeSchedule>> {
        let schedules = self
            .fee_schedules
            .iter()
            .map(FeeScheduleConfig::to_schedule)
            .collect::<Result<Vec<_>>>()?;
        ensure_unique(schedules.iter().map(FeeSchedule::scope), "fee schedule")?;
        Ok(schedules)
    }

    /// Every configured attendance term, validated. A class and term may appear only once.
    pub fn attendance_schedules(&self) -> Result<Vec<AttendanceSchedule>> {
        let schedules = self
            .attendance_terms
            .iter()
            .map(AttendanceTermConfig::to_schedule)
            .collect::<Result<Vec<_>>>()?;
        ensure_unique(
            schedules.iter().map(AttendanceSchedule::scope),
            "attendance term",
        )?;
        Ok(schedules)
    }
}

fn ensure_unique<'a>(scopes: impl Iterator<Item = &'a ScheduleScope>, what: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for scope in scopes {
        if !seen.insert(scope) {
            return Err(Error::Config {
                message: format!("{what} for {scope} is configured more than once"),
            });
        }
    }
    Ok(())
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Loads configuration from `SCHOOL_LEDGER_CONFIG`, or ./config.toml when unset.
///
/// A missing file is not an error: the defaults apply and nothing is seeded.
pub fn load_default_config() -> Result<AppConfig> {
    let path =
        std::env::var("SCHOOL_LEDGER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        info!(%path, "no config file found, using defaults");
        return Ok(AppConfig::default());
    }
    info!(%path, "loading config");
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    const SAMPLE: &str = r#"
        [reconcile]
        late_policy = "present"
        at_risk_below = 0.8

        [[fee_schedules]]
        group_id = "7-A"
        term_id = "2024-25"

        [[fee_schedules.components]]
        name = "admission"
        amount = 10000.0
        due = "2024-04-10"

        [[fee_schedules.components]]
        name = "exam"
        amount = 2000.0
        due = "2025-02-15"

        [[fee_schedules.monthly]]
        name = "tuition"
        amount = 1000.0
        first_due = "2024-04-20"
        months = 12

        [[attendance_terms]]
        group_id = "7-A"
        term_id = "2024-25"
        start = "2024-07-01"
        end = "2024-07-14"
        holidays = ["2024-07-03"]

        [[students]]
        id = "S-001"
        name = "Asha Rao"
        group_id = "7-A"
        admission_no = "ADM-2024-001"
        roll_no = "R-01"
        guardian = "Meena Rao"
        phone = "+91 98450 00001"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.reconcile.late_policy, LatePolicy::Present);
        assert_eq!(config.reconcile.at_risk_below, 0.8);

        let fees = config.fee_schedules().unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].scope(), &sample_scope());
        assert_eq!(fees[0].total(), 24000.0);
        assert_eq!(fees[0].components().len(), 14);
        assert_eq!(fees[0].final_due_date(), date(2025, 3, 20));

        let terms = config.attendance_schedules().unwrap();
        assert_eq!(terms[0].len(), 9);
        assert!(!terms[0].contains(date(2024, 7, 3)));

        assert_eq!(config.students.len(), 1);
        assert_eq!(config.students[0].to_entity(), sample_roster()[0]);
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.reconcile.late_policy, LatePolicy::Separate);
        assert_eq!(config.reconcile.at_risk_below, DEFAULT_AT_RISK_BELOW);
        assert!(config.fee_schedules().unwrap().is_empty());

        let options = config.reconcile.options(date(2024, 8, 1)).unwrap();
        assert_eq!(options, ReconcileOptions::as_of(date(2024, 8, 1)));
    }

    #[test]
    fn test_unknown_late_policy_is_rejected() {
        let result = parse_config("[reconcile]\nlate_policy = \"sometimes\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = parse_config("[reconcile]\nat_risk_below = 1.5\n").unwrap();
        let result = config.reconcile.options(date(2024, 8, 1));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_schedule_is_rejected() {
        let toml_str = r#"
            [[fee_schedules]]
            group_id = "7-A"
            term_id = "2024-25"

            [[fee_schedules.components]]
            name = "admission"
            amount = -1.0
            due = "2024-04-10"
        "#;
        let config = parse_config(toml_str).unwrap();
        assert!(matches!(
            config.fee_schedules(),
            Err(Error::InvalidSchedule { .. })
        ));

        let empty = parse_config(
            "[[fee_schedules]]\ngroup_id = \"7-A\"\nterm_id = \"2024-25\"\n",
        )
        .unwrap();
        assert!(matches!(
            empty.fee_schedules(),
            Err(Error::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn test_duplicate_scope_is_rejected() {
        let term = r#"
            [[attendance_terms]]
            group_id = "7-A"
            term_id = "2024-25"
            start = "2024-07-01"
            end = "2024-07-05"
        "#;
        let config = parse_config(&format!("{term}\n{term}")).unwrap();
        assert!(matches!(
            config.attendance_schedules(),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
