//! Period schedules - what each student owes or is expected to attend over a term.
//!
//! A fee schedule is a set of named components (admission, monthly tuition, exam, ...)
//! with an amount and a due date each. An attendance schedule is the set of class days
//! in a term. Schedules are only ever built through their builders, which reject empty
//! schedules, duplicate keys and negative amounts, so the reconciliation engine never
//! has to second-guess its inputs. A fee schedule's total is always recomputed from its
//! components and can't be edited on its own.

use crate::errors::{Error, Result};
use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// The class and term a schedule applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleScope {
    /// Class or section
    pub group_id: String,
    /// Academic term or year
    pub term_id: String,
}

impl ScheduleScope {
    /// Creates a scope for a class and term.
    pub fn new(group_id: impl Into<String>, term_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            term_id: term_id.into(),
        }
    }
}

impl fmt::Display for ScheduleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.group_id, self.term_id)
    }
}

/// Identifies a fee component within a schedule: a name plus an optional period.
///
/// One-off components (admission, registration) have no period. Recurring ones carry
/// the period they cover, so "tuition" for April and "tuition" for May are distinct keys.
/// The text form is `name` or `name@period`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentKey {
    /// Component name, e.g. `admission` or `tuition`
    pub name: String,
    /// Period the component covers, e.g. `2024-04`
    pub period: Option<String>,
}

impl ComponentKey {
    /// Key for a one-off component.
    pub fn once(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            period: None,
        }
    }

    /// Key for a component recurring once per period.
    pub fn periodic(name: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            period: Some(period.into()),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.period {
            Some(period) => write!(f, "{}@{period}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for ComponentKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidKey {
            input: s.to_string(),
        };
        match s.split_once('@') {
            Some((name, period)) => {
                let (name, period) = (name.trim(), period.trim());
                if name.is_empty() || period.is_empty() {
                    return Err(invalid());
                }
                Ok(Self::periodic(name, period))
            }
            None => {
                let name = s.trim();
                if name.is_empty() {
                    return Err(invalid());
                }
                Ok(Self::once(name))
            }
        }
    }
}

/// One line of a fee schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeComponent {
    /// Unique key within the schedule
    pub key: ComponentKey,
    /// Amount owed for this component
    pub amount: f64,
    /// Date by which the component should be paid
    pub due_date: NaiveDate,
}

/// A validated fee schedule for one class and term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeSchedule {
    scope: ScheduleScope,
    components: Vec<FeeComponent>,
    total: f64,
    final_due_date: NaiveDate,
}

impl FeeSchedule {
    fn from_parts(scope: ScheduleScope, components: Vec<FeeComponent>) -> Result<Self> {
        validate_components(&components)?;
        let total = components.iter().map(|c| c.amount).sum();
        let final_due_date = components
            .iter()
            .map(|c| c.due_date)
            .max()
            .ok_or_else(|| Error::InvalidSchedule {
                reason: "a fee schedule needs at least one component".to_string(),
            })?;
        Ok(Self {
            scope,
            components,
            total,
            final_due_date,
        })
    }

    /// Class and term this schedule applies to.
    #[must_use]
    pub const fn scope(&self) -> &ScheduleScope {
        &self.scope
    }

    /// Components in the order they were added.
    #[must_use]
    pub fn components(&self) -> &[FeeComponent] {
        &self.components
    }

    /// Sum of all component amounts.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Latest due date across all components; the schedule is overdue after this date.
    #[must_use]
    pub const fn final_due_date(&self) -> NaiveDate {
        self.final_due_date
    }

    /// Looks up a component by key.
    #[must_use]
    pub fn component(&self, key: &ComponentKey) -> Option<&FeeComponent> {
        self.components.iter().find(|c| &c.key == key)
    }

    /// Whether the schedule has a component with this key.
    #[must_use]
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.component(key).is_some()
    }

    /// Replaces a component's amount and recomputes the total.
    ///
    /// Statuses derived from the old schedule are stale after this call and must be
    /// recomputed for every student on the schedule.
    pub fn set_component_amount(&mut self, key: &ComponentKey, amount: f64) -> Result<()> {
        let mut components = self.components.clone();
        let component = components
            .iter_mut()
            .find(|c| &c.key == key)
            .ok_or_else(|| Error::InvalidSchedule {
                reason: format!("no component '{key}' on this schedule"),
            })?;
        component.amount = amount;
        *self = Self::from_parts(self.scope.clone(), components)?;
        Ok(())
    }

    /// Adds a component, rejecting a key already on the schedule.
    pub fn add_component(&mut self, component: FeeComponent) -> Result<()> {
        let mut components = self.components.clone();
        components.push(component);
        *self = Self::from_parts(self.scope.clone(), components)?;
        Ok(())
    }

    /// Removes a component. The last component can't be removed.
    pub fn remove_component(&mut self, key: &ComponentKey) -> Result<FeeComponent> {
        let mut components = self.components.clone();
        let index = components
            .iter()
            .position(|c| &c.key == key)
            .ok_or_else(|| Error::InvalidSchedule {
                reason: format!("no component '{key}' on this schedule"),
            })?;
        let removed = components.remove(index);
        *self = Self::from_parts(self.scope.clone(), components)?;
        Ok(removed)
    }
}

fn validate_components(components: &[FeeComponent]) -> Result<()> {
    if components.is_empty() {
        return Err(Error::InvalidSchedule {
            reason: "a fee schedule needs at least one component".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for component in components {
        if !component.amount.is_finite() || component.amount < 0.0 {
            return Err(Error::InvalidSchedule {
                reason: format!(
                    "component '{}' has invalid amount {}",
                    component.key, component.amount
                ),
            });
        }
        if !seen.insert(&component.key) {
            return Err(Error::InvalidSchedule {
                reason: format!("component '{}' appears more than once", component.key),
            });
        }
    }

    Ok(())
}

/// Builds a [`FeeSchedule`], validating it once at the end.
#[derive(Debug, Clone)]
pub struct FeeScheduleBuilder {
    scope: ScheduleScope,
    components: Vec<FeeComponent>,
    invalid: Option<String>,
}

impl FeeScheduleBuilder {
    /// Starts an empty schedule for a class and term.
    #[must_use]
    pub const fn new(scope: ScheduleScope) -> Self {
        Self {
            scope,
            components: Vec::new(),
            invalid: None,
        }
    }

    /// Adds one component.
    #[must_use]
    pub fn component(mut self, key: ComponentKey, amount: f64, due_date: NaiveDate) -> Self {
        self.components.push(FeeComponent {
            key,
            amount,
            due_date,
        });
        self
    }

    /// Adds `count` monthly components named `name`, the first due on `first_due` and each
    /// following one a month later. Each component's period is its due month (`YYYY-MM`).
    #[must_use]
    pub fn monthly(mut self, name: &str, amount: f64, first_due: NaiveDate, count: u32) -> Self {
        for offset in 0..count {
            let Some(due_date) = first_due.checked_add_months(Months::new(offset)) else {
                self.invalid = Some(format!("monthly component '{name}' runs past the calendar"));
                return self;
            };
            let period = due_date.format("%Y-%m").to_string();
            self = self.component(ComponentKey::periodic(name, period), amount, due_date);
        }
        self
    }

    /// Validates and builds the schedule.
    pub fn build(self) -> Result<FeeSchedule> {
        if let Some(reason) = self.invalid {
            return Err(Error::InvalidSchedule { reason });
        }
        FeeSchedule::from_parts(self.scope, self.components)
    }
}

/// A validated set of class days for one class and term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceSchedule {
    scope: ScheduleScope,
    dates: BTreeSet<NaiveDate>,
}

impl AttendanceSchedule {
    /// Builds a schedule of every weekday from `start` to `end` inclusive, skipping holidays.
    pub fn class_days(
        scope: ScheduleScope,
        start: NaiveDate,
        end: NaiveDate,
        holidays: &[NaiveDate],
    ) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidSchedule {
                reason: format!("term ends ({end}) before it starts ({start})"),
            });
        }

        let holidays: HashSet<&NaiveDate> = holidays.iter().collect();
        let dates = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .filter(|d| !holidays.contains(d));

        AttendanceScheduleBuilder::new(scope).dates(dates).build()
    }

    /// Class and term this schedule applies to.
    #[must_use]
    pub const fn scope(&self) -> &ScheduleScope {
        &self.scope
    }

    /// Class days in calendar order.
    #[must_use]
    pub const fn dates(&self) -> &BTreeSet<NaiveDate> {
        &self.dates
    }

    /// Number of class days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a built schedule; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Whether `date` is a class day.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// Builds an [`AttendanceSchedule`], rejecting empty schedules and repeated dates.
#[derive(Debug, Clone)]
pub struct AttendanceScheduleBuilder {
    scope: ScheduleScope,
    dates: Vec<NaiveDate>,
}

impl AttendanceScheduleBuilder {
    /// Starts an empty schedule for a class and term.
    #[must_use]
    pub const fn new(scope: ScheduleScope) -> Self {
        Self {
            scope,
            dates: Vec::new(),
        }
    }

    /// Adds one class day.
    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.dates.push(date);
        self
    }

    /// Adds several class days.
    #[must_use]
    pub fn dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.dates.extend(dates);
        self
    }

    /// Validates and builds the schedule.
    pub fn build(self) -> Result<AttendanceSchedule> {
        if self.dates.is_empty() {
            return Err(Error::InvalidSchedule {
                reason: "an attendance schedule needs at least one class day".to_string(),
            });
        }

        let mut dates = BTreeSet::new();
        for date in self.dates {
            if !dates.insert(date) {
                return Err(Error::InvalidSchedule {
                    reason: format!("class day {date} appears more than once"),
                });
            }
        }

        Ok(AttendanceSchedule {
            scope: self.scope,
            dates,
        })
    }
}
