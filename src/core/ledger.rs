//! Ledger entries - fee payments and attendance marks recorded by staff.
//!
//! Both kinds of entry follow the same supersede rule: for a given student and key
//! (fee component or class day), the latest entry by timestamp is authoritative and
//! earlier ones are ignored. Entries are never summed per key. A fee payment therefore
//! carries the full amount paid toward its component so far; a correction is a new
//! payment for the same component with the corrected amount.

use crate::core::schedule::ComponentKey;
use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;

/// Common shape of every ledger entry.
pub trait LedgerEntry {
    /// Key identifying what the entry is about within a schedule
    type Key: Ord + Clone;

    /// Student the entry was recorded for.
    fn entity_id(&self) -> &str;

    /// Schedule key the entry applies to.
    fn key(&self) -> Self::Key;

    /// When the entry was recorded.
    fn recorded_at(&self) -> DateTime<Utc>;
}

/// Keeps only the authoritative entry per key.
///
/// The entry with the latest `recorded_at` wins. When two entries share a timestamp,
/// the one appearing later in `entries` wins, so callers should pass entries in the
/// order the system of record stored them.
pub fn latest_by_key<'a, E>(entries: impl IntoIterator<Item = &'a E>) -> BTreeMap<E::Key, &'a E>
where
    E: LedgerEntry + 'a,
{
    let mut latest: BTreeMap<E::Key, &E> = BTreeMap::new();
    for entry in entries {
        match latest.entry(entry.key()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                if entry.recorded_at() >= slot.get().recorded_at() {
                    slot.insert(entry);
                }
            }
        }
    }
    latest
}

/// How a fee payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the school office
    Cash,
    /// Debit or credit card
    Card,
    /// Direct bank transfer
    BankTransfer,
    /// Cheque or demand draft
    Cheque,
    /// Online payment gateway
    Online,
    /// Anything else
    Other,
}

impl PaymentMethod {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::Online => "online",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cheque" => Ok(Self::Cheque),
            "online" => Ok(Self::Online),
            "other" => Ok(Self::Other),
            _ => Err(Error::InvalidValue {
                field: "payment method",
                input: s.to_string(),
            }),
        }
    }
}

/// A payment recorded against one fee component for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeePayment {
    /// Student who paid
    pub entity_id: String,
    /// Component the payment applies to
    pub component: ComponentKey,
    /// Amount paid toward the component, replacing any earlier payment for it
    pub amount: f64,
    /// When the payment was recorded
    pub recorded_at: DateTime<Utc>,
    /// How the payment was made, if known
    pub method: Option<PaymentMethod>,
    /// Free-form remarks (receipt number, ...)
    pub remarks: Option<String>,
}

impl FeePayment {
    /// Creates a payment with no method or remarks.
    pub fn new(
        entity_id: impl Into<String>,
        component: ComponentKey,
        amount: f64,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            component,
            amount,
            recorded_at,
            method: None,
            remarks: None,
        }
    }

    /// Sets the payment method.
    #[must_use]
    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Rejects negative and non-finite amounts.
    pub fn validate_amount(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::InvalidAmount {
                amount: self.amount,
            });
        }
        Ok(())
    }
}

impl LedgerEntry for FeePayment {
    type Key = ComponentKey;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn key(&self) -> ComponentKey {
        self.component.clone()
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Attendance mark for one class day.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    /// Attended
    #[default]
    Present,
    /// Did not attend
    Absent,
    /// Arrived late
    Late,
}

impl Mark {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            _ => Err(Error::InvalidValue {
                field: "attendance mark",
                input: s.to_string(),
            }),
        }
    }
}

/// A mark recorded for one student on one class day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceMark {
    /// Student the mark is for
    pub entity_id: String,
    /// Class day
    pub date: NaiveDate,
    /// The mark itself
    pub mark: Mark,
    /// When the mark was recorded
    pub recorded_at: DateTime<Utc>,
    /// Free-form remarks (reason for absence, ...)
    pub remarks: Option<String>,
}

impl AttendanceMark {
    /// Creates a mark with no remarks.
    pub fn new(
        entity_id: impl Into<String>,
        date: NaiveDate,
        mark: Mark,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            date,
            mark,
            recorded_at,
            remarks: None,
        }
    }
}

impl LedgerEntry for AttendanceMark {
    type Key = NaiveDate;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn key(&self) -> NaiveDate {
        self.date
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
