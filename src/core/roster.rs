//! Roster entities - students (or staff) tracked by the ledger.
//!
//! Entities are imported from the school's roster and are read-only here.

use serde::{Deserialize, Serialize};

/// Contact details kept alongside a roster entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Parent or guardian name
    pub guardian: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Email address
    pub email: Option<String>,
}

/// A student on a class roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier, referenced by every ledger entry
    pub id: String,
    /// Name shown in registers and reports
    pub display_name: String,
    /// Class or section the student belongs to
    pub group_id: String,
    /// School-issued admission number
    pub admission_no: Option<String>,
    /// Roll number within the class
    pub roll_no: Option<String>,
    /// Contact details
    pub contact: Contact,
}

impl Entity {
    /// Creates an entity with no identifiers or contact details beyond its id.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            group_id: group_id.into(),
            admission_no: None,
            roll_no: None,
            contact: Contact::default(),
        }
    }

    /// Sets the admission number.
    #[must_use]
    pub fn with_admission_no(mut self, admission_no: impl Into<String>) -> Self {
        self.admission_no = Some(admission_no.into());
        self
    }

    /// Sets the roll number.
    #[must_use]
    pub fn with_roll_no(mut self, roll_no: impl Into<String>) -> Self {
        self.roll_no = Some(roll_no.into());
        self
    }
}
