//! Filter and search over roster rows for display.
//!
//! Active filters combine with AND. Free-text search is a case-insensitive substring
//! match over exactly the fields in [`SearchField::ALL`]: display name, admission number
//! and roll number. Contact details are not searched.

use crate::core::aggregate::Reconciled;
use crate::core::reconcile::Row;
use crate::core::roster::Entity;

/// Entity fields covered by free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    /// [`Entity::display_name`]
    DisplayName,
    /// [`Entity::admission_no`]
    AdmissionNo,
    /// [`Entity::roll_no`]
    RollNo,
}

impl SearchField {
    /// Every searched field.
    pub const ALL: [Self; 3] = [Self::DisplayName, Self::AdmissionNo, Self::RollNo];

    /// The field's value on `entity`, if set.
    #[must_use]
    pub fn value(self, entity: &Entity) -> Option<&str> {
        match self {
            Self::DisplayName => Some(entity.display_name.as_str()),
            Self::AdmissionNo => entity.admission_no.as_deref(),
            Self::RollNo => entity.roll_no.as_deref(),
        }
    }
}

/// User-chosen constraints on the rows to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters<B> {
    /// Only rows in this bucket
    pub bucket: Option<B>,
    /// Only rows in this class
    pub group_id: Option<String>,
    /// Only rows whose searched fields contain this text
    pub text: Option<String>,
}

impl<B> Default for Filters<B> {
    fn default() -> Self {
        Self {
            bucket: None,
            group_id: None,
            text: None,
        }
    }
}

impl<B: Copy + Eq> Filters<B> {
    /// Restricts to one bucket.
    #[must_use]
    pub fn with_bucket(mut self, bucket: B) -> Self {
        self.bucket = Some(bucket);
        self
    }

    /// Restricts to one class.
    #[must_use]
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Restricts to rows matching free text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// True when no constraint is active. Blank search text doesn't count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bucket.is_none() && self.group_id.is_none() && self.needle().is_none()
    }

    fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether one row passes every active filter.
    pub fn matches<S>(&self, row: &Row<S>) -> bool
    where
        S: Reconciled<Bucket = B>,
    {
        self.matches_with(row, self.needle().as_deref())
    }

    fn matches_with<S>(&self, row: &Row<S>, needle: Option<&str>) -> bool
    where
        S: Reconciled<Bucket = B>,
    {
        if self.bucket.is_some_and(|b| row.status.bucket() != b) {
            return false;
        }
        if self
            .group_id
            .as_deref()
            .is_some_and(|g| row.entity.group_id != g)
        {
            return false;
        }
        needle.is_none_or(|needle| {
            SearchField::ALL
                .iter()
                .filter_map(|field| field.value(&row.entity))
                .any(|value| value.to_lowercase().contains(needle))
        })
    }
}

/// Returns the rows passing every active filter, in input order.
///
/// With no active filters every row is returned. The input is never modified.
pub fn project<'a, S>(rows: &'a [Row<S>], filters: &Filters<S::Bucket>) -> Vec<&'a Row<S>>
where
    S: Reconciled,
{
    let needle = filters.needle();
    rows.iter()
        .filter(|row| filters.matches_with(row, needle.as_deref()))
        .collect()
}
