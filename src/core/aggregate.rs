//! Aggregator - rolls derived statuses up into per-group summaries.
//!
//! Groups are keyed by whatever the caller picks (class, month, ...). Output maps are
//! ordered by key and every summary lists all buckets in declaration order, zero counts
//! included, so the same input always yields the same summary whatever order the rows
//! came in.

use crate::core::reconcile::{
    AttendanceBand, AttendanceStatus, ComponentStatus, FeeBucket, FeeStatus, Row,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// Label used for the period of one-off fee components.
pub const ONE_OFF_PERIOD: &str = "once";

/// Expected, settled and outstanding quantities of a status or a group.
///
/// For fees these are amounts (total, paid, due). For attendance they are days
/// (class days, present, absent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// What the schedule expects
    pub expected: f64,
    /// What the ledger shows as settled
    pub settled: f64,
    /// What is still outstanding
    pub outstanding: f64,
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.expected += rhs.expected;
        self.settled += rhs.settled;
        self.outstanding += rhs.outstanding;
    }
}

/// A derived status that can be counted into a [`Summary`].
pub trait Reconciled {
    /// Status bucket counted per group
    type Bucket: Copy + Ord + fmt::Debug + 'static;

    /// Every bucket, in report order.
    fn buckets() -> &'static [Self::Bucket];

    /// This status's bucket.
    fn bucket(&self) -> Self::Bucket;

    /// This status's quantities.
    fn totals(&self) -> Totals;
}

impl Reconciled for FeeStatus {
    type Bucket = FeeBucket;

    fn buckets() -> &'static [FeeBucket] {
        &FeeBucket::ALL
    }

    fn bucket(&self) -> FeeBucket {
        self.bucket
    }

    fn totals(&self) -> Totals {
        Totals {
            expected: self.total,
            settled: self.paid,
            outstanding: self.due,
        }
    }
}

impl Reconciled for ComponentStatus {
    type Bucket = FeeBucket;

    fn buckets() -> &'static [FeeBucket] {
        &FeeBucket::ALL
    }

    fn bucket(&self) -> FeeBucket {
        self.bucket
    }

    fn totals(&self) -> Totals {
        Totals {
            expected: self.amount,
            settled: self.paid,
            outstanding: self.due,
        }
    }
}

impl Reconciled for AttendanceStatus {
    type Bucket = AttendanceBand;

    fn buckets() -> &'static [AttendanceBand] {
        &AttendanceBand::ALL
    }

    fn bucket(&self) -> AttendanceBand {
        self.band
    }

    #[allow(clippy::cast_precision_loss)]
    fn totals(&self) -> Totals {
        Totals {
            expected: self.total_days as f64,
            settled: self.present as f64,
            outstanding: self.absent as f64,
        }
    }
}

/// Roll-up of every status sharing a group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary<K, B: Ord> {
    /// The group this summary covers
    pub group_key: K,
    /// Number of statuses in the group
    pub count: usize,
    /// Summed quantities
    pub totals: Totals,
    /// Count per bucket, every bucket present
    pub bucket_counts: BTreeMap<B, usize>,
}

impl<K, B: Copy + Ord + 'static> Summary<K, B> {
    fn empty<S: Reconciled<Bucket = B>>(group_key: K) -> Self {
        Self {
            group_key,
            count: 0,
            totals: Totals::default(),
            bucket_counts: S::buckets().iter().map(|b| (*b, 0)).collect(),
        }
    }

    fn add<S: Reconciled<Bucket = B>>(&mut self, status: &S) {
        self.count += 1;
        self.totals += status.totals();
        *self.bucket_counts.entry(status.bucket()).or_insert(0) += 1;
    }

    /// Count for one bucket.
    #[must_use]
    pub fn bucket_count(&self, bucket: B) -> usize {
        self.bucket_counts.get(&bucket).copied().unwrap_or(0)
    }
}

/// Summaries keyed by group.
pub type Summaries<K, B> = BTreeMap<K, Summary<K, B>>;

/// Folds `(group key, status)` pairs into per-group summaries.
pub fn aggregate_by<'a, S, K>(
    pairs: impl IntoIterator<Item = (K, &'a S)>,
) -> Summaries<K, S::Bucket>
where
    S: Reconciled + 'a,
    K: Ord + Clone,
{
    let mut groups: Summaries<K, S::Bucket> = BTreeMap::new();
    for (key, status) in pairs {
        groups
            .entry(key.clone())
            .or_insert_with(|| Summary::empty::<S>(key))
            .add(status);
    }
    groups
}

/// Groups roster rows by `key_fn` and summarises each group.
///
/// An empty slice yields an empty map.
pub fn aggregate<S, K>(
    rows: &[Row<S>],
    mut key_fn: impl FnMut(&Row<S>) -> K,
) -> Summaries<K, S::Bucket>
where
    S: Reconciled,
    K: Ord + Clone,
{
    aggregate_by(rows.iter().map(|row| (key_fn(row), &row.status)))
}

/// Summarises fee collection per period (month), across every student's components.
///
/// One-off components are grouped under [`ONE_OFF_PERIOD`].
pub fn collection_by_period(rows: &[Row<FeeStatus>]) -> Summaries<String, FeeBucket> {
    aggregate_by(rows.iter().flat_map(|row| {
        row.status.components.iter().map(|component| {
            let period = component
                .key
                .period
                .clone()
                .unwrap_or_else(|| ONE_OFF_PERIOD.to_string());
            (period, component)
        })
    }))
}
