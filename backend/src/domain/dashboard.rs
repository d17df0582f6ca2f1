//! Dashboard projections over the glucose test store.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validated/unvalidated totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_validated: u64,
    pub total_unvalidated: u64,
    pub total: u64,
}

impl DashboardSummary {
    pub fn new(total_validated: u64, total_unvalidated: u64) -> Self {
        Self {
            total_validated,
            total_unvalidated,
            total: total_validated + total_unvalidated,
        }
    }
}

/// Number of tests measured in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    /// 1 = January.
    pub month: u32,
    pub total: u64,
}

/// Expand sparse `(month, total)` pairs into twelve buckets, January first.
///
/// Months outside `1..=12` are ignored.
///
/// # Examples
/// ```
/// use glucose_backend::domain::monthly_buckets;
///
/// let buckets = monthly_buckets([(2, 5), (11, 1)]);
/// assert_eq!(buckets.len(), 12);
/// assert_eq!(buckets[1].total, 5);
/// assert_eq!(buckets[0].total, 0);
/// ```
pub fn monthly_buckets(counts: impl IntoIterator<Item = (u32, u64)>) -> Vec<MonthlyCount> {
    let mut buckets: Vec<MonthlyCount> = (1..=12)
        .map(|month| MonthlyCount { month, total: 0 })
        .collect();
    for (month, total) in counts {
        if let Some(bucket) = month
            .checked_sub(1)
            .and_then(|index| buckets.get_mut(index as usize))
        {
            bucket.total += total;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn summary_total_is_sum() {
        let summary = DashboardSummary::new(3, 4);
        assert_eq!(summary.total, 7);
        let value = serde_json::to_value(summary).expect("serialise");
        assert_eq!(value["totalValidated"], 3);
    }

    #[rstest]
    fn buckets_ignore_out_of_range_months() {
        let buckets = monthly_buckets([(0, 9), (13, 9), (12, 2), (12, 1)]);
        assert_eq!(buckets.iter().map(|b| b.total).sum::<u64>(), 3);
        assert_eq!(buckets[11].total, 3);
        assert!(buckets.iter().enumerate().all(|(i, b)| b.month as usize == i + 1));
    }
}
