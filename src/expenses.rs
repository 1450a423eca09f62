use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::models::{CostCategory, ExpenseItem};

/// Sum paid amounts per representative over the selected categories.
///
/// Amounts are summed in full precision and rounded to whole currency units
/// once per representative, at the point of summation. Representatives with
/// no matching records are absent from the map, not present with zero.
pub fn aggregate_totals(
    items: &[ExpenseItem],
    categories: &[CostCategory],
) -> Result<BTreeMap<Uuid, i64>> {
    if categories.is_empty() {
        return Err(PipelineError::EmptyCategorySelection);
    }

    let mut sums: BTreeMap<Uuid, f64> = BTreeMap::new();
    for item in items {
        if !categories.contains(&item.cost_category) {
            continue;
        }
        *sums.entry(item.representative_id).or_insert(0.0) += item.amount_paid;
    }

    Ok(sums
        .into_iter()
        .map(|(id, total)| (id, total.round() as i64))
        .collect())
}
