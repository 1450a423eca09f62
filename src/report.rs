use std::collections::BTreeMap;
use std::fmt::Write;

use crate::fiscal::FinancialYear;
use crate::models::{Incumbency, Metric, ResolvedRow};

/// Markdown analysis of a resolved row-set: spending by party, the top
/// constituencies under the active metric, and coverage gaps.
pub fn build_report(
    fy: &FinancialYear,
    incumbency: Incumbency,
    metric: Metric,
    rows: &[ResolvedRow],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# MP Expense Analysis {}", fy.token.replace('_', "-"));
    let category = rows
        .first()
        .map(|row| row.cost_category_label.as_str())
        .unwrap_or("no categories");
    let _ = writeln!(
        output,
        "Generated for {} ({}, {} to {})",
        category, incumbency.label(), fy.start, fy.end
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Spending by party");

    let party_totals = totals_by_party(rows);
    if party_totals.is_empty() {
        let _ = writeln!(output, "No represented constituencies in this selection.");
    } else {
        for (party, (total, seats)) in &party_totals {
            let _ = writeln!(output, "- {party}: £{total} across {seats} seats");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top constituencies by {}", metric.label());

    let mut ranked: Vec<&ResolvedRow> = rows.iter().collect();
    ranked.sort_by(|a, b| {
        metric_of(b, metric)
            .partial_cmp(&metric_of(a, metric))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.constituency_id.cmp(&b.constituency_id))
    });

    if ranked.is_empty() {
        let _ = writeln!(output, "No constituencies in this selection.");
    } else {
        for row in ranked.iter().take(10) {
            let holder = row.full_name.as_deref().unwrap_or("no sitting MP");
            let value = match metric {
                Metric::Total => format!("£{}", row.total_amount),
                Metric::PerDistance => row
                    .per_distance
                    .map(|v| format!("£{v:.2}/km"))
                    .unwrap_or_else(|| "n/a (capital seat)".to_string()),
            };
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                row.constituency_name, holder, value
            );
        }
    }

    let unrepresented = rows.iter().filter(|row| row.full_name.is_none()).count();
    let zero_spend = rows
        .iter()
        .filter(|row| row.full_name.is_some() && row.total_amount == 0)
        .count();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Coverage");
    let _ = writeln!(output, "- {} constituencies", rows.len());
    let _ = writeln!(output, "- {unrepresented} with no qualifying representative");
    let _ = writeln!(output, "- {zero_spend} represented but with zero matching spend");

    output
}

fn totals_by_party(rows: &[ResolvedRow]) -> BTreeMap<String, (i64, usize)> {
    let mut totals: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for row in rows {
        if let Some(party) = &row.party_name {
            let entry = totals.entry(party.clone()).or_insert((0, 0));
            entry.0 += row.total_amount;
            entry.1 += 1;
        }
    }
    totals
}

fn metric_of(row: &ResolvedRow, metric: Metric) -> Option<f64> {
    match metric {
        Metric::Total => Some(row.total_amount as f64),
        Metric::PerDistance => row.per_distance,
    }
}
