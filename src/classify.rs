use crate::error::{PipelineError, Result};
use crate::models::{Metric, ResolvedRow};
use crate::palette::Colour;

/// Fixed number of choropleth bins; colour ramps must carry exactly this
/// many entries.
pub const BIN_COUNT: usize = 9;

/// Amount paid per kilometre of distance to the capital, rounded to two
/// decimal places. A zero distance (a seat coincident with the capital) is
/// a guarded case, not a numeric overflow.
pub fn derive_per_distance(total: i64, distance: f64, constituency: &str) -> Result<f64> {
    if distance == 0.0 {
        return Err(PipelineError::DivisionGuard {
            constituency: constituency.to_string(),
        });
    }
    Ok((total as f64 / distance * 100.0).round() / 100.0)
}

/// Annotate every row with its derived metric, bin index and fill colour.
///
/// Per-distance is derived for every row regardless of the active metric so
/// the renderer can tooltip both. The active metric's observed values are
/// partitioned into `BIN_COUNT` equal-width bins over `[min, max]`; bin 0 is
/// the lowest. The ramp is indexed in reverse, so the lowest bin takes the
/// last ramp entry. Rows whose active metric is undefined (zero-distance
/// guard) are excluded from the range and keep null bin and colour.
pub fn assign_bins(rows: &mut [ResolvedRow], metric: Metric, ramp: &[Colour]) {
    for row in rows.iter_mut() {
        row.per_distance =
            match derive_per_distance(row.total_amount, row.distance_to_capital, &row.constituency_id)
            {
                Ok(value) => Some(value),
                Err(guard) => {
                    log::debug!("{guard}; leaving per-distance null");
                    None
                }
            };
    }

    let observed: Vec<f64> = rows.iter().filter_map(|row| metric_value(row, metric)).collect();
    let Some(min) = observed.iter().copied().reduce(f64::min) else {
        return;
    };
    let max = observed.iter().copied().fold(min, f64::max);
    let range = max - min;

    for row in rows.iter_mut() {
        let Some(value) = metric_value(row, metric) else {
            continue;
        };
        let bin = if range == 0.0 {
            // All observed values identical: everything degenerates into the
            // bottom bin rather than dividing by a zero-width range.
            0
        } else {
            (((value - min) / range) * BIN_COUNT as f64)
                .floor()
                .min((BIN_COUNT - 1) as f64) as usize
        };
        row.bin = Some(bin);
        row.fill_colour = Some(ramp[(BIN_COUNT - 1) - bin].clone());
    }
}

fn metric_value(row: &ResolvedRow, metric: Metric) -> Option<f64> {
    match metric {
        Metric::Total => Some(row.total_amount as f64),
        Metric::PerDistance => row.per_distance,
    }
}
