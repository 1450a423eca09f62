use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::{Constituency, Representative, ResolvedRow};

/// Left join from constituency reference data onto the resolved seats and
/// aggregated totals. Every constituency appears exactly once, in id order,
/// whether or not either lookup matched.
///
/// Joins go through identity keys only (constituency id, representative id);
/// names are display attributes. A missing seat leaves the representative
/// fields null; a missing total becomes zero, which is a meaningful value
/// for binning, distinct from "no data".
pub fn join_rows(
    constituencies: &[Constituency],
    seats: &BTreeMap<String, Representative>,
    totals: &BTreeMap<Uuid, i64>,
    category_label: &str,
) -> Vec<ResolvedRow> {
    let mut rows: Vec<ResolvedRow> = constituencies
        .iter()
        .map(|constituency| {
            let seat = seats.get(&constituency.id);
            let total_amount = seat
                .and_then(|rep| totals.get(&rep.id))
                .copied()
                .unwrap_or(0);
            ResolvedRow {
                constituency_id: constituency.id.clone(),
                constituency_name: constituency.name.clone(),
                geometry: constituency.geometry.clone(),
                distance_to_capital: constituency.distance_to_capital,
                full_name: seat.map(|rep| rep.full_name.clone()),
                party_name: seat.map(|rep| rep.party_name.clone()),
                party_colour_code: seat.map(|rep| rep.party_colour_code.clone()),
                total_amount,
                per_distance: None,
                bin: None,
                fill_colour: None,
                cost_category_label: category_label.to_string(),
            }
        })
        .collect();

    rows.sort_by(|a, b| a.constituency_id.cmp(&b.constituency_id));
    rows
}
