use geojson::{Feature, FeatureCollection, GeoJson};
use sqlx::PgPool;

use crate::classify::{self, BIN_COUNT};
use crate::db;
use crate::error::PipelineError;
use crate::expenses;
use crate::fiscal::FinancialYear;
use crate::join;
use crate::models::{CostCategory, Incumbency, Metric, ResolvedRow};
use crate::palette::ColourTable;
use crate::resolve;

/// Everything that affects the result, passed explicitly by the caller.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub year: i32,
    pub incumbency: Incumbency,
    pub categories: Vec<CostCategory>,
    pub metric: Metric,
    pub scheme: String,
}

/// Run the full pipeline against the current store snapshot: resolve the
/// fiscal year and seats, aggregate expenses, join onto geometry, derive
/// metrics and bin. Stateless; identical inputs over an unchanged snapshot
/// produce identical rows.
pub async fn build_choropleth(
    pool: &PgPool,
    options: &MapOptions,
    ramps: &ColourTable,
) -> anyhow::Result<Vec<ResolvedRow>> {
    if options.categories.is_empty() {
        // Rejected up front: an empty selection must not reach the store as
        // an implicit "all categories".
        return Err(PipelineError::EmptyCategorySelection.into());
    }
    let fy = FinancialYear::starting(options.year)?;
    let ramp = ramps.ramp(&options.scheme, BIN_COUNT)?;

    let constituencies = db::fetch_constituencies(pool).await?;
    let periods = db::fetch_representation(pool).await?;
    let items = db::fetch_expenses(pool, &fy.token, &options.categories).await?;

    let seats = resolve::resolve_representation(&periods, &fy, options.incumbency)?;
    let totals = expenses::aggregate_totals(&items, &options.categories)?;
    let label = category_label(&options.categories);
    let mut rows = join::join_rows(&constituencies, &seats, &totals, &label);

    if rows.is_empty() || rows.iter().all(|row| row.total_amount == 0) {
        return Err(PipelineError::NoDataForSelection.into());
    }

    classify::assign_bins(&mut rows, options.metric, ramp);
    Ok(rows)
}

/// Display label for the active category filter.
pub fn category_label(categories: &[CostCategory]) -> String {
    categories
        .iter()
        .map(|category| category.as_label())
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Serialize resolved rows as a GeoJSON FeatureCollection for the renderer:
/// geometry plus every attribute needed to draw and tooltip a choropleth
/// without further computation.
pub fn to_geojson(rows: &[ResolvedRow]) -> anyhow::Result<GeoJson> {
    let mut features = Vec::with_capacity(rows.len());
    for row in rows {
        let geometry = row
            .geometry
            .as_deref()
            .map(serde_json::from_str::<geojson::Geometry>)
            .transpose()?;

        let mut feature = Feature {
            bbox: None,
            geometry,
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property("constituency_code", row.constituency_id.clone());
        feature.set_property("constituency", row.constituency_name.clone());
        feature.set_property("full_name", row.full_name.clone());
        feature.set_property("party_name", row.party_name.clone());
        feature.set_property("party_colour_code", row.party_colour_code.clone());
        feature.set_property("total_amount", row.total_amount);
        feature.set_property("per_distance", row.per_distance);
        feature.set_property("bin", row.bin.map(|bin| bin as u64));
        feature.set_property(
            "fill_colour",
            row.fill_colour
                .as_ref()
                .map(|colour| serde_json::json!(colour))
                .unwrap_or(serde_json::Value::Null),
        );
        feature.set_property("cost_category", row.cost_category_label.clone());
        features.push(feature);
    }

    Ok(GeoJson::from(
        features.into_iter().collect::<FeatureCollection>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_label_joins_selected_labels() {
        assert_eq!(
            category_label(&[CostCategory::Accommodation]),
            "Accommodation"
        );
        assert_eq!(
            category_label(&[CostCategory::Accommodation, CostCategory::Travel]),
            "Accommodation + MP Travel"
        );
    }

    #[test]
    fn rows_without_geometry_still_export() {
        let rows = vec![ResolvedRow {
            constituency_id: "E14000530".to_string(),
            constituency_name: "Aldershot".to_string(),
            geometry: None,
            distance_to_capital: 53.0,
            full_name: None,
            party_name: None,
            party_colour_code: None,
            total_amount: 0,
            per_distance: Some(0.0),
            bin: Some(0),
            fill_colour: Some(vec![253, 231, 37]),
            cost_category_label: "Accommodation".to_string(),
        }];

        let GeoJson::FeatureCollection(collection) = to_geojson(&rows).unwrap() else {
            panic!("expected a feature collection");
        };
        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert!(feature.geometry.is_none());
        assert_eq!(
            feature.property("constituency").and_then(|v| v.as_str()),
            Some("Aldershot")
        );
        assert_eq!(
            feature.property("full_name"),
            Some(&serde_json::Value::Null)
        );
        assert_eq!(
            feature.property("fill_colour"),
            Some(&serde_json::json!([253, 231, 37]))
        );
    }

    #[test]
    fn pure_stages_are_idempotent() {
        use std::collections::BTreeMap;

        use uuid::Uuid;

        use crate::classify;
        use crate::join;
        use crate::models::{Constituency, Metric, Representative};

        let constituencies = vec![
            Constituency {
                id: "E14000530".to_string(),
                name: "Aldershot".to_string(),
                geometry: None,
                distance_to_capital: 53.0,
            },
            Constituency {
                id: "E14000733".to_string(),
                name: "Manchester Central".to_string(),
                geometry: None,
                distance_to_capital: 262.0,
            },
        ];
        let rep = Representative {
            id: Uuid::parse_str("7b0c2d44-5a1e-4a9f-9a93-24c60fa27c11").unwrap(),
            full_name: "Rosa Whitfield".to_string(),
            party_name: "Labour".to_string(),
            party_colour_code: "#E4003B".to_string(),
        };
        let mut seats = BTreeMap::new();
        seats.insert("E14000530".to_string(), rep.clone());
        let mut totals = BTreeMap::new();
        totals.insert(rep.id, 14250);
        let ramp: Vec<Vec<u8>> = (0..9u8).map(|i| vec![i, i, i]).collect();

        let run = || {
            let mut rows = join::join_rows(&constituencies, &seats, &totals, "Accommodation");
            classify::assign_bins(&mut rows, Metric::Total, &ramp);
            rows
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn geometry_strings_round_trip_into_features() {
        let rows = vec![ResolvedRow {
            constituency_id: "E14000733".to_string(),
            constituency_name: "Manchester Central".to_string(),
            geometry: Some(
                r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[0.0,1.0],[1.0,1.0],[0.0,0.0]]]}"#
                    .to_string(),
            ),
            distance_to_capital: 262.0,
            full_name: Some("Priya Shankar".to_string()),
            party_name: Some("Liberal Democrat".to_string()),
            party_colour_code: Some("#FAA61A".to_string()),
            total_amount: 54375,
            per_distance: Some(207.54),
            bin: Some(8),
            fill_colour: Some(vec![68, 1, 84]),
            cost_category_label: "Accommodation + MP Travel".to_string(),
        }];

        let GeoJson::FeatureCollection(collection) = to_geojson(&rows).unwrap() else {
            panic!("expected a feature collection");
        };
        let feature = &collection.features[0];
        assert!(feature.geometry.is_some());
        assert_eq!(
            feature.property("bin").and_then(|v| v.as_u64()),
            Some(8)
        );
        assert_eq!(
            feature.property("per_distance").and_then(|v| v.as_f64()),
            Some(207.54)
        );
    }
}
