use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use geo::{Centroid, HaversineDistance};
use geojson::FeatureCollection;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::fiscal::FinancialYear;
use crate::models::{Constituency, CostCategory, ExpenseItem, PeriodRow, Representative};

/// Boundary file property carrying the stable constituency identity.
const BOUNDARY_ID_PROPERTY: &str = "PCON21CD";
/// Boundary file property carrying the display name.
const BOUNDARY_NAME_PROPERTY: &str = "PCON21NM";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn fetch_constituencies(pool: &PgPool) -> anyhow::Result<Vec<Constituency>> {
    let rows = sqlx::query(
        "SELECT id, name, geometry, distance_to_capital \
         FROM gravy_train.constituencies",
    )
    .fetch_all(pool)
    .await?;

    let mut constituencies = Vec::new();
    for row in rows {
        constituencies.push(Constituency {
            id: row.get("id"),
            name: row.get("name"),
            geometry: row.get("geometry"),
            distance_to_capital: row.get("distance_to_capital"),
        });
    }

    Ok(constituencies)
}

pub async fn fetch_representation(pool: &PgPool) -> anyhow::Result<Vec<PeriodRow>> {
    let rows = sqlx::query(
        "SELECT rp.constituency_id, rp.start_date, rp.end_date, \
         r.id AS representative_id, r.full_name, r.party_name, r.party_colour_code \
         FROM gravy_train.representation_periods rp \
         JOIN gravy_train.representatives r ON r.id = rp.representative_id",
    )
    .fetch_all(pool)
    .await?;

    let mut periods = Vec::new();
    for row in rows {
        periods.push(PeriodRow {
            constituency_id: row.get("constituency_id"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            representative: Representative {
                id: row.get("representative_id"),
                full_name: row.get("full_name"),
                party_name: row.get("party_name"),
                party_colour_code: row.get("party_colour_code"),
            },
        });
    }

    Ok(periods)
}

pub async fn fetch_expenses(
    pool: &PgPool,
    financial_year: &str,
    categories: &[CostCategory],
) -> anyhow::Result<Vec<ExpenseItem>> {
    let labels: Vec<String> = categories
        .iter()
        .map(|category| category.as_label().to_string())
        .collect();

    let rows = sqlx::query(
        "SELECT representative_id, financial_year, cost_category, amount_paid \
         FROM gravy_train.expenses \
         WHERE financial_year = $1 AND cost_category = ANY($2)",
    )
    .bind(financial_year)
    .bind(&labels)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::new();
    for row in rows {
        let label: String = row.get("cost_category");
        let cost_category = CostCategory::from_label(&label)
            .ok_or_else(|| anyhow!("unknown cost category '{label}' in expense store"))?;
        items.push(ExpenseItem {
            representative_id: row.get("representative_id"),
            financial_year: row.get("financial_year"),
            cost_category,
            amount_paid: row.get("amount_paid"),
        });
    }

    Ok(items)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let constituencies = vec![
        ("E14000530", "Aldershot", 53.0),
        ("E14000621", "Cities of London and Westminster", 0.0),
        ("E14000733", "Manchester Central", 262.0),
        ("E14000836", "Portsmouth South", 101.0),
    ];

    for (id, name, distance) in constituencies {
        sqlx::query(
            r#"
            INSERT INTO gravy_train.constituencies (id, name, distance_to_capital)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, distance_to_capital = EXCLUDED.distance_to_capital
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(distance)
        .execute(pool)
        .await?;
    }

    let representatives = vec![
        (
            Uuid::parse_str("7b0c2d44-5a1e-4a9f-9a93-24c60fa27c11")?,
            "Rosa Whitfield",
            "Labour",
            "#E4003B",
        ),
        (
            Uuid::parse_str("e3d18c2a-4f06-4a34-8b9a-5de5a61b2b68")?,
            "Gerald Thorne",
            "Conservative",
            "#0087DC",
        ),
        (
            Uuid::parse_str("91d4f6cb-8a7e-45c4-a1ff-0fb2c9ce3d02")?,
            "Priya Shankar",
            "Liberal Democrat",
            "#FAA61A",
        ),
        (
            Uuid::parse_str("c87a9b3e-1d25-4f8c-9c66-7e41d0aa9f55")?,
            "Ewan MacLeish",
            "Conservative",
            "#0087DC",
        ),
    ];

    for (id, full_name, party_name, party_colour_code) in &representatives {
        sqlx::query(
            r#"
            INSERT INTO gravy_train.representatives (id, full_name, party_name, party_colour_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                party_name = EXCLUDED.party_name,
                party_colour_code = EXCLUDED.party_colour_code
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(party_name)
        .bind(party_colour_code)
        .execute(pool)
        .await?;
    }

    // Aldershot changes hands at a 2022 by-election; the other seats are
    // held continuously.
    let periods = vec![
        (
            "E14000530",
            representatives[1].0,
            NaiveDate::from_ymd_opt(2017, 6, 9).context("invalid date")?,
            Some(NaiveDate::from_ymd_opt(2022, 7, 14).context("invalid date")?),
        ),
        (
            "E14000530",
            representatives[0].0,
            NaiveDate::from_ymd_opt(2022, 7, 14).context("invalid date")?,
            None,
        ),
        (
            "E14000621",
            representatives[3].0,
            NaiveDate::from_ymd_opt(2019, 12, 13).context("invalid date")?,
            None,
        ),
        (
            "E14000733",
            representatives[2].0,
            NaiveDate::from_ymd_opt(2019, 12, 13).context("invalid date")?,
            None,
        ),
    ];

    for (constituency_id, representative_id, start_date, end_date) in periods {
        sqlx::query(
            r#"
            INSERT INTO gravy_train.representation_periods
            (id, representative_id, constituency_id, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (constituency_id, start_date) DO UPDATE
            SET representative_id = EXCLUDED.representative_id,
                end_date = EXCLUDED.end_date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(representative_id)
        .bind(constituency_id)
        .bind(start_date)
        .bind(end_date)
        .execute(pool)
        .await?;
    }

    let expenses = vec![
        ("seed-001", representatives[0].0, "22_23", "Accommodation", 14250.0),
        ("seed-002", representatives[0].0, "22_23", "MP Travel", 3120.5),
        ("seed-003", representatives[1].0, "22_23", "Accommodation", 9800.0),
        ("seed-004", representatives[1].0, "21_22", "Accommodation", 11400.0),
        ("seed-005", representatives[2].0, "22_23", "MP Travel", 6275.25),
        ("seed-006", representatives[2].0, "22_23", "Staffing", 48100.0),
        ("seed-007", representatives[3].0, "22_23", "Office Costs", 5210.0),
        ("seed-008", representatives[3].0, "21_22", "MP Travel", 1894.75),
    ];

    for (source_key, representative_id, financial_year, cost_category, amount_paid) in expenses {
        sqlx::query(
            r#"
            INSERT INTO gravy_train.expenses
            (id, representative_id, financial_year, cost_category, amount_paid, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(representative_id)
        .bind(financial_year)
        .bind(cost_category)
        .bind(amount_paid)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_expenses_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        representative_id: Uuid,
        financial_year: String,
        cost_category: CostCategory,
        amount_paid: f64,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        FinancialYear::from_token(&row.financial_year)?;
        if row.amount_paid < 0.0 {
            anyhow::bail!(
                "negative amount {} for representative {}",
                row.amount_paid,
                row.representative_id
            );
        }

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO gravy_train.expenses
            (id, representative_id, financial_year, cost_category, amount_paid, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.representative_id)
        .bind(row.financial_year)
        .bind(row.cost_category.as_label())
        .bind(row.amount_paid)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Load constituency boundaries from a GeoJSON file, keyed by the stable
/// per-feature identity property, deriving each seat's distance to the
/// capital from its centroid.
pub async fn load_boundaries(pool: &PgPool, geojson_path: &std::path::Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(geojson_path)
        .with_context(|| format!("failed to read {}", geojson_path.display()))?;
    let collection: FeatureCollection = raw
        .parse()
        .with_context(|| format!("failed to parse {}", geojson_path.display()))?;

    let london = geo::Point::new(-0.1276, 51.5072);
    let mut loaded = 0usize;

    for feature in collection.features {
        let Some(id) = feature
            .property(BOUNDARY_ID_PROPERTY)
            .and_then(|value| value.as_str())
            .map(str::to_string)
        else {
            log::warn!("skipping boundary feature without {BOUNDARY_ID_PROPERTY}");
            continue;
        };
        let name = feature
            .property(BOUNDARY_NAME_PROPERTY)
            .and_then(|value| value.as_str())
            .unwrap_or(&id)
            .to_string();
        let Some(geometry) = feature.geometry else {
            log::warn!("skipping boundary feature {id} without geometry");
            continue;
        };

        let shape = geo::Geometry::<f64>::try_from(geometry.value.clone())
            .with_context(|| format!("boundary feature {id} has unusable geometry"))?;
        let centroid = shape
            .centroid()
            .ok_or_else(|| anyhow!("boundary feature {id} has no centroid"))?;
        let distance_km = centroid.haversine_distance(&london) / 1000.0;

        sqlx::query(
            r#"
            INSERT INTO gravy_train.constituencies (id, name, geometry, distance_to_capital)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                geometry = EXCLUDED.geometry,
                distance_to_capital = EXCLUDED.distance_to_capital
            "#,
        )
        .bind(&id)
        .bind(&name)
        .bind(serde_json::to_string(&geometry)?)
        .bind(distance_km)
        .execute(pool)
        .await?;

        loaded += 1;
    }

    Ok(loaded)
}
