use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod classify;
mod db;
mod error;
mod expenses;
mod fiscal;
mod join;
mod models;
mod palette;
mod pipeline;
mod report;
mod resolve;

use error::PipelineError;
use models::{CostCategory, Incumbency, Metric};
use palette::ColourTable;
use pipeline::MapOptions;

#[derive(Parser)]
#[command(name = "gravy-train")]
#[command(about = "MP expense choropleth pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SelectionArgs {
    /// Calendar year in which the fiscal year begins
    #[arg(long, value_parser = clap::value_parser!(i32).range(2010..=2023))]
    year: i32,
    /// Cost categories to include; repeat for more than one
    #[arg(long = "category", required = true)]
    categories: Vec<CostCategory>,
    /// Which MP to use when a seat changed hands mid-year
    #[arg(long, value_enum, default_value = "outgoing")]
    incumbency: Incumbency,
    /// Metric driving the bins
    #[arg(long, value_enum, default_value = "total")]
    metric: Metric,
    /// Colour scheme name from the colour table
    #[arg(long, default_value = "MyViridis")]
    scheme: String,
    /// Path to a ColorBrewer-style JSON colour table; built-in if omitted
    #[arg(long)]
    palette: Option<PathBuf>,
}

impl SelectionArgs {
    fn options(&self) -> MapOptions {
        MapOptions {
            year: self.year,
            incumbency: self.incumbency,
            categories: self.categories.clone(),
            metric: self.metric,
            scheme: self.scheme.clone(),
        }
    }

    fn colour_table(&self) -> anyhow::Result<ColourTable> {
        match &self.palette {
            Some(path) => ColourTable::load(path),
            None => ColourTable::builtin(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import expense records from a CSV file
    ImportExpenses {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Load constituency boundaries from a GeoJSON file
    LoadBoundaries {
        #[arg(long)]
        geojson: PathBuf,
    },
    /// Build the choropleth row-set and write it as GeoJSON
    Render {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value = "choropleth.geojson")]
        out: PathBuf,
    },
    /// Generate a markdown analysis report
    Report {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportExpenses { csv } => {
            let inserted = db::import_expenses_csv(&pool, &csv).await?;
            println!("Inserted {inserted} expense records from {}.", csv.display());
        }
        Commands::LoadBoundaries { geojson } => {
            let loaded = db::load_boundaries(&pool, &geojson).await?;
            println!("Loaded {loaded} constituency boundaries from {}.", geojson.display());
        }
        Commands::Render { selection, out } => {
            let ramps = selection.colour_table()?;
            let rows =
                match pipeline::build_choropleth(&pool, &selection.options(), &ramps).await {
                    Ok(rows) => rows,
                    Err(err) if is_no_data(&err) => {
                        println!("No expense data matched this selection; nothing written.");
                        return Ok(());
                    }
                    Err(err) => return Err(err),
                };
            std::fs::write(&out, pipeline::to_geojson(&rows)?.to_string())?;
            println!("Wrote {} constituencies to {}.", rows.len(), out.display());
        }
        Commands::Report { selection, out } => {
            let ramps = selection.colour_table()?;
            let fy = fiscal::FinancialYear::starting(selection.year)?;
            let rows =
                match pipeline::build_choropleth(&pool, &selection.options(), &ramps).await {
                    Ok(rows) => rows,
                    Err(err) if is_no_data(&err) => {
                        println!("No expense data matched this selection; nothing written.");
                        return Ok(());
                    }
                    Err(err) => return Err(err),
                };
            let report =
                report::build_report(&fy, selection.incumbency, selection.metric, &rows);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

/// `NoDataForSelection` is the one pipeline failure surfaced as a warning
/// rather than an abort.
fn is_no_data(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::NoDataForSelection)
    )
}
