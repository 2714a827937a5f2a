use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Business, DatasetPaths};
use neighbors::NeighborIndex;
use pipeline::{FeaturePipeline, PipelineConfig, PipelineOutput, ThresholdPolicy};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// YelpRecs - Business similarity from Yelp reviews
#[derive(Parser)]
#[command(name = "yelp-recs")]
#[command(about = "Rating matrix and feature pipeline for Yelp business recommendations", long_about = None)]
struct Cli {
    /// Path to the Yelp dataset directory
    #[arg(short, long, default_value = "data/yelp_dataset")]
    data_dir: PathBuf,

    /// JSON pipeline configuration; unset fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Category substring to select businesses by
    #[arg(long)]
    category: Option<String>,

    /// Only reviews dated after this day count (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Minimum reviews per user and per business in the matrix
    #[arg(long)]
    threshold: Option<usize>,

    /// Repeat the activity thresholds until both axes satisfy them
    #[arg(long)]
    fixed_point: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and summarize what it produced
    Build {
        /// Pandemic features file (defaults to the one inside the data directory)
        #[arg(long)]
        covid: Option<PathBuf>,
    },

    /// Find the businesses rated most like a given one
    Similar {
        /// Business name (exact match)
        #[arg(long)]
        name: String,

        /// Number of similar businesses to show
        #[arg(long, default_value = "10")]
        k: usize,
    },

    /// Show a business's details
    Business {
        /// Business name (exact match)
        #[arg(long)]
        name: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let paths = DatasetPaths::from_dir(&cli.data_dir);

    match cli.command {
        Commands::Build { covid } => {
            let paths = match covid {
                Some(path) => paths.with_covid(Some(path)),
                None => paths,
            };
            handle_build(config, &paths)?
        }
        Commands::Similar { name, k } => handle_similar(config, &paths, &name, k)?,
        Commands::Business { name } => handle_business(&paths, &name)?,
    }

    Ok(())
}

/// Config file (or defaults) with command line overrides on top
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(category) = &cli.category {
        config.category = category.clone();
    }
    if let Some(start_date) = cli.start_date {
        config.start_date = start_date;
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if cli.fixed_point {
        config.threshold_policy = ThresholdPolicy::FixedPoint;
    }

    config.validate()?;
    Ok(config)
}

fn run_pipeline(config: PipelineConfig, paths: &DatasetPaths) -> Result<PipelineOutput> {
    println!(
        "Building features for {:?} businesses from {}...",
        config.category,
        paths.business.display()
    );
    let start = Instant::now();
    let output = FeaturePipeline::new(config)
        .run(paths)
        .context("Failed to run the feature pipeline")?;
    println!("{} Pipeline finished in {:?}", "✓".green(), start.elapsed());
    Ok(output)
}

/// Handle the 'build' command
fn handle_build(config: PipelineConfig, paths: &DatasetPaths) -> Result<()> {
    let output = run_pipeline(config, paths)?;
    let (n_businesses, n_users) = output.matrix.shape();

    println!("{}", "Rating matrix:".bold().blue());
    println!("{}Selected businesses: {}", "• ".green(), output.selection.len());
    println!("{}Shape: {} businesses x {} users", "• ".green(), n_businesses, n_users);
    println!("{}Ratings: {}", "• ".green(), output.matrix.nnz());
    println!("{}Density: {:.4}%", "• ".green(), output.matrix.density() * 100.0);

    if output.matrix.is_empty() {
        println!("{}", "No ratings survived the thresholds".yellow());
    }

    println!("{}", "Business features:".bold().blue());
    println!("{}Rows: {}", "• ".cyan(), output.business_features.len());
    println!(
        "{}Columns: {}",
        "• ".cyan(),
        output.business_features.column_names().join(", ")
    );
    if !output.business_features.has_covid_columns() {
        println!("{}No pandemic features", "• ".cyan());
    }

    println!("{}", "User features:".bold().blue());
    println!("{}Rows: {}", "• ".cyan(), output.user_features.len());
    println!(
        "{}Columns: {}",
        "• ".cyan(),
        output.user_features.column_names().join(", ")
    );

    let undefined = output.user_features.undefined_rows();
    if !undefined.is_empty() {
        println!(
            "{} {} users have undefined feature values (e.g. no friends)",
            "!".yellow(),
            undefined.len()
        );
    }
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(config: PipelineConfig, paths: &DatasetPaths, name: &str, k: usize) -> Result<()> {
    let output = run_pipeline(config, paths)?;

    let start = Instant::now();
    let index = output.fit_neighbors();
    info!("Fitted cosine index on {} businesses in {:?}", index.len(), start.elapsed());

    let similar = output.similar_by_name(&index, name, k)?;

    println!("{}", format!("Businesses similar to '{}':", name).bold().blue());
    if similar.is_empty() {
        println!("{}", "No other businesses in the rating matrix".yellow());
    }
    for (rank, business) in similar.iter().enumerate() {
        println!(
            "{}. {} ({}) - Distance: {:.4}",
            (rank + 1).to_string().green(),
            business.name,
            business.business_id,
            business.distance
        );
    }
    Ok(())
}

/// Handle the 'business' command
fn handle_business(paths: &DatasetPaths, name: &str) -> Result<()> {
    let mut found: Option<Business> = None;
    for record in paths.businesses()? {
        let record = record?;
        // Later records with the same name win
        if record.name == name {
            found = Some(Business::from(record));
        }
    }

    let business = found.ok_or_else(|| anyhow!("No business named {:?}", name))?;
    println!("{}", format!("{} ({})", business.name, business.business_id).bold().blue());
    println!("{}", business);
    Ok(())
}
