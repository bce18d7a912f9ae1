//! Runs one climate trend analysis and prints it as JSON.

use clap::Parser;
use climate_trends::{
    AnalysisRequest, Config, Granularity, TrendAnalyzer, WeatherMetric, DEFAULT_ALPHA,
};
use log::info;
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Place to analyse, e.g. "Denver, CO".
    #[arg(short, long)]
    location: String,

    #[arg(long)]
    start_year: i32,

    #[arg(long)]
    end_year: i32,

    /// Length of the trailing smoothing window in years.
    #[arg(long, default_value_t = 5)]
    average_years: u32,

    /// Degree of the fitted polynomial.
    #[arg(short, long, default_value_t = 1)]
    degree: u32,

    /// Metric to analyse; repeat for several. All metrics when omitted.
    #[arg(short, long = "metric")]
    metrics: Vec<WeatherMetric>,

    /// `days` or `years`.
    #[arg(short, long, default_value_t = Granularity::Days)]
    granularity: Granularity,

    /// Significance threshold for the trend's F-test.
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let analyzer = TrendAnalyzer::from_config(&config)?;

    let metrics = if args.metrics.is_empty() {
        WeatherMetric::ALL.to_vec()
    } else {
        args.metrics
    };
    let request = AnalysisRequest {
        location: args.location,
        start_year: args.start_year,
        end_year: args.end_year,
        average_years: args.average_years,
        regression_degree: args.degree,
        metrics,
        granularity: args.granularity,
        alpha: args.alpha,
    };

    let analysis = analyzer.run(&request).await?;
    info!("{}", analyzer.rate_limiter().usage());
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
