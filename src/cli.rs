use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "variants")]
#[command(version = "0.1.0")]
#[command(about = "Simulate A/B test bucketing across page views")]
pub struct Args {
    /// Test slug to register and serve
    #[arg(default_value = "homepage-hero")]
    pub slug: String,

    /// Number of simulated page views
    #[arg(long, default_value = "100")]
    pub views: u32,

    /// Traffic percentage gate for the bucketing draw (0-100)
    #[arg(long, default_value = "50")]
    pub traffic: u8,

    /// Reuse one visitor's persisted assignment across all views instead of
    /// simulating independent visitors
    #[arg(long)]
    pub returning: bool,

    /// Persist assignments to this JSON file (implies --returning)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Seed the draw source for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulate a page load with no active test and run the cleanup guard
    #[arg(long)]
    pub no_active: bool,
}
