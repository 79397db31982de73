//! bikeshare-tree - Main Entry Point
//!
//! Fits the depth-limited rental-count tree and writes its two plots.

use bikeshare_tree::config::{AnalysisConfig, DEFAULT_CONFIG_FILE};
use bikeshare_tree::pipeline::Analysis;
use bikeshare_tree::report::print_summary;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bikeshare_tree=info".into()),
        )
        .init();

    let config = AnalysisConfig::load_or_default(DEFAULT_CONFIG_FILE)?;
    let analysis = Analysis::new(config)?;
    let report = analysis.run()?;

    print_summary(&report);

    Ok(())
}
