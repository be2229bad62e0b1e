//! matchcheck - one-shot matching inspection tool
//!
//! Scores the configured roster against a single incident given on the
//! command line and prints the ranked table plus the decision line the
//! service would emit. Useful for checking a roster config before
//! deploying it.
//!
//! Usage: matchcheck 40.730 -74.010 10 [--config config/dev.toml] [--json]

use anyhow::Context;
use clap::Parser;
use crisis_dispatch::domain::geo::GeoPoint;
use crisis_dispatch::domain::types::{Incident, Severity};
use crisis_dispatch::infra::Config;
use crisis_dispatch::io::{StaticRoster, NO_MATCH_LINE};
use crisis_dispatch::services::{policy_by_name, Matcher};

/// Score the configured roster against one incident
#[derive(Parser, Debug)]
#[command(name = "matchcheck", version, about)]
struct Args {
    /// Incident latitude in decimal degrees
    #[arg(allow_hyphen_values = true)]
    latitude: f64,

    /// Incident longitude in decimal degrees
    #[arg(allow_hyphen_values = true)]
    longitude: f64,

    /// Incident severity (1-10)
    severity: i64,

    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Print the ranked table as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load_from_path(&args.config);
    let roster = StaticRoster::from_config(&config).context("Invalid roster configuration")?;
    let policy = policy_by_name(config.matching_policy())
        .with_context(|| format!("Unknown scoring policy {:?}", config.matching_policy()))?;
    let matcher = Matcher::with_policy(policy);

    let incident = Incident {
        position: GeoPoint::new(args.latitude, args.longitude).context("Invalid position")?,
        severity: Severity::try_from(args.severity).context("Invalid severity")?,
    };

    let ranked = matcher.rank(&incident, roster.units());

    if args.json {
        println!("{}", serde_json::to_string_pretty(ranked.as_slice())?);
        return Ok(());
    }

    if ranked.is_empty() {
        println!("(empty roster)");
    }
    for (i, m) in ranked.iter().enumerate() {
        println!(
            "{:>2}. {:<16} {:>12.3} km  score {:>12.3}",
            i + 1,
            m.unit_id,
            m.distance_km,
            m.score
        );
    }

    match ranked.first() {
        Some(m) => println!("decision: {}", m.unit_id),
        None => println!("decision: {}", NO_MATCH_LINE),
    }

    Ok(())
}
