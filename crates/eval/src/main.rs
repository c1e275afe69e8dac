//! Scoring CLI for app reliability estimation.
//!
//! Usage:
//!     appgauge score "Binance" --category "Crypto & Web3" --developer "Binance Inc"
//!     appgauge score "Notion" --format json
//!     appgauge health

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use appgauge_cache::MemoryCache;
use appgauge_model::{
    AggregatedRating, AppQuery, DownloadBreakdown, Platform, ResolvedIdentity, ScoreCard,
};
use appgauge_ratings::{Aggregator, AggregatorConfig};
use appgauge_resolver::{resolve, ResolverConfig};
use appgauge_scoring::{estimate_downloads, growth_slope, reliability_score, PlatformSignals};
use appgauge_store::{AppStoreClient, AppStoreConfig, PlayStoreClient, PlayStoreConfig, StoreClient};

#[derive(Parser)]
#[command(name = "appgauge")]
#[command(about = "Estimate app reliability from public store signals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an app on both stores and score it
    Score {
        /// App name to look up
        name: String,

        /// Category hint
        #[arg(short, long)]
        category: Option<String>,

        /// Tagline/subtitle hint
        #[arg(short, long)]
        tagline: Option<String>,

        /// Developer/publisher hint
        #[arg(short, long)]
        developer: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check store client health
    Health,
}

/// Everything the score command learned about one app.
#[derive(Debug, Serialize)]
struct ScoreReport {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    play: Option<ResolvedIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_store: Option<ResolvedIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ratings: Option<AggregatedRating>,
    downloads: DownloadBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    growth_slope: Option<f64>,
    card: ScoreCard,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appgauge=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let play = PlayStoreClient::new(PlayStoreConfig::default());
    let app_store = AppStoreClient::new(AppStoreConfig::default());

    match cli.command {
        Commands::Score {
            name,
            category,
            tagline,
            developer,
            format,
        } => {
            run_score(&play, &app_store, name, category, tagline, developer, &format).await?;
        }
        Commands::Health => {
            run_health(&play, &app_store).await?;
        }
    }

    Ok(())
}

async fn run_score(
    play: &PlayStoreClient,
    app_store: &AppStoreClient,
    name: String,
    category: Option<String>,
    tagline: Option<String>,
    developer: Option<String>,
    format: &str,
) -> Result<()> {
    let mut query = AppQuery::new(&name);
    if let Some(category) = &category {
        query = query.with_category(category);
    }
    if let Some(tagline) = &tagline {
        query = query.with_tagline(tagline);
    }
    if let Some(developer) = &developer {
        query = query.with_developer_hint(developer);
    }

    // Search both stores concurrently; a failing store degrades to an empty
    // candidate list rather than aborting the other side.
    let (play_candidates, app_store_candidates) =
        tokio::join!(play.search(&query), app_store.search(&query));
    let play_candidates = play_candidates.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "play search failed");
        Vec::new()
    });
    let app_store_candidates = app_store_candidates.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "app store search failed");
        Vec::new()
    });

    let resolver_config = ResolverConfig::default();
    let play_identity = resolve(&query, play_candidates, Platform::Play, &resolver_config);
    let app_store_identity = resolve(
        &query,
        app_store_candidates,
        Platform::AppStore,
        &resolver_config,
    );

    let play_identity = play_identity.matched().cloned();
    let app_store_identity = app_store_identity.matched().cloned();

    if play_identity.is_none() && app_store_identity.is_none() {
        if format == "json" {
            let report = serde_json::json!({ "name": name, "outcome": "not_found" });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("No confident match for \"{}\" on either store", name);
        }
        return Ok(());
    }

    // App Store listings hide the global rating count, so it is rebuilt from
    // regional storefronts; the review feed feeds the growth signal.
    let mut ratings: Option<AggregatedRating> = None;
    let mut timestamps: Vec<String> = Vec::new();
    if let Some(identity) = &app_store_identity {
        let aggregator = Aggregator::new(
            MemoryCache::new(),
            app_store.clone(),
            AggregatorConfig::default(),
        );
        ratings = Some(aggregator.aggregate(&identity.candidate.id).await);

        timestamps = app_store
            .fetch_review_timestamps(&identity.candidate.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "review feed fetch failed");
                Vec::new()
            });
    }

    let play_signals = play_identity.as_ref().map(|identity| PlatformSignals {
        rating_count: identity.candidate.rating_count,
        install_floor: identity.candidate.install_floor,
        genre: identity.candidate.category.clone(),
    });
    let app_store_signals = app_store_identity.as_ref().map(|identity| {
        let aggregated = ratings
            .as_ref()
            .map(|r| r.total_estimated)
            .filter(|&total| total > 0);
        PlatformSignals {
            rating_count: aggregated.unwrap_or(identity.candidate.rating_count),
            install_floor: None,
            genre: identity.candidate.category.clone(),
        }
    });

    let downloads = estimate_downloads(
        play_signals.as_ref(),
        app_store_signals.as_ref(),
        category.as_deref(),
    );
    let slope = growth_slope(&timestamps);
    let card = reliability_score(downloads.total, slope);

    let report = ScoreReport {
        name,
        play: play_identity,
        app_store: app_store_identity,
        ratings,
        downloads,
        growth_slope: slope,
        card,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_report(&report);
    }

    Ok(())
}

fn print_text_report(report: &ScoreReport) {
    println!("App: {}", report.name);
    println!("---");

    for identity in [&report.play, &report.app_store].into_iter().flatten() {
        println!(
            "{}: {} ({}) by {}",
            identity.platform.as_str(),
            identity.candidate.title,
            identity.candidate.id,
            identity.candidate.developer
        );
        println!(
            "   Match: composite {:.2} (category {:.1}, description {:.2}, developer {:.1})",
            identity.score.composite,
            identity.score.category_score,
            identity.score.description_score,
            identity.score.developer_score
        );
    }

    if let Some(ratings) = &report.ratings {
        println!(
            "Ratings: ~{} across {} regions (avg {:.2})",
            ratings.total_estimated,
            ratings.regions_used.len(),
            ratings.weighted_average
        );
    }

    println!(
        "Downloads: ~{} (genre: {}, source: {:?})",
        report.downloads.total, report.downloads.genre_used, report.downloads.genre_source
    );
    for estimate in [&report.downloads.play, &report.downloads.app_store]
        .into_iter()
        .flatten()
    {
        println!(
            "   {}: ~{}",
            estimate.platform.as_str(),
            estimate.estimated_installs
        );
    }

    match report.growth_slope {
        Some(slope) => println!("Growth: {:+.4} log-reviews/week", slope),
        None => println!("Growth: no review history"),
    }

    println!("---");
    println!(
        "Score: {:.1}/10 ({:?}) | downloads subscore {:.2}{}",
        report.card.score,
        report.card.grade,
        report.card.downloads_subscore,
        report
            .card
            .growth_subscore
            .map(|g| format!(", growth subscore {:.2}", g))
            .unwrap_or_default()
    );
}

async fn run_health(play: &PlayStoreClient, app_store: &AppStoreClient) -> Result<()> {
    let mut failed = false;

    print!("Checking play client... ");
    match play.health_check().await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED: {}", e);
            failed = true;
        }
    }

    print!("Checking app_store client... ");
    match app_store.health_check().await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED: {}", e);
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
