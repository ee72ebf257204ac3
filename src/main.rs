use anyhow::{Context, Result};
use clap::Parser;
use listing_sync::config::Config;
use listing_sync::listing::{FilterQuery, ListingId, PriceBucket, RoomCount};
use listing_sync::remote::HttpListingService;
use listing_sync::sync::{FeedSession, FeedView};
use std::path::PathBuf;
use std::sync::Arc;

/// Get the config file path (~/.config/listing-sync/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("listing-sync")
        .join("config.toml"))
}

/// Numeric ids are sent as integers, anything else as a string.
fn parse_listing_id(raw: &str) -> Result<ListingId, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("listing id must not be empty".to_string());
    }
    Ok(raw
        .parse::<i64>()
        .map(ListingId::Int)
        .unwrap_or_else(|_| ListingId::Str(raw.to_string())))
}

fn parse_rooms(raw: &str) -> Result<RoomCount, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown room layout '{raw}' (expected 1+0, 1+1, 2+1, 3+1 or 4+1)"))
}

fn parse_bucket(raw: &str) -> Result<PriceBucket, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown price bucket '{raw}'"))
}

#[derive(Parser, Debug)]
#[command(
    name = "listing-sync",
    about = "Load a rental listing feed with deduplicated paging, filters and favorites"
)]
struct Args {
    /// Config file (default: ~/.config/listing-sync/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the API base URL from the config file
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Number of plain-feed pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Filter by location
    #[arg(long)]
    location: Option<String>,

    #[arg(long, value_name = "AMOUNT")]
    min_price: Option<u64>,

    #[arg(long, value_name = "AMOUNT")]
    max_price: Option<u64>,

    /// Quick-pick price bucket (upTo10k, from10kTo20k, ...)
    #[arg(long, value_parser = parse_bucket, conflicts_with_all = ["min_price", "max_price"])]
    price_bucket: Option<PriceBucket>,

    /// Room layout, e.g. 2+1
    #[arg(long, value_parser = parse_rooms)]
    rooms: Option<RoomCount>,

    /// Toggle favorite membership of a listing (repeatable)
    #[arg(long = "favorite", value_name = "ID", value_parser = parse_listing_id)]
    favorites: Vec<ListingId>,

    /// Print listings as JSON lines
    #[arg(long)]
    json: bool,
}

impl Args {
    fn filter(&self) -> Option<FilterQuery> {
        let mut query = FilterQuery::new();
        if let Some(location) = &self.location {
            query.set_location(location);
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            query.set_price_range(self.min_price, self.max_price);
        }
        query.set_price_bucket(self.price_bucket);
        query.rooms = self.rooms;

        (query != FilterQuery::default()).then_some(query)
    }
}

fn print_view(view: &FeedView<'_>, json: bool) -> Result<()> {
    for item in view.items {
        if json {
            println!("{}", serde_json::to_string(item)?);
        } else {
            println!("{:>10}  {}", item.id, item.title().unwrap_or("(untitled)"));
        }
    }

    let mode = if view.filter_active { "filtered" } else { "feed" };
    eprintln!(
        "{} of {} listings ({mode}{})",
        view.shown,
        view.total_count,
        if view.is_exhausted { ", end of feed" } else { "" }
    );
    if let Some(error) = view.error {
        eprintln!("last error: {error}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;
    if let Some(base_url) = &args.base_url {
        config.api_base_url = base_url.clone();
        config.validate().context("Invalid --base-url")?;
    }
    tracing::debug!(?config, "Effective configuration");

    let service = HttpListingService::from_config(&config).context("Failed to build HTTP client")?;
    let mut session = FeedSession::new(Arc::new(service), config.page_size, config.user_id.clone());

    session.mount();
    for error in session.settle().await {
        tracing::warn!(error = %error, "Initial load failed");
    }

    for _ in 1..args.pages {
        if !session.load_next_page() {
            break;
        }
        for error in session.settle().await {
            tracing::warn!(error = %error, "Page load failed");
        }
    }

    if let Some(query) = args.filter() {
        session.apply_filter(query).context("Invalid filter")?;
        for error in session.settle().await {
            tracing::warn!(error = %error, "Search failed");
        }
    }

    if !args.favorites.is_empty() {
        if config.user_id.is_empty() {
            anyhow::bail!("user_id must be set in the config file to toggle favorites");
        }
        for id in &args.favorites {
            session.toggle_favorite(id.clone());
        }
        for error in session.settle().await {
            eprintln!("{error}");
        }
        for entry in session.engine().favorites() {
            println!("favorite {} ({})", entry.target_id, entry.record_id);
        }
    }

    print_view(&session.view(), args.json)
}
