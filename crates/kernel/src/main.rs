//! pagewise command-line client
//!
//! Runs member searches against PostgreSQL and prints the result as JSON.
//!
//! Usage:
//!   pagewise search --team-name teamA
//!   pagewise page --age-goe 20 --page 1 --size 10 --sort username,desc

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pagewise_kernel::config::Config;
use pagewise_kernel::db;
use pagewise_kernel::query::{MemberSearchService, PageSpec, SearchCondition, SortKey};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// All matching members with their orders (unpaged, capped).
    Search(FilterArgs),

    /// One page of matching members.
    Page {
        #[command(flatten)]
        filters: FilterArgs,

        /// Zero-based page number.
        #[arg(long, default_value = "0")]
        page: i64,

        /// Page size.
        #[arg(long, default_value = "20")]
        size: i64,

        /// Sort key, e.g. `username,desc`. Repeatable.
        #[arg(long)]
        sort: Vec<String>,

        /// Skip loading orders.
        #[arg(long)]
        members_only: bool,
    },

    /// Check database connectivity.
    Health,
}

/// Optional member filters; omitted flags place no constraint.
#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    team_name: Option<String>,

    /// Minimum age, inclusive.
    #[arg(long)]
    age_goe: Option<i32>,

    /// Maximum age, inclusive.
    #[arg(long)]
    age_loe: Option<i32>,
}

impl From<FilterArgs> for SearchCondition {
    fn from(args: FilterArgs) -> Self {
        SearchCondition {
            username: args.username,
            team_name: args.team_name,
            age_goe: args.age_goe,
            age_loe: args.age_loe,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let store = db::connect_store(&config).await?;

    if let Command::Health = cli.command {
        let healthy = db::check_health(store.pool()).await;
        info!(healthy, "database health check");
        return print_json(&serde_json::json!({ "healthy": healthy }));
    }

    let service = MemberSearchService::new(Arc::new(store), config.search_options());
    info!(options = ?service.options(), "search service ready");

    match cli.command {
        Command::Search(filters) => {
            let members = service.search(&SearchCondition::from(filters)).await?;
            print_json(&members)
        }
        Command::Page {
            filters,
            page,
            size,
            sort,
            members_only,
        } => {
            let sort = sort
                .iter()
                .map(|raw| SortKey::parse(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let page = PageSpec::of_page(page, size, sort)?;
            let condition: SearchCondition = filters.into();

            if members_only {
                print_json(&service.search_members_page(&condition, &page).await?)
            } else {
                print_json(&service.search_page(&condition, &page).await?)
            }
        }
        Command::Health => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
