//! CLI administration tool for profile-links.
//!
//! Inspects and edits an owner's profile links directly against the
//! database, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List an owner's links
//! cargo run --bin admin -- links list u1
//!
//! # Set (create or replace) one platform link
//! cargo run --bin admin -- links set u1 github https://github.com/u1
//!
//! # Remove links by identifier
//! cargo run --bin admin -- links remove u1 65f1c0ffee0000000000000a -y
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string

use profile_links::application::services::LinkService;
use profile_links::domain::entities::Platform;
use profile_links::infrastructure::cache::NullCache;
use profile_links::infrastructure::persistence::PgLinkRepository;
use profile_links::utils::id_generator::is_link_id;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing profile-links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage an owner's links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinksAction {
    /// List the links of an owner
    List {
        /// Owner identifier
        owner: String,
    },

    /// Create or replace the link for one platform
    Set {
        /// Owner identifier
        owner: String,

        /// Platform name (e.g. github, youtube, stackOverflow)
        platform: String,

        /// Absolute http(s) URL
        url: String,
    },

    /// Remove links by identifier
    Remove {
        /// Owner identifier
        owner: String,

        /// Link identifiers to remove
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Links { action } => handle_links_action(action, &pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches link management commands.
async fn handle_links_action(action: LinksAction, pool: &PgPool) -> Result<()> {
    let repository = Arc::new(PgLinkRepository::new(Arc::new(pool.clone())));
    let service = LinkService::new(repository, Arc::new(NullCache::new()));

    match action {
        LinksAction::List { owner } => list_links(&service, &owner).await?,
        LinksAction::Set {
            owner,
            platform,
            url,
        } => set_link(&service, &owner, &platform, &url).await?,
        LinksAction::Remove { owner, ids, yes } => {
            remove_links(&service, &owner, ids, yes).await?
        }
    }

    Ok(())
}

/// Lists an owner's links in storage order.
///
/// # Output Format
///
/// ```text
/// 📋 Links of u1
///
///   ID                         Platform         Updated            URL
///   ─────────────────────────────────────────────────────────────────────
///   65f1c0ffee0000000000000a   github           2025-03-01 10:30   https://github.com/u1
/// ```
async fn list_links(service: &LinkService, owner: &str) -> Result<()> {
    println!("{} {}", "📋 Links of".bright_blue().bold(), owner.cyan().bold());
    println!();

    let links = service
        .list_links(owner)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<26} {:<16} {:<18} {}",
        "ID".bright_white().bold(),
        "Platform".bright_white().bold(),
        "Updated".bright_white().bold(),
        "URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(90).bright_black());

    for link in &links {
        println!(
            "  {:<26} {:<16} {:<18} {}",
            link.id.bright_black(),
            link.platform.as_str().cyan(),
            link.updated_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            link.url
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Creates or replaces the owner's link for one platform.
async fn set_link(service: &LinkService, owner: &str, platform: &str, url: &str) -> Result<()> {
    let platform: Platform = platform.parse().map_err(|e| {
        let names: Vec<&str> = Platform::ALL.iter().map(|p| p.as_str()).collect();
        anyhow::anyhow!("{}. Supported: {}", e, names.join(", "))
    })?;

    let record = service
        .set_link(owner, platform, url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to set link: {}", e))?;

    println!("{}", "✅ Link saved".green().bold());
    println!("  ID:       {}", record.id.bright_black());
    println!("  Platform: {}", record.platform.as_str().cyan());
    println!("  URL:      {}", record.url);
    println!();

    Ok(())
}

/// Removes links owned by `owner`, with confirmation unless `--yes`.
///
/// Identifiers owned by someone else are skipped by the store, so the
/// reported count can be lower than the number of identifiers given.
async fn remove_links(
    service: &LinkService,
    owner: &str,
    ids: Vec<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🗑️  Remove links".bright_blue().bold());
    println!();

    for id in &ids {
        if is_link_id(id) {
            println!("  {}", id.bright_black());
        } else {
            println!(
                "  {} {}",
                id.bright_black(),
                "(does not look like a link id)".yellow()
            );
        }
    }
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {} link(s) of {}?", ids.len(), owner))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = service
        .remove_links(owner, &ids)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to remove links: {}", e))?;

    println!(
        "{} {}",
        "✅ Removed:".green().bold(),
        removed.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile_links")
                .fetch_one(pool)
                .await?;

            let owners: i64 =
                sqlx::query_scalar("SELECT COUNT(DISTINCT owner_id) FROM profile_links")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Links:      {}", links.to_string().bright_green().bold());
            println!("  Owners:     {}", owners.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}
