//! CLI driver for news_harvester.
//!
//! Thin wrapper over the library surface: fetch a listing page as JSON,
//! deep-collect a single article, or run a rule-guided collection with a
//! rules file. The web layer consumes the same library calls; this binary
//! exists for operating and debugging scraping sessions from a shell.

use clap::{Parser, Subcommand};
use news_harvester::{
    ExtractionRule, MemoryRuleStore, NewsScraper, RuleEngine, SourceKind,
};
use std::error::Error;
use std::fs;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one listing page and print the records as JSON
    Fetch {
        /// Search keyword (filter term for static sources)
        keyword: String,

        /// Listing page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Which listing source to query
        #[arg(short, long, value_enum, default_value = "search")]
        source: SourceKind,
    },

    /// Deep-collect one article page with the heuristic fallback chain
    Deep {
        /// Article detail-page URL
        url: String,
    },

    /// Deep-collect one article using the persisted rule for its source
    Collect {
        /// Article detail-page URL
        url: String,

        /// Source label to resolve against stored rules
        #[arg(long)]
        source: String,

        /// JSON file holding an array of extraction rules
        #[arg(long, env = "NEWS_HARVESTER_RULES")]
        rules: Option<String>,

        /// Write auto-discovered selectors back to the loaded rule set.
        /// The rule set lives in memory for this invocation only; the
        /// rules file itself is never modified
        #[arg(long, default_value_t = false)]
        update_rule: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let scraper = NewsScraper::new()?;

    match args.command {
        Command::Fetch {
            keyword,
            page,
            source,
        } => {
            let records = scraper.fetch_news(source, &keyword, page)?;
            info!(count = records.len(), "Listing fetch finished");
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Deep { url } => {
            println!("{}", scraper.deep_collect(&url));
        }
        Command::Collect {
            url,
            source,
            rules,
            update_rule,
        } => {
            let rule_store = load_rules(rules.as_deref())?;
            let engine = RuleEngine::new(scraper.fetcher(), &rule_store);
            println!("{}", engine.collect_by_source(&url, &source, update_rule));
        }
    }

    Ok(())
}

/// Load a rules file into an in-memory store; empty store when none given.
fn load_rules(path: Option<&str>) -> Result<MemoryRuleStore, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(MemoryRuleStore::default());
    };
    let raw = fs::read_to_string(path)?;
    let rules: Vec<ExtractionRule> = serde_json::from_str(&raw)?;
    info!(count = rules.len(), path, "Loaded extraction rules");
    Ok(MemoryRuleStore::new(rules))
}
