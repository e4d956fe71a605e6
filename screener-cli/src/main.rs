//! Screener CLI: filter the US ticker universe, load quotes, report.
//!
//! Commands:
//! - `tickers`: list tickers matching exchange / letter / sector filters
//! - `sectors`: sector database breakdown
//! - `load`: fetch a bounded batch of filtered tickers and print the summary
//!   table, sector breakdown and failures; optional CSV / JSON export
//! - `chart`: daily candles with MA20 / MA50 for one symbol

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use screener_core::data::{SyntheticProvider, YahooProvider};
use screener_core::{
    Exchange, MarketDataFetcher, QuoteProvider, Sector, SectorTable, TickerCatalog, TickerFilter,
};
use screener_runner::{
    candle_series, export_history_csv, export_json, export_summary_csv, sector_breakdown,
    summary_rows, write_artifact, BatchLoader, BatchResult, ConsoleProgress, ProviderKind,
    ScreenerConfig,
};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "screener.toml";

#[derive(Parser)]
#[command(name = "screener", about = "US equity screener: filter the ticker universe, load quotes, report")]
struct Cli {
    /// Path to a TOML config file. Defaults to ./screener.toml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Exchanges to include (NASDAQ, NYSE). Repeat or comma-separate.
    #[arg(long = "exchange", value_delimiter = ',')]
    exchanges: Vec<Exchange>,

    /// Starting letters to include (case-insensitive).
    #[arg(long = "letter", value_delimiter = ',')]
    letters: Vec<char>,

    /// Sectors to include, e.g. "Technology", real-estate, unknown.
    #[arg(long = "sector", value_delimiter = ',')]
    sectors: Vec<Sector>,
}

impl FilterArgs {
    fn to_filter(&self) -> TickerFilter {
        TickerFilter::all()
            .with_exchanges(self.exchanges.iter().copied())
            .with_letters(self.letters.iter().copied())
            .with_sectors(self.sectors.iter().copied())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List tickers matching the filters.
    Tickers {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print at most this many rows.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show how the sector database classifies its symbols.
    Sectors,
    /// Fetch quotes for a bounded batch of filtered tickers.
    Load {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum symbols to fetch (1..=500). Overrides fetch.max_batch.
        #[arg(long)]
        max: Option<usize>,

        /// Parallel fetches (1 = sequential). Overrides fetch.concurrency.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Use the deterministic synthetic provider instead of Yahoo.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Write the summary table as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the full batch result as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print daily candles with moving averages for one symbol.
    Chart {
        symbol: String,

        /// Most recent bars to print.
        #[arg(long, default_value_t = 20)]
        rows: usize,

        /// Use the deterministic synthetic provider instead of Yahoo.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Write the full history as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tickers { filter, limit } => run_tickers(&config, &filter, limit),
        Commands::Sectors => run_sectors(&config),
        Commands::Load {
            filter,
            max,
            concurrency,
            synthetic,
            csv,
            json,
        } => {
            if let Some(max) = max {
                config.fetch.max_batch = max;
            }
            if let Some(concurrency) = concurrency {
                config.fetch.concurrency = concurrency;
            }
            if synthetic {
                config.provider.kind = ProviderKind::Synthetic;
            }
            config.validate().context("invalid command-line options")?;
            run_load(&config, &filter, csv.as_deref(), json.as_deref())
        }
        Commands::Chart {
            symbol,
            rows,
            synthetic,
            csv,
        } => {
            if synthetic {
                config.provider.kind = ProviderKind::Synthetic;
            }
            run_chart(&config, &symbol, rows, csv.as_deref())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScreenerConfig> {
    match path {
        Some(p) => ScreenerConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            log::debug!("using ./{DEFAULT_CONFIG_FILE}");
            ScreenerConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("failed to load {DEFAULT_CONFIG_FILE}"))
        }
        None => Ok(ScreenerConfig::default()),
    }
}

fn load_sectors(config: &ScreenerConfig) -> Result<SectorTable> {
    config
        .sectors
        .table()
        .context("failed to load sector database")
}

/// The universe is required for every filtering command; failure is fatal.
fn load_catalog(config: &ScreenerConfig) -> Result<TickerCatalog> {
    let sectors = load_sectors(config)?;
    TickerCatalog::load(&config.universe.source(), sectors)
        .context("cannot start: ticker universe could not be loaded")
}

fn build_fetcher(config: &ScreenerConfig) -> Result<MarketDataFetcher> {
    let provider: Arc<dyn QuoteProvider> = match config.provider.kind {
        ProviderKind::Yahoo => Arc::new(
            YahooProvider::new(&config.provider.user_agent)
                .context("failed to build HTTP client")?,
        ),
        ProviderKind::Synthetic => {
            Arc::new(SyntheticProvider::new(chrono::Utc::now().date_naive()))
        }
    };
    Ok(MarketDataFetcher::new(provider, config.fetch_settings()))
}

// ─── tickers ────────────────────────────────────────────────────────

fn run_tickers(config: &ScreenerConfig, filter: &FilterArgs, limit: usize) -> Result<()> {
    let catalog = load_catalog(config)?;
    let matches = catalog.filter(&filter.to_filter());

    println!("{:<8} {:<7} {:<24} Name", "Symbol", "Exch", "Sector");
    println!("{}", "-".repeat(80));
    for record in matches.iter().take(limit) {
        println!(
            "{:<8} {:<7} {:<24} {}",
            record.symbol,
            record.exchange,
            catalog.lookup_sector(&record.symbol),
            truncate(&record.name, 40)
        );
    }
    println!();
    if matches.len() > limit {
        println!(
            "{} of {} matching tickers shown ({} in universe)",
            limit,
            matches.len(),
            catalog.len()
        );
    } else {
        println!("{} matching tickers ({} in universe)", matches.len(), catalog.len());
    }
    Ok(())
}

// ─── sectors ────────────────────────────────────────────────────────

fn run_sectors(config: &ScreenerConfig) -> Result<()> {
    let table = load_sectors(config)?;
    let counts = table.sector_counts();

    println!("{:<24} {:>7}", "Sector", "Symbols");
    println!("{}", "-".repeat(32));
    for sector in Sector::NAMED {
        println!("{:<24} {:>7}", sector, counts.get(&sector).copied().unwrap_or(0));
    }
    if let Some(unknown) = counts.get(&Sector::Unknown) {
        println!("{:<24} {:>7}", Sector::Unknown, unknown);
    }
    println!();
    println!("{} symbols classified; all others resolve to Unknown", table.len());
    Ok(())
}

// ─── load ───────────────────────────────────────────────────────────

fn run_load(
    config: &ScreenerConfig,
    filter: &FilterArgs,
    csv: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    let catalog = load_catalog(config)?;
    let symbols = catalog.filter_symbols(&filter.to_filter());
    if symbols.is_empty() {
        println!("No tickers match the filters.");
        return Ok(());
    }

    let fetcher = build_fetcher(config)?;
    let max_batch = config.max_batch();
    println!(
        "Loading {} of {} matching symbols from {}...",
        symbols.len().min(max_batch.get()),
        symbols.len(),
        fetcher.provider_name()
    );

    let loader = BatchLoader::new(fetcher, config.load_options());
    let result = loader.load(&symbols, max_batch, &ConsoleProgress);

    print_summary_table(&result, catalog.sectors());
    print_sector_breakdown(&result, catalog.sectors());
    print_failures(&result);
    println!();
    println!("{}", result.summary_line());

    if let Some(path) = csv {
        let text = export_summary_csv(&result, catalog.sectors())?;
        write_artifact(path, &text)?;
        println!("Summary CSV written to {}", path.display());
    }
    if let Some(path) = json {
        let text = export_json(&result)?;
        write_artifact(path, &text)?;
        println!("Batch JSON written to {}", path.display());
    }
    Ok(())
}

fn print_summary_table(result: &BatchResult, sectors: &SectorTable) {
    let rows = summary_rows(result, sectors);
    if rows.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<8} {:>10} {:>14} {:>10} {:>10}  {:<22} Industry",
        "Symbol", "Price", "Volume", "MA20", "MA50", "Sector"
    );
    println!("{}", "-".repeat(100));
    for row in rows {
        println!(
            "{:<8} {:>10.2} {:>14} {:>10} {:>10}  {:<22} {}",
            row.symbol,
            row.price,
            row.volume,
            fmt_ma(row.ma20),
            fmt_ma(row.ma50),
            row.sector,
            truncate(&row.industry, 30)
        );
    }
}

fn print_sector_breakdown(result: &BatchResult, sectors: &SectorTable) {
    let slices = sector_breakdown(result, sectors);
    if slices.is_empty() {
        return;
    }
    println!();
    println!("Sector breakdown:");
    for slice in slices {
        let pct = slice.share * 100.0;
        println!(
            "  {:<22} {:>4} {:>6.1}% {}",
            slice.sector,
            slice.count,
            pct,
            "#".repeat((pct / 2.0).round() as usize)
        );
    }
}

fn print_failures(result: &BatchResult) {
    if result.failures().is_empty() {
        return;
    }
    println!();
    println!("Skipped:");
    for failure in result.failures() {
        println!("  {:<8} {:<18} {}", failure.symbol, failure.reason, failure.detail);
    }
}

// ─── chart ──────────────────────────────────────────────────────────

fn run_chart(config: &ScreenerConfig, symbol: &str, rows: usize, csv: Option<&Path>) -> Result<()> {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        bail!("symbol must not be empty");
    }

    let fetcher = build_fetcher(config)?;
    let record = match fetcher.fetch(&symbol) {
        Ok(record) => record,
        Err(e) => bail!("{symbol}: {} ({e})", e.reason()),
    };
    let sectors = load_sectors(config)?;
    let candles = candle_series(&record);

    println!(
        "{}  {} / {}  last {:.2}, volume {}",
        record.symbol,
        sectors.lookup_sector(&symbol),
        sectors.lookup_industry(&symbol),
        record.last_price,
        record.volume
    );
    println!();
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10} {:>10}",
        "Date", "Open", "High", "Low", "Close", "Volume", "MA20", "MA50"
    );
    println!("{}", "-".repeat(92));
    for c in candles.iter().skip(candles.len().saturating_sub(rows)) {
        println!(
            "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12} {:>10} {:>10}",
            c.date,
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume,
            fmt_ma(c.ma20),
            fmt_ma(c.ma50)
        );
    }

    if let Some(path) = csv {
        let text = export_history_csv(&record)?;
        write_artifact(path, &text)?;
        println!();
        println!("History CSV written to {}", path.display());
    }
    Ok(())
}

// ─── formatting ─────────────────────────────────────────────────────

fn fmt_ma(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".into())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[test]
    fn cli_parses_filters_and_overrides() {
        let cli = Cli::try_parse_from([
            "screener",
            "load",
            "--exchange",
            "nasdaq,NYSE",
            "--letter",
            "a",
            "--sector",
            "real-estate",
            "--max",
            "50",
            "--synthetic",
        ])
        .unwrap();
        match cli.command {
            Commands::Load {
                filter,
                max,
                synthetic,
                ..
            } => {
                assert_eq!(filter.exchanges, vec![Exchange::Nasdaq, Exchange::Nyse]);
                assert_eq!(filter.letters, vec!['a']);
                assert_eq!(filter.sectors, vec![Sector::RealEstate]);
                assert_eq!(max, Some(50));
                assert!(synthetic);
            }
            _ => panic!("expected load"),
        }
    }

    #[test]
    fn unknown_sector_is_rejected() {
        assert!(Cli::try_parse_from(["screener", "tickers", "--sector", "crypto"]).is_err());
    }

    #[test]
    fn empty_filter_args_are_unrestricted() {
        assert!(FilterArgs::default().to_filter().is_unrestricted());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Société Générale", 8), "Socié...");
        assert_eq!(truncate("IBM", 8), "IBM");
    }

    #[test]
    fn missing_max_batch_default_is_twenty() {
        let config = ScreenerConfig::default();
        assert_eq!(config.max_batch(), NonZeroUsize::new(20).unwrap());
    }
}
