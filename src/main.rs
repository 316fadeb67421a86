use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use hoyt_scraper::config::{
    ScrapeConfig, DEFAULT_BASE_URL, DEFAULT_ITEMS_SELECTOR, DEFAULT_LINKS_SELECTOR,
};
use hoyt_scraper::fetch::HttpFetcher;
use hoyt_scraper::output::{self, JsonLinesSink, OutputFormat, RecordSink};
use hoyt_scraper::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "hoyt_scraper", about = "Hoyt Arboretum species list scraper")]
struct Cli {
    #[command(flatten)]
    site: SiteArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SiteArgs {
    /// Root index page listing the letter pages
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// CSS selector for the letter links on the index page
    #[arg(long, global = true, default_value = DEFAULT_LINKS_SELECTOR)]
    links_selector: String,
    /// CSS selector for one species entry on a letter page
    #[arg(long, global = true, default_value = DEFAULT_ITEMS_SELECTOR)]
    items_selector: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the letter pages found on the index
    Letters,
    /// Scrape one letter page and print its records as JSON Lines
    Page {
        /// Letter page URL, absolute or relative to --base-url
        url: String,
    },
    /// Scrape every letter page and write the records out
    Scrape {
        /// Output file ("-" or omitted for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format (default: from the file extension, else csv)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Max letter pages to scrape (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Write detail URLs as absolute URLs
        #[arg(long)]
        absolute_urls: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut config = ScrapeConfig {
        base_url: cli.site.base_url,
        links_selector: cli.site.links_selector,
        items_selector: cli.site.items_selector,
        ..Default::default()
    };
    let base = config.base_url()?;

    match cli.command {
        Commands::Letters => {
            let pipeline = Pipeline::from_config(HttpFetcher::new(), &config)?;
            let pages = pipeline.letter_pages(&base).await?;
            if pages.is_empty() {
                eprintln!("No letter pages found. Check --links-selector.");
            }
            for url in pages {
                println!("{}", url);
            }
        }
        Commands::Page { url } => {
            let url = base
                .join(&url)
                .with_context(|| format!("Invalid page URL: {}", url))?;
            let pipeline = Pipeline::from_config(HttpFetcher::new(), &config)?;
            let records = pipeline.scrape_page(&url).await?;

            let stdout = io::stdout();
            let mut sink = JsonLinesSink::new(stdout.lock());
            for rec in &records {
                sink.write_record(rec)?;
            }
            sink.finish()?;
            eprintln!("{} records from {}", records.len(), url);
        }
        Commands::Scrape {
            output,
            format,
            limit,
            absolute_urls,
        } => {
            config.limit = limit;
            config.absolute_urls = absolute_urls;
            let pipeline =
                Pipeline::from_config(HttpFetcher::new(), &config)?.with_progress(output.is_some());

            let format = format
                .or_else(|| output.as_deref().and_then(OutputFormat::from_path))
                .unwrap_or(OutputFormat::Csv);
            let out = open_output(output.as_ref())?;
            let mut sink = output::open_sink(format, out);

            let stats = pipeline
                .run_into(&base, sink.as_mut())
                .await
                .with_context(|| format!("Scrape of {} aborted", base))?;
            eprintln!(
                "Done: {} records from {} letter pages ({:?}).",
                stats.records, stats.pages, format
            );
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            let file = File::create(p)
                .with_context(|| format!("Failed to create {}", p.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
