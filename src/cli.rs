// src/cli.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::core::{DeliveryClient, JobStore, RelayConfig};
use crate::popup::{Activation, PopupController, PopupSettings};
use crate::relay::{trigger_scrape, watch, BackgroundService, ReadyTabs, Tab, WATCH_INTERVAL};
use crate::scraping::{HttpPage, JobPage, PageExtractor, ScrapeOrchestrator, StaticPage};

/// Link recorded for a saved HTML file when none is given.
pub const DEFAULT_FILE_LINK: &str = "https://www.linkedin.com/jobs/view/0";

#[derive(Parser)]
#[command(name = "job-relay")]
#[command(about = "Capture LinkedIn job postings and relay them to the Jobs AI service")]
pub struct Cli {
    /// Config file (defaults to job-relay.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scrape a job page and save the record
    Scrape(PageSource),
    /// Send the saved record to the first endpoint that accepts it
    Send,
    /// Popup button: send the saved record, or scrape when nothing is saved
    Activate(PageSource),
    /// Toolbar click: ask the page agent for a scrape and print its reply
    Trigger(PageSource),
    /// Show the popup state
    Show {
        #[arg(long)]
        details: bool,
    },
    /// Forget the saved record
    Clear,
    /// Run the extractor on a saved HTML file and print the record as JSON
    Extract {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_FILE_LINK)]
        link: String,
    },
}

#[derive(Args)]
pub struct PageSource {
    #[command(flatten)]
    pub origin: PageOrigin,
    /// Page address to record for --file
    #[arg(long, requires = "file", conflicts_with = "url")]
    pub link: Option<String>,
}

impl PageSource {
    /// Link recorded for a `--file` page.
    pub fn file_link(&self) -> String {
        self.link
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_LINK.to_string())
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct PageOrigin {
    /// Fetch the posting over HTTP
    #[arg(long)]
    pub url: Option<String>,
    /// Read the posting from a saved HTML file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub async fn handle_command(cli: Cli, config: RelayConfig) -> Result<()> {
    let store = JobStore::new(&config.store_path);
    let delivery = DeliveryClient::new(config.endpoints.clone(), config.timings.http_timeout())
        .context("Failed to build delivery client")?;
    let settings = PopupSettings::from_config(&config);

    match cli.command {
        Command::Show { details } => {
            let mut popup = PopupController::new(store, delivery, settings);
            popup.open().await?;
            if details {
                popup.toggle_details();
            }
            println!("{}", popup.view());
        }

        Command::Clear => {
            let mut popup = PopupController::new(store, delivery, settings);
            popup.clear(None).await?;
            println!("{}", popup.view());
        }

        Command::Send => {
            let mut popup = PopupController::new(store, delivery, settings);
            let outcome = popup.deliver_saved().await;
            println!("{}", popup.view());
            outcome?;
        }

        Command::Extract { file, link } => {
            let html = read_page(&file)?;
            let extractor = PageExtractor::new(Arc::new(config.selector_table()?))
                .with_min_container_len(config.min_container_len);
            let job = extractor.extract_html(&html, &link)?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }

        Command::Trigger(source) => {
            let (tab, _, background) = open_tab(&config, &source).await?;
            tab.inject();
            let outcome = trigger_scrape(&tab).await;
            if let Ok(response) = &outcome {
                println!("{}", serde_json::to_string_pretty(response)?);
            }
            close_tab(tab, background).await?;
            outcome?;
        }

        Command::Scrape(source) => {
            run_popup(&config, source, settings, store, delivery, false).await?;
        }

        Command::Activate(source) => {
            run_popup(&config, source, settings, store, delivery, true).await?;
        }
    }

    Ok(())
}

/// Opens `source` as a tab with its own background service.
async fn open_tab(
    config: &RelayConfig,
    source: &PageSource,
) -> Result<(Arc<Tab>, ReadyTabs, JoinHandle<BackgroundService>)> {
    let (page, timings) = match (&source.origin.url, &source.origin.file) {
        (Some(url), _) => (
            Arc::new(HttpPage::new(url.as_str(), config.timings.http_timeout())?)
                as Arc<dyn JobPage>,
            config.timings.scrape(),
        ),
        (None, Some(file)) => (
            Arc::new(StaticPage::new(source.file_link(), read_page(file)?)) as Arc<dyn JobPage>,
            config.timings.scrape().for_static_page(),
        ),
        (None, None) => anyhow::bail!("Either --url or --file is required"),
    };

    let extractor = PageExtractor::new(Arc::new(config.selector_table()?))
        .with_min_container_len(config.min_container_len);
    let orchestrator =
        ScrapeOrchestrator::new(page, extractor, timings, config.expansion_labels.clone());

    let (events, inbox) = mpsc::unbounded_channel();
    let service = BackgroundService::new();
    let ready = service.ready_tabs();
    let background = tokio::spawn(service.run(inbox));
    let tab = Arc::new(Tab::new(orchestrator, events));
    info!("Opened tab {} at {}", tab.id(), tab.url());
    Ok((tab, ready, background))
}

/// Drops the tab and waits for its background service to drain.
async fn close_tab(tab: Arc<Tab>, background: JoinHandle<BackgroundService>) -> Result<()> {
    drop(tab);
    let background = background.await.context("Background service panicked")?;
    info!("Background received {} job updates", background.updates_received());
    Ok(())
}

async fn run_popup(
    config: &RelayConfig,
    source: PageSource,
    mut settings: PopupSettings,
    store: JobStore,
    delivery: DeliveryClient,
    activate: bool,
) -> Result<()> {
    if source.origin.file.is_some() {
        settings.inject_settle = Duration::ZERO;
    }
    let (tab, ready, background) = open_tab(config, &source).await?;
    let watcher = tokio::spawn(watch(Arc::clone(&tab), ready, WATCH_INTERVAL));

    let mut popup = PopupController::new(store, delivery, settings);
    popup.open().await?;

    let outcome = if activate {
        popup.activate(&tab).await.map(|activation| match activation {
            Activation::Delivered(receipt) => info!("Delivered to {}", receipt.endpoint),
            Activation::Scraped(job) => info!("Saved job: {}", job.title),
        })
    } else {
        popup.scrape(&tab).await.map(|job| info!("Saved job: {}", job.title))
    };
    println!("{}", popup.view());

    watcher.abort();
    let _ = watcher.await;
    close_tab(tab, background).await?;

    Ok(outcome?)
}

fn read_page(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page file {}", path.display()))
}
