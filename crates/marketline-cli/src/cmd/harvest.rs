//! Harvest subcommand - crawl sellers and write one JSON batch each

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Color};
use tokio_util::sync::CancellationToken;

use marketline_core::{
    ApiClient, CANCELLED_EXIT_CODE, ConcurrencyLimiter, HarvestSummary, HarvestTarget, Harvester,
    JsonSink, Marketplace, ReqwestTransport, RotatingIdentity, Seller, SellerOutcome,
    SharedProgress, SourceAdapter, fmt_num,
};
use marketline_lazada::LazadaAdapter;
use marketline_shopee::ShopeeAdapter;
use marketline_tiki::TikiAdapter;

use super::styled_table;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Only harvest sellers of this marketplace
    #[arg(short, long, value_enum)]
    pub marketplace: Option<MarketplaceArg>,

    /// Seller slug to harvest instead of the configured list (repeatable)
    #[arg(short, long = "seller", requires = "marketplace")]
    pub sellers: Vec<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sellers crawled at the same time
    #[arg(long)]
    pub seller_concurrency: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum MarketplaceArg {
    Tiki,
    Shopee,
    Lazada,
}

impl From<MarketplaceArg> for Marketplace {
    fn from(m: MarketplaceArg) -> Self {
        match m {
            MarketplaceArg::Tiki => Marketplace::Tiki,
            MarketplaceArg::Shopee => Marketplace::Shopee,
            MarketplaceArg::Lazada => Marketplace::Lazada,
        }
    }
}

/// One adapter per marketplace, all sharing a transport and identity
struct Adapters {
    tiki: Arc<dyn SourceAdapter>,
    shopee: Arc<dyn SourceAdapter>,
    lazada: Arc<dyn SourceAdapter>,
}

impl Adapters {
    fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.http.transport())
            .context("Failed to build HTTP client")?;
        let identity = RotatingIdentity::new(config.identity.user_agents.clone());
        let client = ApiClient::new(Arc::new(transport), Arc::new(identity));

        Ok(Self {
            tiki: Arc::new(TikiAdapter::new(client.clone(), (&config.tiki).into())),
            shopee: Arc::new(ShopeeAdapter::new(client.clone(), (&config.shopee).into())),
            lazada: Arc::new(LazadaAdapter::new(client, (&config.lazada).into())),
        })
    }

    fn get(&self, marketplace: Marketplace) -> Arc<dyn SourceAdapter> {
        match marketplace {
            Marketplace::Tiki => self.tiki.clone(),
            Marketplace::Shopee => self.shopee.clone(),
            Marketplace::Lazada => self.lazada.clone(),
        }
    }
}

/// Sellers named on the command line win over the configured list
fn select_sellers(args: &HarvestArgs, config: &Config) -> Vec<Seller> {
    let only = args.marketplace.map(Marketplace::from);
    match only {
        Some(m) if !args.sellers.is_empty() => args
            .sellers
            .iter()
            .map(|slug| Seller::new(m, slug.clone()))
            .collect(),
        _ => config.sellers.sellers(only),
    }
}

pub fn run(args: HarvestArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let sellers = select_sellers(&args, config);
    if sellers.is_empty() {
        anyhow::bail!("No sellers to harvest; add slugs under [sellers] or pass --seller");
    }

    let output_dir = args.output.unwrap_or_else(|| config.output.dir.clone());
    let sink = JsonSink::new(&output_dir)
        .with_context(|| format!("Failed to prepare output dir {}", output_dir.display()))?;

    let adapters = Adapters::new(config)?;
    let targets: Vec<HarvestTarget> = sellers
        .into_iter()
        .map(|seller| HarvestTarget {
            adapter: adapters.get(seller.marketplace),
            seller,
        })
        .collect();

    let seller_concurrency = args
        .seller_concurrency
        .unwrap_or(config.http.seller_concurrency);
    let limiter = Arc::new(ConcurrencyLimiter::new(config.http.max_concurrency));
    let retry = config.http.retry_policy();

    log::info!("Harvesting {} sellers", targets.len());
    log::info!("  Output: {}", output_dir.display());
    log::info!(
        "  Concurrency: {} requests, {} sellers",
        limiter.capacity(),
        seller_concurrency
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let cancel = CancellationToken::new();
    let harvester = Harvester::new(limiter, retry)
        .with_seller_concurrency(seller_concurrency)
        .with_cancel(cancel.clone())
        .with_progress(progress.clone());

    // One timestamp for every batch of the run
    let batched_at = Utc::now();
    let outcomes = runtime.block_on(async {
        marketline_core::install_signal_handler(cancel.clone());
        harvester.harvest(&targets, batched_at).await
    });
    log::debug!("Peak requests in flight: {}", harvester.limiter().peak());

    let written = write_batches(&sink, &outcomes);
    let summary = HarvestSummary::from_outcomes(&outcomes);
    if progress.is_tty() {
        print_summary(progress, &outcomes, &written);
    } else {
        summary.log();
    }

    let write_failures = written.iter().filter(|w| matches!(w, Some(Err(_)))).count();
    if cancel.is_cancelled() {
        log::warn!("Harvest cancelled");
        return Ok(ExitCode::from(CANCELLED_EXIT_CODE));
    }
    if summary.sellers_failed > 0 || write_failures > 0 {
        log::error!(
            "{} sellers failed, {} batches not written",
            summary.sellers_failed,
            write_failures
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Write every completed batch; `None` for sellers that produced none
fn write_batches(sink: &JsonSink, outcomes: &[SellerOutcome]) -> Vec<Option<Result<PathBuf>>> {
    outcomes
        .iter()
        .map(|outcome| {
            let batch = outcome.result.as_ref().ok()?;
            let written = sink
                .write(batch)
                .with_context(|| format!("Failed to write batch for {}", outcome.seller));
            match &written {
                Ok(path) => log::info!("{}: wrote {}", outcome.seller, path.display()),
                Err(e) => log::error!("{e:#}"),
            }
            Some(written)
        })
        .collect()
}

fn print_summary(
    progress: &SharedProgress,
    outcomes: &[SellerOutcome],
    written: &[Option<Result<PathBuf>>],
) {
    let mut table = styled_table(&["Seller", "Records", "Failed", "Time", "Output"]);
    for (outcome, write) in outcomes.iter().zip(written) {
        let time = format!("{:.1}s", outcome.elapsed.as_secs_f64());
        let (records, failed, output) = match &outcome.result {
            Ok(batch) => {
                let output = match write {
                    Some(Ok(path)) => Cell::new(path.display()),
                    Some(Err(e)) => Cell::new(format!("{e:#}")).fg(Color::Red),
                    None => Cell::new("-"),
                };
                (
                    fmt_num(batch.ok_count()),
                    fmt_num(batch.failed_count()),
                    output,
                )
            }
            Err(e) => ("-".to_string(), "-".to_string(), Cell::new(e).fg(Color::Red)),
        };
        table.add_row(vec![
            Cell::new(&outcome.seller),
            Cell::new(records),
            Cell::new(failed),
            Cell::new(time),
            output,
        ]);
    }
    progress.println(format!("\n{table}"));
}
