mod args;
mod config;
mod report;

use std::path::Path;

use anyhow::{bail, Context, Result};
use batch_logging::{batch_debug, batch_error, LogDestination};
use clap::Parser;
use log::LevelFilter;
use skimmer_engine::{
    ensure_output_dir, extract_candidates, finalize_names, DirStorageTarget, ExtractSettings,
    FetchSettings, PipelineEvent, PipelineSettings, ProgressSink, ReqwestFetcher,
    TransferPipeline,
};
use url::Url;

use crate::args::Args;
use crate::config::RunSettings;
use crate::report::ConsoleReporter;

const LOG_FILENAME: &str = "skimmer.log";

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if args.log_file {
        LogDestination::TerminalAndFile(Path::new(LOG_FILENAME))
    } else {
        LogDestination::Terminal
    };
    batch_logging::initialize(destination, level);

    if let Err(err) = run(args).await {
        batch_error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let file_config = args
        .config
        .as_deref()
        .map(config::load_file_config)
        .unwrap_or_default();
    let settings = RunSettings::resolve(&args, &file_config);

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let reporter = ConsoleReporter::new();

    // Discovery. A listing with no usable entries is a fatal precondition,
    // surfaced before the destination is touched.
    reporter.emit(PipelineEvent::ScanStarted);
    let (html, base) = load_listing(&args, &fetcher).await?;
    let extract_settings = ExtractSettings {
        filter_keyword: settings.filter_keyword.clone(),
        ..ExtractSettings::default()
    };
    let candidates = extract_candidates(&html, base.as_ref(), &extract_settings);
    reporter.emit(PipelineEvent::ScanComplete {
        candidates: candidates.len(),
    });
    if candidates.is_empty() {
        bail!("no usable file entries found in the listing; nothing to download");
    }

    let files = finalize_names(candidates);
    for file in &files {
        batch_debug!("{} <- {}", file.name, file.url);
    }

    reporter.emit(PipelineEvent::AwaitingDestination);
    ensure_output_dir(&args.output).with_context(|| {
        format!(
            "destination directory {} is not usable",
            args.output.display()
        )
    })?;
    let storage = DirStorageTarget::new(&args.output);

    let pipeline = TransferPipeline::new(
        fetcher,
        PipelineSettings {
            delay_between_files: settings.delay_between_files,
            raw_fetch_param: settings.raw_fetch_param.clone(),
        },
    );
    let result = pipeline.run(&files, &storage, &reporter).await;
    debug_assert_eq!(result.success_count + result.fail_count, files.len());

    println!("{}", reporter.view().summary());
    Ok(())
}

/// Loads the listing document plus the base URL used to resolve its links.
async fn load_listing(args: &Args, fetcher: &ReqwestFetcher) -> Result<(String, Option<Url>)> {
    if args.local {
        let html = std::fs::read_to_string(&args.listing)
            .with_context(|| format!("could not read listing file {}", args.listing))?;
        let base = args
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("invalid --base-url")?;
        Ok((html, base))
    } else {
        let base = Url::parse(&args.listing)
            .context("listing is not a valid URL (use --local for an HTML file on disk)")?;
        let html = fetcher
            .fetch_text(base.as_str())
            .await
            .with_context(|| format!("could not fetch the listing page {base}"))?;
        Ok((html, Some(base)))
    }
}
