//! `build` command: assemble a mosaic (and optional zoom series).

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tilemosaic::cache::TileCache;
use tilemosaic::config::ConfigFile;
use tilemosaic::download::TileDownloader;
use tilemosaic::mosaic::MosaicAssembler;
use tilemosaic::provider::AsyncReqwestClient;
use tilemosaic::report::SharedReporter;
use tilemosaic::service::{MosaicOutcome, MosaicRequest, MosaicService};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::common::{BudgetArgs, PointArgs, ProviderArgs};
use crate::error::CliError;
use crate::progress::SpinnerReporter;

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub points: PointArgs,

    /// Output PNG path
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Fixed zoom level instead of searching for the best fit
    #[arg(short, long)]
    pub zoom: Option<u8>,

    /// Keep the mosaic as assembled instead of padding it to 2x2 tiles
    #[arg(long)]
    pub no_square: bool,

    /// Number of deeper images to build after the first, written as NAME-zN.png
    #[arg(long, default_value_t = 0, value_name = "LEVELS")]
    pub depth: u8,

    /// Hide the progress spinner
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub budget: BudgetArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Run the build command.
pub fn run(args: BuildArgs, config: &ConfigFile) -> Result<(), CliError> {
    let points = args.points.collect()?;
    let request = MosaicRequest {
        output: args.output.clone(),
        constraints: args.budget.constraints(config)?,
        zoom: args.zoom,
        square: !args.no_square,
    };

    let server = args.provider.tile_server(config)?;
    let cache = TileCache::new(args.provider.cache_dir(config));
    let client = AsyncReqwestClient::with_timeout(config.download.timeout_secs)?;

    let spinner = Arc::new(if args.quiet {
        SpinnerReporter::hidden()
    } else {
        SpinnerReporter::new()
    });
    let reporter: SharedReporter = spinner.clone();

    let downloader = TileDownloader::new(client, server, cache, &config.download_config());
    let assembler = MosaicAssembler::new(Arc::new(downloader)).with_reporter(reporter);
    let service = MosaicService::new(assembler);

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupted, stopping after the current image");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    info!(points = points.len(), output = %args.output.display(), "Building mosaic");
    let result = runtime.block_on(service.build_zoom_series(&points, &request, args.depth, &cancel));

    match result {
        Ok(outcomes) => {
            spinner.finish(format!("{} image(s) written", outcomes.len()));
            for outcome in &outcomes {
                print_outcome(outcome);
            }
            Ok(())
        }
        Err(e) => {
            spinner.abandon();
            Err(e.into())
        }
    }
}

fn print_outcome(outcome: &MosaicOutcome) {
    println!("{}", outcome.path.display());
    println!("  Zoom:     {}", outcome.zoom);
    println!("  Tiles:    {}", outcome.bounding_box);
    println!("  Padding:  {}", outcome.padding);
}
