//! Cache management CLI commands.

use clap::Subcommand;
use tilemosaic::cache::{clear_disk_cache, disk_cache_stats, DownloadCounter};
use tilemosaic::config::{format_size, ConfigFile};

use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Clear the disk cache, removing all cached tiles
    Clear,
    /// Show disk cache statistics and today's download count
    Stats,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config: &ConfigFile) -> Result<(), CliError> {
    let cache_dir = &config.cache.directory;

    match action {
        CacheAction::Clear => {
            println!("Clearing disk cache at: {}", cache_dir.display());

            match clear_disk_cache(cache_dir) {
                Ok(result) => {
                    println!(
                        "Deleted {} files, freed {}",
                        result.files_deleted,
                        format_size(result.bytes_freed)
                    );
                    Ok(())
                }
                Err(e) => Err(CliError::CacheClear(e.to_string())),
            }
        }
        CacheAction::Stats => {
            println!("Disk cache: {}", cache_dir.display());

            let (files, bytes) =
                disk_cache_stats(cache_dir).map_err(|e| CliError::CacheStats(e.to_string()))?;
            println!("  Files: {}", files);
            println!("  Size:  {}", format_size(bytes));

            let counter = DownloadCounter::new(cache_dir);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(CliError::Runtime)?;
            let today = runtime
                .block_on(counter.today())
                .map_err(|e| CliError::CacheStats(e.to_string()))?;
            println!("  Downloaded today: {}", today);
            if config.download.daily_limit > 0 {
                println!("  Daily limit:      {}", config.download.daily_limit);
            }
            Ok(())
        }
    }
}
