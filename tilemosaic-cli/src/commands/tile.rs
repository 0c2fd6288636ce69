//! `tile` command: show the tile containing a coordinate.

use clap::Args;
use tilemosaic::cache::TileCache;
use tilemosaic::config::ConfigFile;
use tilemosaic::coord::{point_to_tile, tile_to_lat_lon, GeoPoint, Tile};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct TileArgs {
    /// Coordinate as lon,lat
    #[arg(value_name = "LON,LAT", allow_hyphen_values = true)]
    pub point: GeoPoint,

    /// Zoom level
    #[arg(short, long)]
    pub zoom: u8,
}

/// Run the tile command.
pub fn run(args: TileArgs, config: &ConfigFile) -> Result<(), CliError> {
    let tile = point_to_tile(&args.point, args.zoom)?;
    for line in describe(&tile, args.zoom) {
        println!("{}", line);
    }
    if let Some(server) = config.tile_server() {
        println!("  URL:        {}", server.tile_url(args.zoom, tile.x, tile.y));
    }
    Ok(())
}

fn describe(tile: &Tile, zoom: u8) -> Vec<String> {
    let (north, west) = tile_to_lat_lon(tile.x, tile.y, zoom);
    let (south, east) = tile_to_lat_lon(tile.x + 1, tile.y + 1, zoom);
    vec![
        format!("Tile {}/{}/{}", zoom, tile.x, tile.y),
        format!("  Offset:     {}, {} px", tile.x_offset, tile.y_offset),
        format!("  North-west: {:.6}, {:.6}", north, west),
        format!("  South-east: {:.6}, {:.6}", south, east),
        format!("  Cache key:  {}", TileCache::key(zoom, tile.x, tile.y)),
    ]
}
