//! `zoom` command: dry run of zoom selection and padding.

use clap::Args;
use tilemosaic::config::ConfigFile;
use tilemosaic::padding::{plan, PaddingMethod};
use tilemosaic::zoom::{bounding_box_for_points, select_optimal_zoom};

use super::common::{BudgetArgs, PointArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ZoomArgs {
    #[command(flatten)]
    pub points: PointArgs,

    #[command(flatten)]
    pub budget: BudgetArgs,
}

/// Run the zoom command. Nothing is downloaded.
pub fn run(args: ZoomArgs, config: &ConfigFile) -> Result<(), CliError> {
    let points = args.points.collect()?;
    let constraints = args.budget.constraints(config)?;

    let zoom = select_optimal_zoom(&points, &constraints)?;
    let bbox = bounding_box_for_points(&points, zoom, constraints.trim_margin)?;

    println!("Zoom {}", zoom);
    println!("  Tiles:    {} ({}x{})", bbox, bbox.width(), bbox.height());
    if bbox.wraps_antimeridian() {
        println!("  Crosses the antimeridian");
    }

    match plan(&bbox, zoom) {
        Ok(pad) if pad.method == PaddingMethod::None => println!("  Padding:  none"),
        Ok(pad) => println!(
            "  Padding:  {} ({} extra tiles)",
            pad.method,
            pad.fetch_count()
        ),
        Err(e) => println!("  Padding:  unavailable ({})", e),
    }
    Ok(())
}
