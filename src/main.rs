//! anvil2dem: generate a DEM from .mca files.
//!
//! Reads one or more region files named `r.<X>.<Z>.mca` and writes a single
//! GeoTIFF whose pixels are the heights of the topmost ground blocks.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser};

use anvil2dem::{CompressionScheme, GroundClassifier, WorldOptions};

#[derive(Parser)]
#[command(
    name = "anvil2dem",
    version,
    about = "Generate a DEM from Minecraft Anvil region files (.mca)",
    disable_version_flag = true
)]
pub struct Args {
    /// Region files, named r.<X>.<Z>.mca
    #[arg(value_name = "REGION_FILE")]
    pub files: Vec<PathBuf>,

    /// TIFF compression scheme (case-insensitive): NONE, LZW, PACKBITS, DEFLATE or ADOBE_DEFLATE
    #[arg(long, value_name = "SCHEME", default_value = "DEFLATE", value_parser = parse_compression)]
    pub compression: CompressionScheme,

    /// List of blocks that should be taken into account
    #[arg(long, value_name = "FILE", conflicts_with = "ignoredblocks")]
    pub blocks: Option<PathBuf>,

    /// List of blocks that should NOT be taken into account
    #[arg(long, value_name = "FILE")]
    pub ignoredblocks: Option<PathBuf>,

    /// Output GeoTIFF path
    #[arg(short, long, default_value = "out.tif")]
    pub output: PathBuf,

    /// Worker threads for region parsing (0 = one per CPU)
    #[arg(short, long, env = "ANVIL2DEM_JOBS", default_value_t = 1)]
    pub jobs: usize,
}

fn parse_compression(name: &str) -> Result<CompressionScheme, String> {
    CompressionScheme::parse_supported(name).map_err(|e| e.to_string())
}

/// Command with the version flag on `-v` instead of clap's `-V`.
fn cli() -> clap::Command {
    Args::command().arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .help("Print version")
            .action(ArgAction::Version),
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut command = cli();
    if std::env::args_os().len() <= 1 {
        command.print_help()?;
        return Ok(());
    }

    let matches = command.get_matches();
    let args = Args::from_arg_matches(&matches)?;

    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    let ground = match (&args.blocks, &args.ignoredblocks) {
        (Some(path), _) => GroundClassifier::allow_list_file(path)?,
        (None, Some(path)) => GroundClassifier::deny_list_file(path)?,
        (None, None) => GroundClassifier::default(),
    };
    log::debug!("{} block ids count as ground", ground.ground_count());

    if args.files.is_empty() {
        log::info!("No region files given, nothing to do");
        return Ok(());
    }

    let jobs = match args.jobs {
        0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
        n => n,
    };

    let world = anvil2dem::parse_world(&args.files, &ground, WorldOptions { jobs })
        .context("Failed to parse region files")?;

    anvil2dem::write_raster(&args.output, &world.canvas, &world.bounds, args.compression)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {}x{} DEM to {}",
        world.bounds.width(),
        world.bounds.height(),
        args.output.display()
    );

    Ok(())
}
