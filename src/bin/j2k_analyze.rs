//! j2k-analyze CLI - inspect the JPEG 2000 analysis stage.
//!
//! Prints subband trees and code-block partitions, and runs the component
//! transform, wavelet decomposition and ROI masking over raw images.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use j2k_analysis::jpeg2000::analysis::ForwardAnalysis;
use j2k_analysis::jpeg2000::config::{CodeBlockSize, EncoderConfig, EncoderOptions, PartitionOrigin, PrecinctSizes};
use j2k_analysis::jpeg2000::dwt::WaveletFilter;
use j2k_analysis::jpeg2000::image::Rect;
use j2k_analysis::jpeg2000::roi::Roi;
use j2k_analysis::jpeg2000::subband::SubbandTree;
use j2k_analysis::jpeg2000::tiler::{ImageSource, RasterImage, Tiler};

/// JPEG 2000 analysis inspector
#[derive(Parser)]
#[command(name = "j2k-analyze")]
#[command(version)]
#[command(about = "Inspect subband trees, code-block partitions and ROI masks", long_about = None)]
#[command(after_help = "EXAMPLES:
    j2k-analyze tree --width 256 --height 256 --levels 2
    j2k-analyze tree --width 100 --height 61 --ulx 3 --uly 1 --cblk 32x32 --precincts 64x64,32x32
    j2k-analyze analyze -i pixels.raw -w 512 -H 512 -n 3 --lossless --roi 'R 0 100 100 64 64'

Option strings accept tile and component selectors, e.g. --levels '5 t0,2 3 c1 4'.
Set RUST_LOG=debug to follow the per-tile decisions.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the subband tree and code-block grid of a tile-component
    #[command(visible_alias = "t")]
    Tree {
        /// Tile-component width
        #[arg(long)]
        width: u32,

        /// Tile-component height
        #[arg(long)]
        height: u32,

        /// Horizontal position on the reference grid
        #[arg(long, default_value = "0")]
        ulx: u32,

        /// Vertical position on the reference grid
        #[arg(long, default_value = "0")]
        uly: u32,

        /// Decomposition levels
        #[arg(short, long, default_value = "5")]
        levels: u32,

        /// Nominal code-block size, WxH
        #[arg(long, default_value = "64x64")]
        cblk: CodeBlockSize,

        /// Precinct sizes, highest resolution level first
        #[arg(long)]
        precincts: Option<PrecinctSizes>,

        /// Code-block partition origin, X,Y with each coordinate 0 or 1
        #[arg(long, default_value = "0,0", value_parser = parse_origin)]
        origin: PartitionOrigin,

        /// Wavelet filter: w5x3 or w9x7
        #[arg(short, long, default_value = "w5x3")]
        filter: WaveletFilter,
    },

    /// Run the analysis pipeline over a raw interleaved 8-bit image
    #[command(visible_alias = "a")]
    Analyze {
        /// Raw interleaved 8-bit samples
        #[arg(short, long)]
        input: PathBuf,

        /// Image width in pixels
        #[arg(short, long)]
        width: u32,

        /// Image height in pixels
        #[arg(short = 'H', long)]
        height: u32,

        /// Number of components
        #[arg(short = 'n', long, default_value = "3")]
        components: usize,

        /// Tile size, WxH (default: one tile)
        #[arg(long, value_parser = parse_dims)]
        tile: Option<(u32, u32)>,

        /// Reversible coding (w5x3 and RCT)
        #[arg(long)]
        lossless: bool,

        /// Decomposition levels option string
        #[arg(long)]
        levels: Option<String>,

        /// Code-block size option string
        #[arg(long)]
        cblk: Option<String>,

        /// Wavelet filter option string
        #[arg(long)]
        filters: Option<String>,

        /// Component transform option string (on, off, rct, ict)
        #[arg(long)]
        transform: Option<String>,

        /// Precinct size option string
        #[arg(long)]
        precincts: Option<String>,

        /// Code-block partition origin, X,Y
        #[arg(long, value_parser = parse_dims_comma)]
        origin: Option<(u32, u32)>,

        /// Region of interest: 'R c x y w h' or 'C c x y r' (repeatable)
        #[arg(long)]
        roi: Vec<Roi>,
    },
}

fn main() {
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tree {
            width,
            height,
            ulx,
            uly,
            levels,
            cblk,
            precincts,
            origin,
            filter,
        } => print_tree(width, height, (ulx, uly), levels, cblk, precincts.unwrap_or_default(), origin, filter),
        Commands::Analyze {
            input,
            width,
            height,
            components,
            tile,
            lossless,
            levels,
            cblk,
            filters,
            transform,
            precincts,
            origin,
            roi,
        } => {
            let options = EncoderOptions {
                lossless,
                levels,
                code_block_size: cblk,
                filters,
                component_transform: transform,
                precincts,
                partition_origin: origin,
                rois: roi,
            };
            analyze(&input, width, height, components, tile, &options)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn print_tree(
    width: u32,
    height: u32,
    (ulx, uly): (u32, u32),
    levels: u32,
    cblk: CodeBlockSize,
    precincts: PrecinctSizes,
    origin: PartitionOrigin,
    filter: WaveletFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    precincts.check_levels(levels)?;
    let mut tree = SubbandTree::new(width, height, ulx, uly, levels, filter);
    tree.init_code_blocks(cblk, &precincts, origin)?;

    println!("Tile-component {}x{} at ({}, {}), {} levels, {}", width, height, ulx, uly, levels, filter);
    println!();
    let mut total = 0;
    for idx in tree.leaves() {
        let sb = tree.node(idx);
        println!(
            "  {:?}  level {:>2}  res {:>2}  {:>5}x{:<5} at ({}, {})  ulc ({}, {})  gain 2^{}  cblk {}x{}  grid {}x{}",
            sb.orientation,
            sb.level,
            sb.resolution,
            sb.w,
            sb.h,
            sb.ulx,
            sb.uly,
            sb.ulcx,
            sb.ulcy,
            sb.gain_exp,
            sb.nominal_cblk_w,
            sb.nominal_cblk_h,
            sb.num_cb_x,
            sb.num_cb_y,
        );
        total += sb.num_code_blocks();
    }
    println!();
    println!("{} subbands, {} code-blocks", tree.leaves().count(), total);
    Ok(())
}

fn analyze(
    input: &PathBuf,
    width: u32,
    height: u32,
    components: usize,
    tile: Option<(u32, u32)>,
    options: &EncoderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let area = Rect::new(0, 0, width, height);
    let tiler = match tile {
        Some(size) => Tiler::new(area, (0, 0), size)?,
        None => Tiler::single_tile(area)?,
    };
    let image = RasterImage::from_interleaved_u8(tiler, components, &data)?;
    let config = EncoderConfig::from_options(options, image.num_tiles(), components)?;
    let mut analysis = ForwardAnalysis::new(image, config)?;

    println!("Image {}x{}, {} components, {} tiles", width, height, components, analysis.num_tiles());
    for t in 0..analysis.num_tiles() {
        let mut ctx = analysis.set_tile(t)?;
        let canvas = ctx.geometry().canvas;
        println!();
        println!(
            "Tile {}: {}x{} at ({}, {}), transform {}",
            t,
            canvas.width,
            canvas.height,
            canvas.x,
            canvas.y,
            ctx.transform()
        );

        for c in 0..components {
            let depth = analysis.nominal_range_bits(&ctx, c);
            let tree = analysis.subband_tree(&mut ctx, c)?;
            let mut per_subband: BTreeMap<usize, usize> = BTreeMap::new();
            let mut roi_blocks = 0;
            for mut block in analysis.code_blocks(&mut ctx, c)? {
                *per_subband.entry(block.info.subband).or_default() += 1;
                if analysis.attach_roi_mask(&mut ctx, c, &mut block, depth as i32)?
                    && block.roi_mask.as_ref().is_some_and(|m| m.iter().any(|&v| v != 0))
                {
                    roi_blocks += 1;
                }
            }

            println!("  Component {}: {} bits after transform", c, depth);
            for idx in tree.leaves() {
                let sb = tree.node(idx);
                println!(
                    "    {:?} level {:>2}  {:>5}x{:<5} {:>4} code-blocks",
                    sb.orientation,
                    sb.level,
                    sb.w,
                    sb.h,
                    per_subband.get(&idx).copied().unwrap_or(0)
                );
            }
            if analysis.roi_engine().is_some() {
                println!("    ROI: {} code-blocks biased", roi_blocks);
            }
        }
    }
    Ok(())
}

fn parse_dims(s: &str) -> Result<(u32, u32), String> {
    parse_pair(s, 'x')
}

fn parse_dims_comma(s: &str) -> Result<(u32, u32), String> {
    parse_pair(s, ',')
}

fn parse_origin(s: &str) -> Result<PartitionOrigin, String> {
    let (x, y) = parse_pair(s, ',')?;
    PartitionOrigin::new(x, y).map_err(|e| e.to_string())
}

fn parse_pair(s: &str, sep: char) -> Result<(u32, u32), String> {
    let (a, b) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected two values separated by '{}'", sep))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("'{}': {}", v, e));
    Ok((parse(a)?, parse(b)?))
}
