use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use vc_core::{BitDepth, Endian, Volume};
use vc_correlate::{CancelToken, PointCloud, ResultsTable, SearchParameters, run};

#[derive(Parser, Debug)]
#[command(name = "vc_gallery")]
#[command(about = "Run volume correlation on raw or synthetic volume pairs")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correlate two raw volume files.
    #[command(name = "raw")]
    Raw(RawArgs),
    /// Correlate a generated volume pair with a known shift.
    #[command(name = "synthetic")]
    Synthetic(SyntheticArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Output directory for the displacement table and run report
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Search parameter override, `key=value`, repeatable
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Point cloud file (`id x y z` rows); a regular grid when omitted
    #[arg(long)]
    points: Option<PathBuf>,

    /// Grid overlap fraction when no point file is given
    #[arg(long, default_value_t = 0.0)]
    overlap: f32,
}

#[derive(Args, Debug, Clone)]
struct RawArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Reference raw volume file
    #[arg(long, required = true)]
    reference: PathBuf,

    /// Correlated raw volume file
    #[arg(long, required = true)]
    correlated: PathBuf,

    /// Volume extents in voxels
    #[arg(long, required = true, num_args = 3, value_names = ["W", "H", "D"])]
    dims: Vec<usize>,

    /// Bits per voxel: 8 or 16
    #[arg(long, default_value_t = 8)]
    bit_depth: u32,

    /// Byte order of 16-bit voxels: little or big
    #[arg(long, default_value = "little")]
    endian: String,

    /// Header bytes to skip before voxel data
    #[arg(long, default_value_t = 0)]
    header_length: usize,
}

#[derive(Args, Debug, Clone)]
struct SyntheticArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Cubic volume extent in voxels
    #[arg(long, default_value_t = 48)]
    extent: usize,

    /// Applied displacement
    #[arg(long, required = true, num_args = 3, value_names = ["U", "V", "W"], allow_negative_numbers = true)]
    shift: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct RunReport {
    num_points: usize,
    num_good: usize,
    num_range_fail: usize,
    num_convg_fail: usize,
    num_insufficient: usize,
    num_not_processed: usize,
    elapsed_ms: f64,
    subvol_size: u32,
    num_srch_dof: u32,
    disp_max: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Raw(args) => run_raw(args),
        Command::Synthetic(args) => run_synthetic(args),
    }
}

fn run_raw(args: RawArgs) -> Result<()> {
    let params = build_params(&args.common.set)?;
    let [w, h, d] = args.dims[..] else {
        bail!("--dims takes exactly three extents");
    };

    let bit_depth = match args.bit_depth {
        8 => BitDepth::U8,
        16 => BitDepth::U16,
        other => bail!("unsupported bit depth {other}, expected 8 or 16"),
    };
    let endian = match args.endian.as_str() {
        "little" => Endian::Little,
        "big" => Endian::Big,
        other => bail!("unknown endianness '{other}', expected little or big"),
    };

    let reference = load_raw(&args.reference, args.header_length, w, h, d, bit_depth, endian)?;
    let correlated = load_raw(
        &args.correlated,
        args.header_length,
        w,
        h,
        d,
        bit_depth,
        endian,
    )?;

    let cloud = load_cloud(&args.common, (w, h, d), &params)?;
    correlate_and_write(&args.common, &reference, &correlated, &cloud, &params)
}

fn run_synthetic(args: SyntheticArgs) -> Result<()> {
    let params = build_params(&args.common.set)?;
    let [sx, sy, sz] = args.shift[..] else {
        bail!("--shift takes exactly three components");
    };

    let n = args.extent;
    let reference = synthetic_volume(n, 0.0, 0.0, 0.0);
    let correlated = synthetic_volume(n, sx, sy, sz);
    info!("generated {n}x{n}x{n} pair with shift ({sx}, {sy}, {sz})");

    let cloud = load_cloud(&args.common, (n, n, n), &params)?;
    correlate_and_write(&args.common, &reference, &correlated, &cloud, &params)
}

fn build_params(overrides: &[String]) -> Result<SearchParameters> {
    let mut params = SearchParameters::default();
    for assignment in overrides {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("malformed --set '{assignment}', expected key=value");
        };
        params
            .apply(key.trim(), value.trim())
            .with_context(|| format!("applying --set '{assignment}'"))?;
    }
    params.validate().context("validating search parameters")?;
    Ok(params)
}

fn load_raw(
    path: &Path,
    header_length: usize,
    w: usize,
    h: usize,
    d: usize,
    bit_depth: BitDepth,
    endian: Endian,
) -> Result<Volume<f32>> {
    let bytes = fs::read(path).with_context(|| format!("reading volume {}", path.display()))?;
    Volume::from_raw(&bytes, header_length, w, h, d, bit_depth, endian)
        .with_context(|| format!("decoding raw volume {}", path.display()))
}

fn load_cloud(
    common: &CommonArgs,
    dims: (usize, usize, usize),
    params: &SearchParameters,
) -> Result<PointCloud> {
    let cloud = match &common.points {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading point cloud {}", path.display()))?;
            let cloud = PointCloud::from_delimited_text(&text);
            if cloud.is_empty() {
                bail!("no points parsed from {}", path.display());
            }
            cloud
        }
        None => PointCloud::grid(dims, params.subvol_size, common.overlap),
    };
    info!("point cloud holds {} points", cloud.len());
    Ok(cloud)
}

fn correlate_and_write(
    common: &CommonArgs,
    reference: &Volume<f32>,
    correlated: &Volume<f32>,
    cloud: &PointCloud,
    params: &SearchParameters,
) -> Result<()> {
    let start = Instant::now();
    let table = run(
        reference,
        correlated,
        None,
        cloud,
        params,
        &CancelToken::new(),
    )
    .context("running correlation")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;

    fs::create_dir_all(&common.out)
        .with_context(|| format!("creating output directory {}", common.out.display()))?;
    write_disp(&common.out.join("results.disp"), &table, params.num_srch_dof)?;

    let (good, range, convg, insufficient, skipped) = table.status_counts();
    write_json(
        common.out.join("report.json"),
        &RunReport {
            num_points: table.len(),
            num_good: good,
            num_range_fail: range,
            num_convg_fail: convg,
            num_insufficient: insufficient,
            num_not_processed: skipped,
            elapsed_ms,
            subvol_size: params.subvol_size,
            num_srch_dof: params.num_srch_dof,
            disp_max: params.disp_max,
        },
    )?;

    info!("{good}/{} points good in {elapsed_ms:.1} ms", table.len());
    Ok(())
}

fn synthetic_volume(extent: usize, sx: f32, sy: f32, sz: f32) -> Volume<f32> {
    let mut vol = Volume::new_fill(extent, extent, extent, 0.0f32);
    for z in 0..extent {
        for y in 0..extent {
            for x in 0..extent {
                let (xf, yf, zf) = (x as f32 - sx, y as f32 - sy, z as f32 - sz);
                let v = (0.37 * xf).sin() * (0.29 * yf).cos()
                    + (0.23 * zf).sin()
                    + (0.15 * (xf + yf - zf)).cos();
                if let Some(slot) = vol.get_mut(x, y, z) {
                    *slot = v;
                }
            }
        }
    }
    vol
}

fn write_disp(path: &Path, table: &ResultsTable, num_dof: u32) -> Result<()> {
    let mut buf = Vec::new();
    table
        .write_delimited(&mut buf, num_dof)
        .context("formatting displacement table")?;
    fs::write(path, buf).with_context(|| format!("writing {}", path.display()))
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}
