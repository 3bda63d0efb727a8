use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pointcld_core::{Recorder, Whence, MAGIC};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "pointcld",
    about = "Record, inspect, and navigate PointCld point-cloud containers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header metadata and, optionally, a per-frame listing
    Inspect {
        /// PointCld container to inspect
        file: PathBuf,
        /// Walk the container in skip mode and list every frame
        #[arg(long)]
        frames: bool,
    },
    /// Seek to a single frame and print its contents
    Frame {
        /// PointCld container
        file: PathBuf,
        /// Zero-based frame index
        #[arg(short, long)]
        index: i64,
        /// Dump the depth buffer (raw big-endian f32 samples) to a file
        #[arg(long)]
        depths_out: Option<PathBuf>,
        /// Dump the color buffer (raw RGBA bytes) to a file
        #[arg(long)]
        colors_out: Option<PathBuf>,
    },
    /// Check whether a file carries the PointCld magic tag
    ///
    /// Exits 0 when the tag matches, 1 otherwise. Only the first 8 bytes
    /// are examined.
    Probe {
        /// File to probe
        file: PathBuf,
    },
    /// Write a deterministic synthetic container, for demos and testing
    Synth {
        /// Destination container
        output: PathBuf,
        /// Number of frames to record
        #[arg(short, long, default_value_t = 30)]
        frames: u32,
        /// Points per frame
        #[arg(short, long, default_value_t = 1024)]
        points: u32,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_inspect(file: PathBuf, show_frames: bool) -> anyhow::Result<()> {
    let mut rec = Recorder::open(&file, false)
        .with_context(|| format!("opening container {:?}", file))?;
    let on_disk = std::fs::metadata(&file)?.len();

    println!("=== PointCld container: {:?} ===", file);
    println!();
    println!("  frames      : {}", rec.frame_count());
    println!("  start time  : {:.6}", rec.start_time());
    println!("  end time    : {:.6}", rec.end_time());
    println!(
        "  duration    : {:.6}s",
        (rec.end_time() - rec.start_time()).max(0.0)
    );
    println!("  file size   : {}", human_bytes(on_disk));

    if show_frames && rec.frame_count() > 0 {
        println!();
        println!("  {:>8}  {:>14}  {:>10}", "frame", "time", "size");
        println!("  {}", "-".repeat(38));
        // Frame 0 is already materialized by open; the rest of the walk
        // stays in skip mode.
        println!(
            "  {:>8}  {:>14.6}  {:>10}",
            rec.frame_number(),
            rec.current_time(),
            human_bytes(rec.frame_size() as u64)
        );
        for _ in 1..rec.frame_count() {
            rec.next_frame(true)?;
            println!(
                "  {:>8}  {:>14.6}  {:>10}",
                rec.frame_number(),
                rec.current_time(),
                human_bytes(rec.frame_size() as u64)
            );
        }
    }
    Ok(())
}

fn run_frame(
    file: PathBuf,
    index: i64,
    depths_out: Option<PathBuf>,
    colors_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut rec = Recorder::open(&file, false)
        .with_context(|| format!("opening container {:?}", file))?;
    if rec.frame_count() == 0 {
        anyhow::bail!("container has no frames");
    }
    rec.seek(index, Whence::Start)
        .with_context(|| format!("seeking to frame {}", index))?;

    let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
    for &d in rec.depths() {
        min = min.min(d);
        max = max.max(d);
    }

    println!("  frame       : {}", rec.frame_number());
    println!("  time        : {:.6}", rec.current_time());
    println!("  record size : {}", human_bytes(rec.frame_size() as u64));
    println!("  info        : {}", rec.info());
    println!("  points      : {}", rec.depths().len());
    println!("  depth range : [{:.4}, {:.4}]", min, max);

    if let Some(path) = depths_out {
        let bytes: Vec<u8> = rec
            .depths()
            .iter()
            .flat_map(|d| d.to_bits().to_be_bytes())
            .collect();
        std::fs::write(&path, bytes)?;
        eprintln!("  depths written to {:?}", path);
    }
    if let Some(path) = colors_out {
        std::fs::write(&path, rec.colors())?;
        eprintln!("  colors written to {:?}", path);
    }
    Ok(())
}

fn run_probe(file: PathBuf) -> anyhow::Result<()> {
    let mut f = File::open(&file).with_context(|| format!("opening {:?}", file))?;
    let mut tag = [0u8; 8];
    let matches = f.read_exact(&mut tag).is_ok() && &tag == MAGIC;
    if matches {
        println!("{:?}: PointCld container", file);
        Ok(())
    } else {
        println!("{:?}: not a PointCld container", file);
        std::process::exit(1);
    }
}

fn run_synth(output: PathBuf, frames: u32, points: u32) -> anyhow::Result<()> {
    let mut rec = Recorder::open(&output, true)
        .with_context(|| format!("creating container {:?}", output))?;

    // Deterministic LCG so the same arguments always produce the same file.
    let mut rng: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut step = |hi: u64| {
        rng = rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        rng >> hi
    };

    for i in 0..frames {
        let time = i as f64 / 30.0;
        let info = format!("synthetic frame {i}");
        let depths: Vec<f32> = (0..points)
            .map(|_| (step(40) as f32) / 1000.0)
            .collect();
        let colors: Vec<u8> = (0..points * 4).map(|_| step(56) as u8).collect();
        rec.record(time, &info, &depths, &colors)?;
    }
    rec.close()?;

    let on_disk = std::fs::metadata(&output)?.len();
    eprintln!("  frames      : {}", frames);
    eprintln!("  points/frame: {}", points);
    eprintln!("  file size   : {}", human_bytes(on_disk));
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { file, frames } => run_inspect(file, frames),
        Commands::Frame {
            file,
            index,
            depths_out,
            colors_out,
        } => run_frame(file, index, depths_out, colors_out),
        Commands::Probe { file } => run_probe(file),
        Commands::Synth {
            output,
            frames,
            points,
        } => run_synth(output, frames, points),
    }
}
