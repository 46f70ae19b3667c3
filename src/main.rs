use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tableau_pilot::automation::{Clicker, DryRunClicker, RdevClicker};
use tableau_pilot::capture::Capture;
use tableau_pilot::config::Config;
use tableau_pilot::correct::run_correction_loop;
use tableau_pilot::error::AppResult;
use tableau_pilot::grid::GridGeometry;
use tableau_pilot::matcher::TemplateMatcher;
use tableau_pilot::replay::{ClickAction, Replayer};
use tableau_pilot::resolve::resolve_tableau;
use tableau_pilot::scan::RoughScan;
use tableau_pilot::solver::{self, MoveToken};
use tableau_pilot::tableau::{Rank, PILE_COUNT};
use tableau_pilot::templates::TemplateSet;

const USAGE: &str = "\
Usage: tableau-pilot [OPTIONS]

Options:
  --config <PATH>    Config file (default: tableau-pilot.json)
  --capture <PATH>   Recognize a saved screenshot instead of grabbing the
                     screen (implies --dry-run)
  --dry-run          Log clicks instead of moving the pointer
  -h, --help         Show this help";

struct Args {
    config_path: PathBuf,
    capture_path: Option<PathBuf>,
    dry_run: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config_path: PathBuf::from("tableau-pilot.json"),
        capture_path: None,
        dry_run: false,
    };

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--config" => {
                args.config_path = PathBuf::from(argv.next().ok_or("--config needs a path")?);
            }
            "--capture" => {
                args.capture_path =
                    Some(PathBuf::from(argv.next().ok_or("--capture needs a path")?));
            }
            "--dry-run" => args.dry_run = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    // a click computed against a file would land on whatever happens to be
    // on screen now
    if args.capture_path.is_some() {
        args.dry_run = true;
    }

    Ok(args)
}

/// Info level by default; RUST_LOG takes over when set. Logs go to stderr
/// so the interactive grid on stdout stays readable.
fn initialize_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    println!("===========================================");
    println!("  Tableau Pilot - Solitaire Board Reader");
    println!("===========================================\n");

    initialize_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("✗ {msg}\n");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("✗ {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> AppResult<()> {
    let cfg = Config::load(&args.config_path)?;
    println!("✓ Configuration loaded");
    println!("  Assets dir: {}", cfg.assets_dir);
    println!("  Solver: {}", cfg.solver_path);

    let templates = TemplateSet::load(Path::new(&cfg.assets_dir))?;
    println!("✓ Rank templates loaded\n");

    let capture = match &args.capture_path {
        Some(path) => {
            let capture = Capture::load(path)?;
            println!(
                "✓ Loaded capture from {} ({}x{})",
                path.display(),
                capture.width(),
                capture.height()
            );
            capture
        }
        None => {
            let capture = Capture::grab_primary_screen()?;
            println!(
                "✓ Captured primary screen ({}x{})",
                capture.width(),
                capture.height()
            );
            capture
        }
    };
    let matcher = TemplateMatcher::new(&capture);

    println!("\nScanning for rank glyphs, this takes a while...");
    let started = Instant::now();
    let scan = RoughScan::run(&matcher, &templates, &cfg);
    println!(
        "✓ Rough scan kept {} detections in {:.1}s",
        scan.total(),
        started.elapsed().as_secs_f64()
    );

    let geometry = GridGeometry::infer(&scan)?;
    println!(
        "✓ Grid inferred: column spacing {}, row spacing {}",
        geometry.column_spacing, geometry.row_spacing
    );

    println!("\nReading cards (top row first):");
    let mut tableau = resolve_tableau(&matcher, &scan, &geometry, &templates, &cfg, |row, t| {
        let mut line = String::new();
        for pile in 0..PILE_COUNT {
            if pile > 0 {
                line.push(' ');
            }
            let value = t.rank_at(pile, row).map_or(0, Rank::value);
            line.push_str(&format!("{value:>2}"));
        }
        println!("  {line}");
    });

    let unknown = tableau.unknown_cells();
    if unknown > 0 {
        println!("  {unknown} cell(s) unresolved; fix them below (rank 0 = unknown)");
    }

    let stdin = io::stdin();
    run_correction_loop(&mut tableau, stdin.lock(), io::stdout())?;
    println!("✓ Grid accepted");

    let grid_stream = solver::serialize_tableau(&tableau);
    println!("\nSolving with {}...", cfg.solver_path);
    let output = solver::run_solver(
        &cfg.solver_path,
        &grid_stream,
        Duration::from_secs(cfg.solver_timeout_secs),
    )?;
    let moves = solver::parse_moves(&output)?;
    println!("✓ Solver returned {} moves", moves.len());

    // the draw control only needs locating when the line actually draws
    let draw_target = if moves.contains(&MoveToken::Draw) {
        let found = matcher
            .locate(
                templates.draw_control(),
                matcher.full_region(),
                cfg.draw_confidence,
            )
            .ok_or_else(|| anyhow::anyhow!("Draw control not found on the capture"))?;
        Some(found.center())
    } else {
        None
    };

    let mut clicker: Box<dyn Clicker> = if args.dry_run {
        Box::new(DryRunClicker)
    } else {
        Box::new(RdevClicker::new(cfg.click_delay_ms))
    };
    println!("\nEntering the solution ({} backend):", clicker.name());

    let total = moves.len();
    for (index, action) in Replayer::new(&mut tableau, &moves).enumerate() {
        match action? {
            ClickAction::Card { pile, rank, target } => {
                println!(
                    "  [{}/{}] pile {} rank {} at {}",
                    index + 1,
                    total,
                    pile,
                    rank,
                    target
                );
                clicker.click(target);
            }
            ClickAction::Draw => {
                println!("  [{}/{}] draw", index + 1, total);
                match draw_target {
                    Some(target) => clicker.click(target),
                    None => anyhow::bail!("Solver requested a draw that was never located"),
                }
            }
        }
    }

    println!("\n===========================================");
    println!("  Replay complete: {total} moves entered");
    println!("===========================================");
    Ok(())
}
